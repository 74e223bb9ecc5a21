// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};

use super::ItemSchema;
use crate::ShelfType;

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Profile address.
    pub url: String,
    /// Fediverse account, as `user@host`.
    pub external_acct: Option<String>,
    /// Name to show.
    pub display_name: String,
    /// Address of the avatar image.
    pub avatar: String,
    /// Local user name.
    pub username: String,
    /// Roles granted on the instance.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// The user's mark on one item: shelf, rating, comment and tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkSchema {
    /// Shelf the item is on.
    pub shelf_type: ShelfType,
    /// 0 public, 1 followers only, 2 private.
    pub visibility: u8,
    /// The marked item.
    pub item: ItemSchema,
    /// When the mark was created, as an RFC 3339 timestamp.
    pub created_time: String,
    /// Short comment.
    pub comment_text: Option<String>,
    /// Rating out of 10.
    pub rating_grade: Option<u8>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One page of a shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedMarkSchema {
    /// Marks on this page.
    pub data: Vec<MarkSchema>,
    /// Total number of pages.
    pub pages: u32,
    /// Total number of marks.
    pub count: u32,
}

/// One trending list shown in the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryResult {
    /// List name.
    pub name: String,
    /// Items in the list.
    pub items: Vec<ItemSchema>,
}

/// The author of a timeline post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account id on its home server.
    pub id: String,
    /// Local user name.
    pub username: String,
    /// Account handle, as `user` or `user@host`.
    pub acct: String,
    /// Name to show.
    pub display_name: String,
    /// Profile address.
    pub url: String,
    /// Address of the avatar image.
    pub avatar: String,
}

/// One post of a social timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Post id.
    pub id: String,
    /// Canonical identifier of the post.
    pub uri: String,
    /// Web address of the post.
    pub url: Option<String>,
    /// When the post was published, as an RFC 3339 timestamp.
    pub created_at: String,
    /// Author.
    pub account: Account,
    /// HTML body.
    pub content: String,
    /// `public`, `unlisted`, `private` or `direct`.
    pub visibility: String,
    /// Whether the body is hidden behind a warning.
    #[serde(default)]
    pub sensitive: bool,
    /// Content warning.
    #[serde(default)]
    pub spoiler_text: String,
    /// Number of replies.
    #[serde(default)]
    pub replies_count: u32,
    /// Number of boosts.
    #[serde(default)]
    pub reblogs_count: u32,
    /// Number of favourites.
    #[serde(default)]
    pub favourites_count: u32,
}

/// One page of catalog search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matching items.
    pub data: Vec<ItemSchema>,
    /// Total number of pages.
    pub pages: u32,
    /// Total number of matches.
    pub count: u32,
}
