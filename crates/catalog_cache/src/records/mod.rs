// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Record shapes stored in the cache.
//!
//! Item shapes embed an [`ItemCommon`] block, flattened into the same JSON object,
//! and compare and hash by their catalog id alone.

mod item;
mod social;

use std::hash::{Hash, Hasher};

pub use item::{
    AlbumSchema, EditionSchema, GameSchema, Item, ItemSchema, MovieSchema, PerformanceProductionSchema, PerformanceSchema,
    PodcastSchema, TvShowSchema,
};
use serde::{Deserialize, Serialize};
pub use social::{Account, GalleryResult, MarkSchema, PagedMarkSchema, SearchResult, Status, User};

use crate::ItemCategory;

/// A title or description in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedTitle {
    /// Language tag, such as `en` or `zh-cn`.
    pub lang: String,
    /// The localized text.
    pub text: String,
}

/// Links to the same item on other sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalResource {
    /// Address of the external page.
    pub url: String,
}

/// A person credited on a performance, with their role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewMember {
    /// The person's name.
    pub name: String,
    /// The role played or performed.
    pub role: Option<String>,
}

/// Fields shared by every item shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCommon {
    /// Catalog id, usually the item's API path.
    pub id: String,
    /// Schema type name reported by the catalog.
    #[serde(rename = "type")]
    pub kind: String,
    /// Stable item identifier.
    pub uuid: String,
    /// Web address of the item.
    pub url: String,
    /// API address of the item.
    pub api_url: String,
    /// The item's category.
    pub category: ItemCategory,
    /// Identifier of the parent item, for seasons, episodes and productions.
    pub parent_uuid: Option<String>,
    /// Title to show, in the preferred language.
    pub display_title: String,
    /// Original title.
    pub title: String,
    /// Original description.
    #[serde(default)]
    pub description: String,
    /// Titles in other languages.
    #[serde(default)]
    pub localized_title: Vec<LocalizedTitle>,
    /// Descriptions in other languages.
    #[serde(default)]
    pub localized_description: Vec<LocalizedTitle>,
    /// Address of the cover image.
    pub cover_image_url: Option<String>,
    /// Average rating, out of 10.
    pub rating: Option<f64>,
    /// Number of ratings behind [`rating`](Self::rating).
    pub rating_count: Option<u32>,
    /// Links to the item on other sites.
    pub external_resources: Option<Vec<ExternalResource>>,
    /// Short summary.
    pub brief: Option<String>,
}

impl PartialEq for ItemCommon {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ItemCommon {}

impl Hash for ItemCommon {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
