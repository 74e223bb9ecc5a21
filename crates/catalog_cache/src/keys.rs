// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache keys for every kind of cached record.
//!
//! Keys are `_`-separated: a prefix naming the record kind, then the parameters.
//! Free-form parameters are escaped (`%` as `%25`, `_` as `%5F`), so distinct
//! parameters never produce the same key. An absent instance is written as
//! [`DEFAULT_INSTANCE`].

use std::borrow::Cow;

use crate::{ShelfCategory, ShelfType};

/// Stands in for the instance qualifier when none is given.
pub const DEFAULT_INSTANCE: &str = "default";

fn escape(component: &str) -> Cow<'_, str> {
    if component.contains(['%', '_']) {
        Cow::Owned(component.replace('%', "%25").replace('_', "%5F"))
    } else {
        Cow::Borrowed(component)
    }
}

fn instance_or_default(instance: Option<&str>) -> Cow<'_, str> {
    escape(instance.unwrap_or(DEFAULT_INSTANCE))
}

/// Reduces an item id given as a URL or API path to its last non-empty segment.
///
/// # Examples
///
/// ```
/// use catalog_cache::keys::item_uuid;
///
/// assert_eq!(item_uuid("https://neodb.social/api/book/0ZKp5vR"), "0ZKp5vR");
/// assert_eq!(item_uuid("/book/0ZKp5vR/"), "0ZKp5vR");
/// assert_eq!(item_uuid("0ZKp5vR"), "0ZKp5vR");
/// ```
#[must_use]
pub fn item_uuid(id: &str) -> &str {
    id.rsplit('/').find(|segment| !segment.is_empty()).unwrap_or(id)
}

/// Key of an item, by id or URL.
///
/// The id is reduced with [`item_uuid`] here, for every caller. Storing,
/// retrieving and removing an item therefore agree on the key whether the id
/// arrives as a bare uuid or as a URL.
///
/// # Examples
///
/// ```
/// use catalog_cache::keys;
///
/// assert_eq!(keys::item("1", None), "item_default_1");
/// assert_eq!(keys::item("/api/book/1", Some("neodb.social")), "item_neodb.social_1");
/// ```
#[must_use]
pub fn item(id: &str, instance: Option<&str>) -> String {
    format!("item_{}_{}", instance_or_default(instance), escape(item_uuid(id)))
}

/// Key of the signed-in user's profile for the account `key`.
#[must_use]
pub fn current_user(key: &str) -> String {
    format!("currentUser_{}", escape(key))
}

/// Key of the mark the account `key` placed on an item.
#[must_use]
pub fn mark(key: &str, item_uuid: &str) -> String {
    format!("mark_{}_{}", escape(key), escape(item_uuid))
}

/// Key of the account `key`'s shelf, filtered by category.
#[must_use]
pub fn library(key: &str, shelf: ShelfType, category: ShelfCategory) -> String {
    format!("library_{}_{shelf}_{category}", escape(key))
}

/// Key of the gallery of an instance.
#[must_use]
pub fn gallery(instance: Option<&str>) -> String {
    format!("gallery_{}", instance_or_default(instance))
}

/// Key of one page of search results.
///
/// The query is lower-cased and trimmed first, so cosmetic variations share a key.
///
/// # Examples
///
/// ```
/// use catalog_cache::keys;
///
/// assert_eq!(keys::search(" Foo ", 1, None), keys::search("foo", 1, None));
/// ```
#[must_use]
pub fn search(query: &str, page: u32, instance: Option<&str>) -> String {
    let normalized = query.trim().to_lowercase();
    format!("search_{}_{}_{page}", instance_or_default(instance), escape(&normalized))
}

/// Key of the timelines of the account `key`.
#[must_use]
pub fn timelines(key: &str) -> String {
    format!("timelines_{}", escape(key))
}
