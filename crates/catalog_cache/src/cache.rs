// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The catalog cache facade.

use std::borrow::Borrow;

use bytes::Bytes;
use serde::Serialize;
use stratum::{Segment, SegmentRegistry};
use tick::Clock;

use crate::{
    CacheConfig, CatalogCacheBuilder, Error, ErrorKind, ItemCategory, ItemShape, Result, ShelfCategory, ShelfType, keys,
    records::{GalleryResult, Item, MarkSchema, PagedMarkSchema, SearchResult, Status, User},
    shape::{self, Shape, ShapeId, TypedSegment},
    shape_for,
};

/// Typed two-tier cache for catalog records.
///
/// Every record shape is stored in a segment of its own, created on first use, so
/// equal keys of different shapes never see each other's records. Items are routed
/// to the segment of the shape their category dispatches to (see [`shape_for`]).
///
/// Retrieval never fails: a tier failure or bytes that no longer decode are logged
/// at warn level and reported as a miss, leaving the entry in place. Writes and
/// removals return their errors.
///
/// Build one instance per process and share it; [`clear_all`](Self::clear_all)
/// returns it to its initial empty state.
///
/// # Examples
///
/// ```no_run
/// use catalog_cache::{CacheConfig, CatalogCache, records::SearchResult};
/// use tick::Clock;
///
/// # async fn example() -> Result<(), catalog_cache::Error> {
/// let cache = CatalogCache::new(Clock::new_tokio(), CacheConfig::default());
///
/// let page = SearchResult { data: Vec::new(), pages: 1, count: 0 };
/// cache.cache_search(&page, " Dune ", 1, None).await?;
/// assert_eq!(cache.retrieve_search("dune", 1, None).await, Some(page));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CatalogCache {
    registry: SegmentRegistry<String, Bytes>,
}

impl CatalogCache {
    /// Creates a cache configured by `config`, measuring time with `clock`.
    #[must_use]
    pub fn new(clock: Clock, config: CacheConfig) -> Self {
        Self::builder(clock).config(config).build()
    }

    /// Creates a builder for a cache measuring time with `clock`.
    #[must_use]
    pub fn builder(clock: Clock) -> CatalogCacheBuilder {
        CatalogCacheBuilder::new(clock)
    }

    pub(crate) fn from_registry(registry: SegmentRegistry<String, Bytes>) -> Self {
        Self { registry }
    }

    /// Returns the names of the segments created so far, sorted.
    #[must_use]
    pub fn segment_names(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    fn segment(&self, shape: ShapeId) -> Segment<String, Bytes> {
        self.registry.segment(shape.as_str())
    }

    fn typed<T: Shape>(&self) -> TypedSegment<T> {
        TypedSegment::new(self.segment(T::SHAPE))
    }

    async fn store<T, Q>(&self, key: &str, value: &Q) -> Result<()>
    where
        T: Shape + Borrow<Q>,
        Q: Serialize + ?Sized,
    {
        self.typed::<T>().put(key, value).await?;
        tracing::debug!(shape = %T::SHAPE, key, "record cached");
        Ok(())
    }

    async fn load<T: Shape>(&self, key: &str) -> Option<T> {
        recover(T::SHAPE, key, self.typed::<T>().get(key).await)
    }

    async fn evict<T: Shape>(&self, key: &str) -> Result<()> {
        self.typed::<T>().remove(key).await?;
        tracing::debug!(shape = %T::SHAPE, key, "record removed");
        Ok(())
    }

    /// Caches `item` of `category` under its id.
    ///
    /// `id` may be a URL or API path; only its last segment is part of the key.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ShapeMismatch`] without writing anything if `item` is
    /// not of the shape `category` dispatches to, and fails like any write otherwise.
    pub async fn cache_item(&self, item: &Item, id: &str, category: ItemCategory, instance: Option<&str>) -> Result<()> {
        let shape = shape_for(category);
        if item.shape() != shape {
            return Err(Error::caused_by(
                ErrorKind::ShapeMismatch,
                format!("{category} items are stored as {shape}, got {}", item.shape()),
            ));
        }

        let key = keys::item(id, instance);
        let bytes = shape::encode(item)?;
        self.segment(shape.shape_id()).put(&key, bytes).await?;
        tracing::debug!(shape = %shape, key, "item cached");
        Ok(())
    }

    /// Returns the cached item of `category` with `id`, decoded as the category's shape.
    pub async fn retrieve_item(&self, id: &str, category: ItemCategory, instance: Option<&str>) -> Option<Item> {
        let shape = shape_for(category);
        let key = keys::item(id, instance);
        recover(shape.shape_id(), &key, self.get_item(shape, &key).await)
    }

    async fn get_item(&self, shape: ItemShape, key: &str) -> Result<Option<Item>> {
        let Some(entry) = self.segment(shape.shape_id()).get(&key.to_owned()).await? else {
            return Ok(None);
        };
        shape::decode(shape.shape_id(), entry.value(), |bytes| shape.decode(bytes)).map(Some)
    }

    /// Removes the cached item of `category` with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Medium`] if a tier fails.
    pub async fn remove_item(&self, id: &str, category: ItemCategory, instance: Option<&str>) -> Result<()> {
        let shape = shape_for(category);
        let key = keys::item(id, instance);
        self.segment(shape.shape_id()).remove(&key).await?;
        tracing::debug!(shape = %shape, key, "item removed");
        Ok(())
    }

    /// Caches the signed-in user's profile for the account `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Encode`] or [`ErrorKind::Medium`] on failure.
    pub async fn cache_user(&self, user: &User, key: &str) -> Result<()> {
        self.store::<User, _>(&keys::current_user(key), user).await
    }

    /// Returns the cached profile for the account `key`.
    pub async fn retrieve_user(&self, key: &str) -> Option<User> {
        self.load(&keys::current_user(key)).await
    }

    /// Removes the cached profile for the account `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Medium`] if a tier fails.
    pub async fn remove_user(&self, key: &str) -> Result<()> {
        self.evict::<User>(&keys::current_user(key)).await
    }

    /// Caches the account `key`'s mark on the item `item_uuid`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Encode`] or [`ErrorKind::Medium`] on failure.
    pub async fn cache_mark(&self, mark: &MarkSchema, key: &str, item_uuid: &str) -> Result<()> {
        self.store::<MarkSchema, _>(&keys::mark(key, item_uuid), mark).await
    }

    /// Returns the account `key`'s cached mark on the item `item_uuid`.
    pub async fn retrieve_mark(&self, key: &str, item_uuid: &str) -> Option<MarkSchema> {
        self.load(&keys::mark(key, item_uuid)).await
    }

    /// Removes the account `key`'s cached mark on the item `item_uuid`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Medium`] if a tier fails.
    pub async fn remove_mark(&self, key: &str, item_uuid: &str) -> Result<()> {
        self.evict::<MarkSchema>(&keys::mark(key, item_uuid)).await
    }

    /// Caches one page of the account `key`'s shelf.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Encode`] or [`ErrorKind::Medium`] on failure.
    pub async fn cache_library(&self, library: &PagedMarkSchema, key: &str, shelf: ShelfType, category: ShelfCategory) -> Result<()> {
        self.store::<PagedMarkSchema, _>(&keys::library(key, shelf, category), library)
            .await
    }

    /// Returns the cached page of the account `key`'s shelf.
    pub async fn retrieve_library(&self, key: &str, shelf: ShelfType, category: ShelfCategory) -> Option<PagedMarkSchema> {
        self.load(&keys::library(key, shelf, category)).await
    }

    /// Removes the cached page of the account `key`'s shelf.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Medium`] if a tier fails.
    pub async fn remove_library(&self, key: &str, shelf: ShelfType, category: ShelfCategory) -> Result<()> {
        self.evict::<PagedMarkSchema>(&keys::library(key, shelf, category)).await
    }

    /// Caches the gallery of `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Encode`] or [`ErrorKind::Medium`] on failure.
    pub async fn cache_gallery(&self, gallery: &[GalleryResult], instance: Option<&str>) -> Result<()> {
        self.store::<Vec<GalleryResult>, _>(&keys::gallery(instance), gallery).await
    }

    /// Returns the cached gallery of `instance`.
    pub async fn retrieve_gallery(&self, instance: Option<&str>) -> Option<Vec<GalleryResult>> {
        self.load(&keys::gallery(instance)).await
    }

    /// Removes the cached gallery of `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Medium`] if a tier fails.
    pub async fn remove_gallery(&self, instance: Option<&str>) -> Result<()> {
        self.evict::<Vec<GalleryResult>>(&keys::gallery(instance)).await
    }

    /// Caches the timelines of the account `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Encode`] or [`ErrorKind::Medium`] on failure.
    pub async fn cache_timelines(&self, timelines: &[Status], key: &str) -> Result<()> {
        self.store::<Vec<Status>, _>(&keys::timelines(key), timelines).await
    }

    /// Returns the cached timelines of the account `key`.
    pub async fn retrieve_timelines(&self, key: &str) -> Option<Vec<Status>> {
        self.load(&keys::timelines(key)).await
    }

    /// Removes the cached timelines of the account `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Medium`] if a tier fails.
    pub async fn remove_timelines(&self, key: &str) -> Result<()> {
        self.evict::<Vec<Status>>(&keys::timelines(key)).await
    }

    /// Caches one page of results for `query`.
    ///
    /// The query is normalized, so `" Foo "` and `"foo"` share an entry.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Encode`] or [`ErrorKind::Medium`] on failure.
    pub async fn cache_search(&self, result: &SearchResult, query: &str, page: u32, instance: Option<&str>) -> Result<()> {
        self.store::<SearchResult, _>(&keys::search(query, page, instance), result).await
    }

    /// Returns the cached page of results for `query`.
    pub async fn retrieve_search(&self, query: &str, page: u32, instance: Option<&str>) -> Option<SearchResult> {
        self.load(&keys::search(query, page, instance)).await
    }

    /// Removes the cached page of results for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Medium`] if a tier fails.
    pub async fn remove_search(&self, query: &str, page: u32, instance: Option<&str>) -> Result<()> {
        self.evict::<SearchResult>(&keys::search(query, page, instance)).await
    }

    /// Deletes expired entries from every segment, returning how many were deleted.
    ///
    /// Reads never return expired entries, so this only reclaims space.
    ///
    /// # Errors
    ///
    /// Returns the first tier failure. Every segment is swept regardless.
    pub async fn sweep_expired(&self) -> Result<u64> {
        Ok(self.registry.sweep_all().await?)
    }

    /// Deletes every entry of every segment and forgets the segments.
    ///
    /// # Errors
    ///
    /// Returns the first tier failure. Every segment is cleared regardless.
    pub async fn clear_all(&self) -> Result<()> {
        Ok(self.registry.clear_all().await?)
    }
}

/// Turns a failed read into a miss.
fn recover<T>(shape: ShapeId, key: &str, result: Result<Option<T>>) -> Option<T> {
    match result {
        Ok(found) => {
            tracing::debug!(shape = %shape, key, hit = found.is_some(), "record retrieved");
            found
        }
        Err(error) => {
            tracing::warn!(shape = %shape, key, kind = %error.kind(), %error, "cache read failed, treating as a miss");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use stratum::testing::LogCapture;
    use tick::ClockControl;

    use super::*;
    use crate::records::{ItemCommon, ItemSchema};

    fn fanfic(id: &str) -> Item {
        Item::Base(ItemSchema {
            common: ItemCommon {
                id: format!("/api/fanfic/{id}"),
                kind: "Fanfic".to_string(),
                uuid: id.to_string(),
                url: format!("/fanfic/{id}"),
                api_url: format!("/api/fanfic/{id}"),
                category: ItemCategory::Fanfic,
                parent_uuid: None,
                display_title: "A Study".to_string(),
                title: "A Study".to_string(),
                description: String::new(),
                localized_title: Vec::new(),
                localized_description: Vec::new(),
                cover_image_url: None,
                rating: None,
                rating_count: None,
                external_resources: None,
                brief: None,
            },
        })
    }

    #[tokio::test]
    async fn categories_without_a_shape_use_the_base_segment() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CatalogCache::new(ClockControl::new().to_clock(), CacheConfig::with_root(dir.path()));

        cache
            .cache_item(&fanfic("f1"), "/api/fanfic/f1", ItemCategory::Fanfic, None)
            .await
            .unwrap();

        assert_eq!(cache.segment_names(), vec!["item"]);
        let found = cache.retrieve_item("f1", ItemCategory::Fanfic, None).await.unwrap();
        assert_eq!(found.shape(), ItemShape::Base);
        assert_eq!(found.id(), "/api/fanfic/f1");

        // Exhibitions share the base segment with fan fiction.
        assert!(cache.retrieve_item("f1", ItemCategory::Exhibition, None).await.is_some());
    }

    #[tokio::test]
    async fn shape_mismatch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CatalogCache::new(ClockControl::new().to_clock(), CacheConfig::with_root(dir.path()));

        let error = cache
            .cache_item(&fanfic("f1"), "f1", ItemCategory::Book, None)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ShapeMismatch);
        assert!(cache.segment_names().is_empty());
    }

    #[tokio::test]
    async fn failed_reads_are_logged_as_misses() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("not_a_directory");
        std::fs::write(&root, b"").unwrap();
        let cache = CatalogCache::builder(ClockControl::new().to_clock()).root(&root).build();

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        assert_eq!(cache.retrieve_user("acct").await, None);
        capture.assert_contains("cache read failed, treating as a miss");
        capture.assert_contains("currentUser_acct");

        let write = cache.cache_user(&user(), "acct").await.unwrap_err();
        assert_eq!(write.kind(), ErrorKind::Medium);
    }

    fn user() -> User {
        User {
            url: "https://neodb.social/users/ada".to_string(),
            external_acct: Some("ada@mastodon.social".to_string()),
            display_name: "Ada".to_string(),
            avatar: "https://neodb.social/avatar/ada.png".to_string(),
            username: "ada".to_string(),
            roles: Vec::new(),
        }
    }
}
