// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Record shapes and their JSON codec over byte segments.

use std::{borrow::Borrow, fmt, marker::PhantomData};

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use stratum::Segment;

use crate::{
    Error, ErrorKind,
    records::{
        AlbumSchema, EditionSchema, GalleryResult, GameSchema, ItemSchema, MarkSchema, MovieSchema, PagedMarkSchema,
        PerformanceProductionSchema, PerformanceSchema, PodcastSchema, SearchResult, Status, TvShowSchema, User,
    },
};

/// Names the segment one record shape is stored in.
///
/// The name doubles as the directory of the shape's durable tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(&'static str);

impl ShapeId {
    /// Creates a shape id from a segment name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the segment name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A record type with a segment of its own.
///
/// Two shapes must never share an id: the id is what keeps their keys apart.
pub trait Shape: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The segment this shape is stored in.
    const SHAPE: ShapeId;
}

macro_rules! impl_shape {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Shape for $ty {
                const SHAPE: ShapeId = ShapeId::new($name);
            }
        )*
    };
}

impl_shape! {
    ItemSchema => "item",
    EditionSchema => "edition",
    MovieSchema => "movie",
    TvShowSchema => "tv_show",
    AlbumSchema => "album",
    PodcastSchema => "podcast",
    GameSchema => "game",
    PerformanceSchema => "performance",
    PerformanceProductionSchema => "performance_production",
    User => "user",
    MarkSchema => "mark",
    PagedMarkSchema => "library",
    Vec<GalleryResult> => "gallery",
    Vec<Status> => "timeline",
    SearchResult => "search",
}

/// Serializes `value` as JSON.
pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Bytes, Error> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| Error::caused_by(ErrorKind::Encode, e))
}

/// Deserializes JSON `bytes` stored in the segment of `shape`.
pub(crate) fn decode<T>(shape: ShapeId, bytes: &[u8], parse: impl FnOnce(&[u8]) -> serde_json::Result<T>) -> Result<T, Error> {
    parse(bytes).map_err(|e| {
        tracing::debug!(shape = %shape, error = %e, "stored bytes do not decode");
        Error::caused_by(ErrorKind::DecodeMismatch, e)
    })
}

/// A byte segment viewed as a store of one record shape.
///
/// Records are encoded as JSON on write and decoded on read. Bytes that no longer
/// decode are reported as [`ErrorKind::DecodeMismatch`] and left in place.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use catalog_cache::{TypedSegment, records::User};
/// use stratum::Segment;
/// use tick::ClockControl;
/// # futures::executor::block_on(async {
///
/// let segment = Segment::<String, Bytes>::builder(ClockControl::new().to_clock()).name("user").build();
/// let users = TypedSegment::<User>::new(segment);
///
/// let user = User {
///     url: "https://neodb.social/users/ada".to_string(),
///     external_acct: None,
///     display_name: "Ada".to_string(),
///     avatar: String::new(),
///     username: "ada".to_string(),
///     roles: Vec::new(),
/// };
/// users.put("currentUser_ada", &user).await?;
/// assert_eq!(users.get("currentUser_ada").await?, Some(user));
/// # Ok::<(), catalog_cache::Error>(())
/// # });
/// ```
pub struct TypedSegment<T> {
    segment: Segment<String, Bytes>,
    _shape: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for TypedSegment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedSegment")
            .field("segment", &self.segment)
            .finish()
    }
}

impl<T> Clone for TypedSegment<T> {
    fn clone(&self) -> Self {
        Self {
            segment: self.segment.clone(),
            _shape: PhantomData,
        }
    }
}

impl<T: Shape> TypedSegment<T> {
    /// Views `segment` as a store of `T`.
    #[must_use]
    pub fn new(segment: Segment<String, Bytes>) -> Self {
        Self {
            segment,
            _shape: PhantomData,
        }
    }

    /// Returns the underlying byte segment.
    #[must_use]
    pub fn segment(&self) -> &Segment<String, Bytes> {
        &self.segment
    }

    /// Stores `value` under `key`, replacing any previous record.
    ///
    /// `value` may be any borrowed form of `T`, such as a slice for a `Vec` shape.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Encode`] if `value` cannot be serialized and
    /// [`ErrorKind::Medium`] if a tier fails.
    pub async fn put<Q>(&self, key: &str, value: &Q) -> Result<(), Error>
    where
        T: Borrow<Q>,
        Q: Serialize + ?Sized,
    {
        let bytes = encode(value)?;
        Ok(self.segment.put(&key.to_owned(), bytes).await?)
    }

    /// Returns the live record stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DecodeMismatch`] if the stored bytes are not a `T`,
    /// and [`ErrorKind::Medium`] if a tier fails.
    pub async fn get(&self, key: &str) -> Result<Option<T>, Error> {
        let Some(entry) = self.segment.get(&key.to_owned()).await? else {
            return Ok(None);
        };
        decode(T::SHAPE, entry.value(), |bytes| serde_json::from_slice(bytes)).map(Some)
    }

    /// Removes the record stored under `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Medium`] if a tier fails.
    pub async fn remove(&self, key: &str) -> Result<(), Error> {
        Ok(self.segment.remove(&key.to_owned()).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use stratum_tier::CacheTier;
    use tick::ClockControl;

    use super::*;

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    fn segment() -> Segment<String, Bytes> {
        Segment::builder(ClockControl::new().to_clock()).name("search").build()
    }

    fn result(count: u32) -> SearchResult {
        SearchResult {
            data: Vec::new(),
            pages: 1,
            count,
        }
    }

    #[test]
    fn non_item_shapes_have_distinct_ids() {
        let ids: HashSet<ShapeId> = [
            User::SHAPE,
            MarkSchema::SHAPE,
            PagedMarkSchema::SHAPE,
            <Vec<GalleryResult>>::SHAPE,
            <Vec<Status>>::SHAPE,
            SearchResult::SHAPE,
            ItemSchema::SHAPE,
        ]
        .into_iter()
        .collect();
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn put_get_remove() {
        block_on(async {
            let typed = TypedSegment::<SearchResult>::new(segment());
            let key = "search_default_foo_1";

            typed.put(key, &result(3)).await.unwrap();
            assert_eq!(typed.get(key).await.unwrap(), Some(result(3)));

            typed.remove(key).await.unwrap();
            assert_eq!(typed.get(key).await.unwrap(), None);
        });
    }

    #[test]
    fn undecodable_bytes_are_reported_and_kept() {
        block_on(async {
            let raw = segment();
            let key = "search_default_foo_1".to_string();
            raw.put(&key, Bytes::from_static(b"{\"unexpected\": true}")).await.unwrap();

            let typed = TypedSegment::<SearchResult>::new(raw.clone());
            let error = typed.get(&key).await.unwrap_err();
            assert_eq!(error.kind(), ErrorKind::DecodeMismatch);

            assert!(raw.contains(&key).await.unwrap());
            assert!(raw.durable().inner().get(&key).await.unwrap().is_some());
        });
    }
}
