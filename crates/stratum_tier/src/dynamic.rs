// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Type-erased cache tier handle.

use std::{
    fmt::Debug,
    sync::Arc,
    time::{Duration, SystemTime},
};

use crate::{CacheEntry, CacheTier, Error, tier::DynCacheTier};

/// Extension trait for converting any `CacheTier` into a `DynamicCache`.
///
/// This trait is automatically implemented for all types that implement `CacheTier`.
///
/// # Examples
///
/// ```
/// use stratum_tier::{CacheTier, DynamicCache, DynamicCacheExt};
///
/// fn erase<T>(tier: T) -> DynamicCache<String, Vec<u8>>
/// where
///     T: CacheTier<String, Vec<u8>> + 'static,
/// {
///     tier.into_dynamic()
/// }
/// ```
pub trait DynamicCacheExt<K, V>: Sized {
    /// Converts this cache tier into a `DynamicCache`.
    fn into_dynamic(self) -> DynamicCache<K, V>;
}

impl<K, V, T> DynamicCacheExt<K, V> for T
where
    T: CacheTier<K, V> + 'static,
{
    fn into_dynamic(self) -> DynamicCache<K, V> {
        DynamicCache::new(self)
    }
}

/// A cloneable, type-erased cache tier.
///
/// Lets a volatile memory tier and a durable disk tier sit behind the same concrete
/// type inside one segment.
pub struct DynamicCache<K, V>(Arc<DynCacheTier<'static, K, V>>);

impl<K, V> DynamicCache<K, V> {
    pub(crate) fn new<T>(tier: T) -> Self
    where
        T: CacheTier<K, V> + Send + Sync + 'static,
    {
        Self(DynCacheTier::new_arc(tier))
    }
}

impl<K, V> Debug for DynamicCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicCache").finish_non_exhaustive()
    }
}

impl<K, V> Clone for DynamicCache<K, V> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<K, V> CacheTier<K, V> for DynamicCache<K, V>
where
    K: Sync,
    V: Send,
{
    async fn get(&self, key: &K) -> Result<Option<CacheEntry<V>>, Error> {
        self.0.get(key).await
    }

    async fn insert(&self, key: &K, entry: CacheEntry<V>) -> Result<(), Error> {
        self.0.insert(key, entry).await
    }

    async fn invalidate(&self, key: &K) -> Result<(), Error> {
        self.0.invalidate(key).await
    }

    async fn clear(&self) -> Result<(), Error> {
        self.0.clear().await
    }

    async fn purge_expired(&self, now: SystemTime, ttl: Option<Duration>) -> Result<u64, Error> {
        self.0.purge_expired(now, ttl).await
    }

    fn len(&self) -> Option<u64> {
        self.0.len()
    }

    fn is_empty(&self) -> Option<bool> {
        self.0.is_empty()
    }

    fn weight(&self) -> Option<u64> {
        self.0.weight()
    }
}
