// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for cache storage media.
//!
//! [`CacheTier`] defines the interface every backing medium implements. Tiers are
//! deliberately dumb: they store and return entries as given. Use `stratum` to layer
//! TTL enforcement, telemetry and volatile/durable fallback on top.

use std::time::{Duration, SystemTime};

use crate::{CacheEntry, Error};

/// Trait for cache tier implementations.
///
/// The five core methods are required: `get`, `insert`, `invalidate`, `clear` and
/// `purge_expired`. The size accessors have default implementations:
/// - `len`: Returns `None` (not all tiers track entry counts)
/// - `is_empty`: Delegates to `len`
/// - `weight`: Returns `None` (not all tiers track their footprint)
#[cfg_attr(
    any(test, feature = "dynamic-cache"),
    dynosaur::dynosaur(pub(crate) DynCacheTier = dyn(box) CacheTier, bridge(none))
)]
pub trait CacheTier<K, V>: Send + Sync {
    /// Gets an entry, returning an error if the medium fails.
    ///
    /// Returns the entry as stored, stale or not. Callers decide freshness with
    /// [`CacheEntry::is_expired_at`].
    fn get(&self, key: &K) -> impl Future<Output = Result<Option<CacheEntry<V>>, Error>> + Send;

    /// Inserts an entry, replacing any previous entry under the same key.
    ///
    /// May evict other entries to stay within the tier's bounds.
    fn insert(&self, key: &K, entry: CacheEntry<V>) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes an entry. Removing an absent key succeeds.
    fn invalidate(&self, key: &K) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes all entries.
    fn clear(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes every entry that is expired at `now` under `ttl`, returning how many were removed.
    fn purge_expired(&self, now: SystemTime, ttl: Option<Duration>) -> impl Future<Output = Result<u64, Error>> + Send;

    /// Returns the number of entries, if supported.
    ///
    /// Returns `None` for implementations that don't track size.
    fn len(&self) -> Option<u64> {
        None
    }

    /// Returns `true` if the tier contains no entries.
    ///
    /// Returns `None` for implementations that don't track size.
    fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }

    /// Returns the total weight of stored entries in bytes, if supported.
    fn weight(&self) -> Option<u64> {
        None
    }
}
