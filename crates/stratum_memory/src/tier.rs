// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory cache tier with least-recently-used eviction.

use std::{
    fmt,
    hash::Hash,
    sync::Arc,
    time::{Duration, SystemTime},
};

use lru::LruCache;
use parking_lot::Mutex;
use stratum_tier::{CacheEntry, CacheTier, Error};

use crate::builder::{MemoryTierBuilder, Weigher};

struct Slot<V> {
    entry: CacheEntry<V>,
    weight: u64,
}

struct State<K, V> {
    entries: LruCache<K, Slot<V>>,
    weight: u64,
}

impl<K: Hash + Eq, V> State<K, V> {
    fn remove(&mut self, key: &K) {
        if let Some(slot) = self.entries.pop(key) {
            self.weight -= slot.weight;
        }
    }

    fn evict_until(&mut self, max_entries: Option<u64>, max_weight: Option<u64>) {
        while max_entries.is_some_and(|max| self.entries.len() as u64 > max)
            || max_weight.is_some_and(|max| self.weight > max)
        {
            match self.entries.pop_lru() {
                Some((_, slot)) => self.weight -= slot.weight,
                None => break,
            }
        }
    }
}

/// A bounded in-memory cache tier.
///
/// Entries are kept in recency order; reads refresh recency and inserts evict the
/// least-recently-used entries until both the entry-count and weight ceilings hold.
/// The tier never looks at timestamps on its own: stale entries stay until evicted,
/// invalidated or purged through [`CacheTier::purge_expired`].
///
/// Clones share the same storage.
///
/// # Examples
///
/// ```
/// use stratum_memory::MemoryTier;
/// use stratum_tier::{CacheEntry, CacheTier};
/// # futures::executor::block_on(async {
///
/// let tier = MemoryTier::<String, i32>::with_max_entries(2);
///
/// tier.insert(&"a".to_string(), CacheEntry::new(1)).await.unwrap();
/// tier.insert(&"b".to_string(), CacheEntry::new(2)).await.unwrap();
/// tier.insert(&"c".to_string(), CacheEntry::new(3)).await.unwrap();
///
/// assert!(tier.get(&"a".to_string()).await.unwrap().is_none());
/// assert_eq!(tier.len(), Some(2));
/// # });
/// ```
pub struct MemoryTier<K, V> {
    state: Arc<Mutex<State<K, V>>>,
    weigher: Option<Weigher<K, V>>,
    max_entries: Option<u64>,
    max_weight: Option<u64>,
    name: Option<Arc<str>>,
}

impl<K: Hash + Eq, V> fmt::Debug for MemoryTier<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryTier")
            .field("name", &self.name)
            .field("len", &state.entries.len())
            .field("weight", &state.weight)
            .field("max_entries", &self.max_entries)
            .field("max_weight", &self.max_weight)
            .finish_non_exhaustive()
    }
}

impl<K, V> Clone for MemoryTier<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            weigher: self.weigher.clone(),
            max_entries: self.max_entries,
            max_weight: self.max_weight,
            name: self.name.clone(),
        }
    }
}

impl<K: Hash + Eq, V> Default for MemoryTier<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> MemoryTier<K, V> {
    /// Creates a new unbounded memory tier.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new memory tier bounded by entry count.
    #[must_use]
    pub fn with_max_entries(max_entries: u64) -> Self {
        Self::builder().max_entries(max_entries).build()
    }

    /// Creates a new builder for configuring a memory tier.
    #[must_use]
    pub fn builder() -> MemoryTierBuilder<K, V> {
        MemoryTierBuilder::new()
    }

    pub(crate) fn from_builder(builder: MemoryTierBuilder<K, V>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                entries: LruCache::unbounded(),
                weight: 0,
            })),
            weigher: builder.weigher,
            max_entries: builder.max_entries,
            max_weight: builder.max_weight,
            name: builder.name.map(Arc::from),
        }
    }

    /// Returns the tier's name, if one was configured.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn weigh(&self, key: &K, value: &V) -> u64 {
        self.weigher.as_ref().map_or(1, |weigher| weigher(key, value))
    }
}

impl<K, V> CacheTier<K, V> for MemoryTier<K, V>
where
    K: Clone + Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<CacheEntry<V>>, Error> {
        Ok(self.state.lock().entries.get(key).map(|slot| slot.entry.clone()))
    }

    async fn insert(&self, key: &K, entry: CacheEntry<V>) -> Result<(), Error> {
        let weight = self.weigh(key, entry.value());
        let mut state = self.state.lock();
        state.remove(key);

        if self.max_weight.is_some_and(|max| weight > max) {
            return Ok(());
        }

        state.entries.put(key.clone(), Slot { entry, weight });
        state.weight += weight;
        state.evict_until(self.max_entries, self.max_weight);
        Ok(())
    }

    async fn invalidate(&self, key: &K) -> Result<(), Error> {
        self.state.lock().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        let mut state = self.state.lock();
        state.entries.clear();
        state.weight = 0;
        Ok(())
    }

    async fn purge_expired(&self, now: SystemTime, ttl: Option<Duration>) -> Result<u64, Error> {
        let mut state = self.state.lock();
        let expired: Vec<K> = state
            .entries
            .iter()
            .filter(|(_, slot)| slot.entry.is_expired_at(now, ttl))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            state.remove(key);
        }
        Ok(expired.len() as u64)
    }

    fn len(&self) -> Option<u64> {
        Some(self.state.lock().entries.len() as u64)
    }

    fn weight(&self) -> Option<u64> {
        Some(self.state.lock().weight)
    }
}
