// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Recording tier with failure injection.
//!
//! [`MockCache`] stores entries in memory, records every operation it receives and
//! can be told to fail selected operations, which makes it the tool of choice for
//! exercising medium-failure paths in layered stores.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::Arc,
    time::{Duration, SystemTime},
};

use parking_lot::Mutex;

use crate::{CacheEntry, CacheTier, Error, TierOperation};

/// Recorded cache operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp<K, V> {
    /// A get operation was performed with the given key.
    Get(K),
    /// An insert operation was performed with the given key and entry.
    Insert {
        /// The key that was inserted.
        key: K,
        /// The cache entry that was inserted.
        entry: CacheEntry<V>,
    },
    /// An invalidate operation was performed with the given key.
    Invalidate(K),
    /// A clear operation was performed.
    Clear,
    /// A purge of expired entries was performed.
    PurgeExpired,
}

type FailPredicate<K, V> = Box<dyn Fn(&CacheOp<K, V>) -> bool + Send + Sync>;

/// A configurable mock tier for testing.
///
/// Clones share storage, the operation log and the failure predicate, so a test can
/// keep a handle after moving the tier into a segment.
///
/// # Examples
///
/// ```ignore
/// use futures::executor::block_on;
/// use stratum_tier::{
///     CacheEntry, CacheTier,
///     testing::{CacheOp, MockCache},
/// };
///
/// block_on(async {
///     let cache = MockCache::<String, i32>::new();
///     cache.insert(&"key".to_string(), CacheEntry::new(42)).await.unwrap();
///
///     cache.fail_when(|op| matches!(op, CacheOp::Get(_)));
///     assert!(cache.get(&"key".to_string()).await.is_err());
///
///     cache.clear_failures();
///     assert_eq!(*cache.get(&"key".to_string()).await.unwrap().unwrap().value(), 42);
/// });
/// ```
pub struct MockCache<K, V> {
    data: Arc<Mutex<HashMap<K, CacheEntry<V>>>>,
    operations: Arc<Mutex<Vec<CacheOp<K, V>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<K, V>>>>,
}

impl<K, V> std::fmt::Debug for MockCache<K, V>
where
    K: std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCache")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<K, V> Clone for MockCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<K, V> Default for MockCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MockCache<K, V> {
    /// Creates a new empty mock tier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }
}

impl<K, V> MockCache<K, V>
where
    K: Eq + Hash,
{
    /// Creates a mock tier with pre-populated data.
    #[must_use]
    pub fn with_data(data: HashMap<K, CacheEntry<V>>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the tier holds the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.data.lock().contains_key(key)
    }
}

impl<K, V> MockCache<K, V>
where
    K: Clone,
    V: Clone,
{
    /// Sets a predicate that decides which operations fail.
    ///
    /// Failed operations are still recorded and leave the stored data untouched.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&CacheOp<K, V>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<CacheOp<K, V>> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: CacheOp<K, V>) -> Result<(), ()> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        if fail { Err(()) } else { Ok(()) }
    }
}

impl<K, V> CacheTier<K, V> for MockCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<CacheEntry<V>>, Error> {
        self.record(CacheOp::Get(key.clone()))
            .map_err(|()| Error::from_message(TierOperation::Get, "mock: get failed"))?;
        Ok(self.data.lock().get(key).cloned())
    }

    async fn insert(&self, key: &K, entry: CacheEntry<V>) -> Result<(), Error> {
        self.record(CacheOp::Insert {
            key: key.clone(),
            entry: entry.clone(),
        })
        .map_err(|()| Error::from_message(TierOperation::Insert, "mock: insert failed"))?;
        self.data.lock().insert(key.clone(), entry);
        Ok(())
    }

    async fn invalidate(&self, key: &K) -> Result<(), Error> {
        self.record(CacheOp::Invalidate(key.clone()))
            .map_err(|()| Error::from_message(TierOperation::Invalidate, "mock: invalidate failed"))?;
        self.data.lock().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.record(CacheOp::Clear)
            .map_err(|()| Error::from_message(TierOperation::Clear, "mock: clear failed"))?;
        self.data.lock().clear();
        Ok(())
    }

    async fn purge_expired(&self, now: SystemTime, ttl: Option<Duration>) -> Result<u64, Error> {
        self.record(CacheOp::PurgeExpired)
            .map_err(|()| Error::from_message(TierOperation::Purge, "mock: purge failed"))?;
        let mut data = self.data.lock();
        let before = data.len();
        data.retain(|_, entry| !entry.is_expired_at(now, ttl));
        Ok((before - data.len()) as u64)
    }

    fn len(&self) -> Option<u64> {
        Some(self.data.lock().len() as u64)
    }
}
