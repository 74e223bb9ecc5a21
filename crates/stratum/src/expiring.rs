// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tier decorator enforcing a time-to-live and recording telemetry.

use std::{
    fmt,
    hash::Hash,
    marker::PhantomData,
    time::{Duration, SystemTime},
};

use stratum_tier::{CacheEntry, CacheTier, Error};
use tick::Clock;

use crate::{
    SegmentName,
    telemetry::{CacheActivity, CacheOperation, CacheTelemetry, TierRole, ext::ClockExt},
};

/// Wraps one tier of a segment with expiry and telemetry.
///
/// - Entries are stamped with the clock's current time when inserted, unless they
///   already carry a write time.
/// - Reads report entries whose time-to-live has elapsed as absent, whether or not
///   the underlying tier still holds them.
/// - Every operation is timed with the clock and recorded through [`CacheTelemetry`].
///
/// Instances are created by [`SegmentBuilder`](crate::SegmentBuilder) and reached
/// through [`Segment::volatile`](crate::Segment::volatile) and
/// [`Segment::durable`](crate::Segment::durable).
pub struct ExpiringTier<K, V, S> {
    name: SegmentName,
    role: TierRole,
    inner: S,
    clock: Clock,
    ttl: Option<Duration>,
    telemetry: CacheTelemetry,
    _phantom: PhantomData<fn() -> (K, V)>,
}

impl<K, V, S> fmt::Debug for ExpiringTier<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringTier")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<K, V, S> ExpiringTier<K, V, S> {
    pub(crate) fn new(name: SegmentName, role: TierRole, inner: S, clock: Clock, ttl: Option<Duration>, telemetry: CacheTelemetry) -> Self {
        Self {
            name,
            role,
            inner,
            clock,
            ttl,
            telemetry,
            _phantom: PhantomData,
        }
    }

    /// Returns the name of the segment owning this tier.
    #[must_use]
    pub fn name(&self) -> SegmentName {
        self.name
    }

    /// Returns which of the segment's tiers this is.
    #[must_use]
    pub fn role(&self) -> TierRole {
        self.role
    }

    /// Returns the tier-level time-to-live, if any.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns the wrapped tier.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn record(&self, operation: CacheOperation, activity: CacheActivity, duration: Duration) {
        self.telemetry.record(self.name, self.role, operation, activity, Some(duration));
    }
}

impl<K, V, S> ExpiringTier<K, V, S>
where
    K: Send + Sync,
    V: Send + Sync,
    S: CacheTier<K, V>,
{
    /// Returns `true` if `entry` is past its time-to-live at the clock's current time.
    #[must_use]
    pub fn is_expired(&self, entry: &CacheEntry<V>) -> bool {
        entry.is_expired_at(self.clock.system_time(), self.ttl)
    }

    /// Physically removes every entry past its time-to-live, returning how many went.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying tier fails.
    pub async fn purge(&self) -> Result<u64, Error> {
        self.purge_expired(self.clock.system_time(), self.ttl).await
    }

    fn record_size(&self) {
        if let Some(size) = self.inner.len() {
            self.telemetry.record_size(self.name, self.role, size);
        }
    }

    fn record_outcome<T>(&self, operation: CacheOperation, success: CacheActivity, result: &Result<T, Error>, duration: Duration) {
        match result {
            Ok(_) => {
                self.record(operation, success, duration);
                self.record_size();
            }
            Err(_) => self.record(operation, CacheActivity::Error, duration),
        }
    }
}

impl<K, V, S> CacheTier<K, V> for ExpiringTier<K, V, S>
where
    K: Send + Sync,
    V: Send + Sync,
    S: CacheTier<K, V>,
{
    async fn get(&self, key: &K) -> Result<Option<CacheEntry<V>>, Error> {
        let timed = self.clock.timed_async(self.inner.get(key)).await;
        let activity = match &timed.result {
            Ok(Some(entry)) if self.is_expired(entry) => CacheActivity::Expired,
            Ok(Some(_)) => CacheActivity::Hit,
            Ok(None) => CacheActivity::Miss,
            Err(_) => CacheActivity::Error,
        };
        self.record(CacheOperation::Get, activity, timed.duration);

        Ok(timed.result?.filter(|_| activity == CacheActivity::Hit))
    }

    async fn insert(&self, key: &K, mut entry: CacheEntry<V>) -> Result<(), Error> {
        entry.ensure_cached_at(self.clock.system_time());
        let timed = self.clock.timed_async(self.inner.insert(key, entry)).await;
        self.record_outcome(CacheOperation::Insert, CacheActivity::Inserted, &timed.result, timed.duration);
        timed.result
    }

    async fn invalidate(&self, key: &K) -> Result<(), Error> {
        let timed = self.clock.timed_async(self.inner.invalidate(key)).await;
        self.record_outcome(CacheOperation::Invalidate, CacheActivity::Invalidated, &timed.result, timed.duration);
        timed.result
    }

    async fn clear(&self) -> Result<(), Error> {
        let timed = self.clock.timed_async(self.inner.clear()).await;
        self.record_outcome(CacheOperation::Clear, CacheActivity::Ok, &timed.result, timed.duration);
        timed.result
    }

    async fn purge_expired(&self, now: SystemTime, ttl: Option<Duration>) -> Result<u64, Error> {
        let timed = self.clock.timed_async(self.inner.purge_expired(now, ttl.or(self.ttl))).await;
        self.record_outcome(CacheOperation::Purge, CacheActivity::Purged, &timed.result, timed.duration);
        timed.result
    }

    fn len(&self) -> Option<u64> {
        self.inner.len()
    }

    fn weight(&self) -> Option<u64> {
        self.inner.weight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use stratum_memory::MemoryTier;
    use stratum_tier::{TierOperation, testing::MockCache};
    use tick::ClockControl;

    use crate::testing::LogCapture;

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    fn tier(clock: Clock, ttl: Option<Duration>) -> ExpiringTier<String, i32, MemoryTier<String, i32>> {
        ExpiringTier::new(
            "test",
            TierRole::Volatile,
            MemoryTier::new(),
            clock,
            ttl,
            CacheTelemetry::default(),
        )
    }

    #[test]
    fn insert_stamps_write_time() {
        block_on(async {
            let control = ClockControl::new();
            let clock = control.to_clock();
            let tier = tier(clock.clone(), None);
            let key = "k".to_string();

            tier.insert(&key, CacheEntry::new(1)).await.unwrap();

            let stored = tier.inner().get(&key).await.unwrap().unwrap();
            assert_eq!(stored.cached_at(), Some(clock.system_time()));
        });
    }

    #[test]
    fn insert_keeps_existing_write_time() {
        block_on(async {
            let control = ClockControl::new();
            let clock = control.to_clock();
            let written = clock.system_time();
            control.advance(Duration::from_secs(5));

            let tier = tier(clock, Some(Duration::from_secs(60)));
            let key = "k".to_string();
            tier.insert(&key, CacheEntry::with_cached_at(1, written)).await.unwrap();

            let stored = tier.inner().get(&key).await.unwrap().unwrap();
            assert_eq!(stored.cached_at(), Some(written));
        });
    }

    #[test]
    fn entry_expires_exactly_at_ttl() {
        block_on(async {
            let control = ClockControl::new();
            let tier = tier(control.to_clock(), Some(Duration::from_secs(10)));
            let key = "k".to_string();
            tier.insert(&key, CacheEntry::new(7)).await.unwrap();

            control.advance(Duration::from_millis(9_999));
            assert_eq!(tier.get(&key).await.unwrap().map(CacheEntry::into_value), Some(7));

            control.advance(Duration::from_millis(1));
            assert!(tier.get(&key).await.unwrap().is_none());
            assert_eq!(tier.inner().len(), Some(1), "expiry on read does not delete");
        });
    }

    #[test]
    fn entry_ttl_overrides_tier_ttl() {
        block_on(async {
            let control = ClockControl::new();
            let tier = tier(control.to_clock(), Some(Duration::from_secs(10)));
            let key = "k".to_string();
            tier.insert(&key, CacheEntry::with_ttl(7, Duration::from_secs(100))).await.unwrap();

            control.advance(Duration::from_secs(50));
            assert!(tier.get(&key).await.unwrap().is_some());
        });
    }

    #[test]
    fn purge_uses_tier_ttl() {
        block_on(async {
            let control = ClockControl::new();
            let tier = tier(control.to_clock(), Some(Duration::from_secs(10)));
            tier.insert(&"old".to_string(), CacheEntry::new(1)).await.unwrap();
            control.advance(Duration::from_secs(6));
            tier.insert(&"new".to_string(), CacheEntry::new(2)).await.unwrap();
            control.advance(Duration::from_secs(5));

            assert_eq!(tier.purge().await.unwrap(), 1);
            assert_eq!(tier.len(), Some(1));
            assert!(tier.get(&"new".to_string()).await.unwrap().is_some());
        });
    }

    #[test]
    fn get_logs_expired_entries() {
        block_on(async {
            let capture = LogCapture::new();
            let _guard = tracing::subscriber::set_default(capture.subscriber());

            let control = ClockControl::new();
            let tier = tier(control.to_clock(), Some(Duration::from_secs(1)));
            let key = "k".to_string();
            tier.insert(&key, CacheEntry::new(1)).await.unwrap();
            control.advance(Duration::from_secs(2));

            assert!(tier.get(&key).await.unwrap().is_none());
            capture.assert_contains("cache.expired");
        });
    }

    #[test]
    fn failures_are_recorded_and_propagated() {
        block_on(async {
            let capture = LogCapture::new();
            let _guard = tracing::subscriber::set_default(capture.subscriber());

            let mock = MockCache::<String, i32>::new();
            mock.fail_when(|_| true);
            let tier = ExpiringTier::new(
                "failing",
                TierRole::Durable,
                mock,
                Clock::new_frozen(),
                None,
                CacheTelemetry::default(),
            );

            let error = tier.get(&"k".to_string()).await.unwrap_err();
            assert_eq!(error.operation(), TierOperation::Get);
            assert!(tier.insert(&"k".to_string(), CacheEntry::new(1)).await.is_err());
            assert!(tier.purge().await.is_err());

            capture.assert_contains("cache.error");
            capture.assert_contains("failing");
        });
    }
}
