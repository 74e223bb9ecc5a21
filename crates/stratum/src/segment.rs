// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The two-tier store behind one segment.

use std::{fmt, sync::Arc};

use stratum_tier::{CacheEntry, CacheTier, DynamicCache, Error};
use tick::Clock;
use tokio::sync::Mutex;

use crate::{
    ExpiringTier, PromotionPolicy,
    builder::SegmentBuilder,
    telemetry::{CacheActivity, CacheOperation, CacheTelemetry, TierRole, ext::ClockExt},
};

/// Name of a segment, used as its registry key and in telemetry.
pub type SegmentName = &'static str;

pub(crate) type SegmentTier<K, V> = ExpiringTier<K, V, DynamicCache<K, V>>;

pub(crate) struct SegmentInner<K, V> {
    pub(crate) name: SegmentName,
    pub(crate) volatile: SegmentTier<K, V>,
    pub(crate) durable: SegmentTier<K, V>,
    pub(crate) promotion: PromotionPolicy<V>,
    pub(crate) clock: Clock,
    pub(crate) telemetry: CacheTelemetry,
    /// Serializes mutations of both tiers, promotions included.
    pub(crate) writer: Mutex<()>,
}

/// An isolated store made of a volatile tier and a durable tier.
///
/// - [`put`](Self::put) writes both tiers, stamping the entry with the current time.
/// - [`get`](Self::get) prefers the volatile tier and falls back to the durable one,
///   promoting durable hits according to the [`PromotionPolicy`]. Each tier judges
///   expiry against its own time-to-live at read time.
/// - [`remove`](Self::remove), [`clear`](Self::clear) and
///   [`sweep_expired`](Self::sweep_expired) act on both tiers.
///
/// Mutations, including promotions, are serialized per segment, and every
/// interruption point leaves either the previous or the new value readable.
///
/// Clones share the same tiers.
///
/// # Examples
///
/// ```
/// use stratum::Segment;
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let segment = Segment::<String, i32>::builder(Clock::new_frozen()).name("scores").build();
///
/// segment.put(&"alice".to_string(), 42).await?;
/// let entry = segment.get(&"alice".to_string()).await?;
/// assert_eq!(entry.map(|entry| entry.into_value()), Some(42));
/// # Ok::<(), stratum_tier::Error>(())
/// # });
/// ```
pub struct Segment<K, V> {
    pub(crate) inner: Arc<SegmentInner<K, V>>,
}

impl<K, V> Clone for Segment<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> fmt::Debug for Segment<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("name", &self.inner.name)
            .field("volatile", &self.inner.volatile)
            .field("durable", &self.inner.durable)
            .field("promotion", &self.inner.promotion)
            .finish_non_exhaustive()
    }
}

impl<K, V> Segment<K, V> {
    /// Creates a builder for a segment timed by `clock`.
    #[must_use]
    pub fn builder(clock: Clock) -> SegmentBuilder<K, V> {
        SegmentBuilder::new(clock)
    }

    /// Returns the segment's name.
    #[must_use]
    pub fn name(&self) -> SegmentName {
        self.inner.name
    }

    /// Returns the volatile tier.
    #[must_use]
    pub fn volatile(&self) -> &ExpiringTier<K, V, DynamicCache<K, V>> {
        &self.inner.volatile
    }

    /// Returns the durable tier.
    #[must_use]
    pub fn durable(&self) -> &ExpiringTier<K, V, DynamicCache<K, V>> {
        &self.inner.durable
    }
}

impl<K, V> Segment<K, V>
where
    K: Send + Sync,
    V: Clone + Send + Sync,
{
    /// Stores `value` under `key` in both tiers, replacing any previous value.
    ///
    /// Both tiers' time-to-live start now.
    ///
    /// # Errors
    ///
    /// Returns an error if either tier fails. After a failure the key reads as
    /// either its previous value or `value`.
    pub async fn put(&self, key: &K, value: V) -> Result<(), Error> {
        let inner = &self.inner;
        let entry = CacheEntry::with_cached_at(value, inner.clock.system_time());

        let _writer = inner.writer.lock().await;
        inner.volatile.invalidate(key).await?;
        inner.durable.insert(key, entry.clone()).await?;
        inner.volatile.insert(key, entry).await
    }

    /// Returns the live entry stored under `key`, if any.
    ///
    /// A failure of the volatile tier is logged and the durable tier is consulted
    /// instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable tier fails.
    pub async fn get(&self, key: &K) -> Result<Option<CacheEntry<V>>, Error> {
        match self.inner.volatile.get(key).await {
            Ok(Some(entry)) => return Ok(Some(entry)),
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(segment = self.inner.name, %error, "volatile tier read failed, reading durable tier");
            }
        }

        self.get_from_durable(key).await
    }

    async fn get_from_durable(&self, key: &K) -> Result<Option<CacheEntry<V>>, Error> {
        let inner = &self.inner;
        let _writer = inner.writer.lock().await;

        let Some(entry) = inner.durable.get(key).await? else {
            return Ok(None);
        };

        // A promoted entry keeps its write time, so one already past the volatile
        // time-to-live would never be read back.
        if inner.promotion.should_promote(&entry) && !inner.volatile.is_expired(&entry) {
            let timed = inner.clock.timed_async(inner.volatile.insert(key, entry.clone())).await;
            match timed.result {
                Ok(()) => inner.telemetry.record(
                    inner.name,
                    TierRole::Volatile,
                    CacheOperation::Insert,
                    CacheActivity::Promotion,
                    Some(timed.duration),
                ),
                Err(error) => tracing::warn!(segment = inner.name, %error, "promotion into volatile tier failed"),
            }
        }

        Ok(Some(entry))
    }

    /// Returns `true` if a live entry is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable tier fails.
    pub async fn contains(&self, key: &K) -> Result<bool, Error> {
        Ok(self.get(key).await?.is_some())
    }

    /// Removes `key` from both tiers. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if either tier fails.
    pub async fn remove(&self, key: &K) -> Result<(), Error> {
        let inner = &self.inner;
        let _writer = inner.writer.lock().await;
        inner.volatile.invalidate(key).await?;
        inner.durable.invalidate(key).await
    }

    /// Physically removes expired entries from both tiers, returning how many went.
    ///
    /// Reads never depend on this; it only reclaims space.
    ///
    /// # Errors
    ///
    /// Returns the first tier failure. Both tiers are swept regardless.
    pub async fn sweep_expired(&self) -> Result<u64, Error> {
        let inner = &self.inner;
        let _writer = inner.writer.lock().await;
        let volatile = inner.volatile.purge().await;
        let durable = inner.durable.purge().await;

        let purged = volatile? + durable?;
        tracing::debug!(segment = inner.name, purged, "expired entries swept");
        Ok(purged)
    }

    /// Removes every entry from both tiers.
    ///
    /// # Errors
    ///
    /// Returns the first tier failure. Both tiers are cleared regardless.
    pub async fn clear(&self) -> Result<(), Error> {
        let inner = &self.inner;
        let _writer = inner.writer.lock().await;
        let volatile = inner.volatile.clear().await;
        let durable = inner.durable.clear().await;
        volatile.and(durable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use stratum_memory::MemoryTier;
    use stratum_tier::testing::{CacheOp, MockCache};

    use crate::testing::LogCapture;

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn promotion_is_recorded() {
        block_on(async {
            let capture = LogCapture::new();
            let _guard = tracing::subscriber::set_default(capture.subscriber());

            let volatile = MemoryTier::<String, i32>::new();
            let segment = Segment::builder(Clock::new_frozen())
                .name("promoting")
                .volatile(volatile.clone())
                .build();
            let key = "k".to_string();

            segment.put(&key, 1).await.unwrap();
            volatile.clear().await.unwrap();
            assert!(segment.get(&key).await.unwrap().is_some());

            capture.assert_contains("cache.promotion");
            capture.assert_contains("promoting");
        });
    }

    #[test]
    fn volatile_failure_is_logged() {
        block_on(async {
            let capture = LogCapture::new();
            let _guard = tracing::subscriber::set_default(capture.subscriber());

            let volatile = MockCache::<String, i32>::new();
            volatile.fail_when(|op| matches!(op, CacheOp::Get(_)));
            let segment = Segment::builder(Clock::new_frozen()).name("flaky").volatile(volatile).build();

            assert!(segment.get(&"k".to_string()).await.unwrap().is_none());

            capture.assert_contains("WARN");
            capture.assert_contains("volatile tier read failed");
        });
    }

    #[test]
    fn silent_telemetry_still_logs_failures() {
        block_on(async {
            let capture = LogCapture::new();
            let _guard = tracing::subscriber::set_default(capture.subscriber());

            let volatile = MockCache::<String, i32>::new();
            volatile.fail_when(|op| matches!(op, CacheOp::Insert { .. }));
            let segment = Segment::builder(Clock::new_frozen())
                .volatile(volatile)
                .telemetry(CacheTelemetry::disabled())
                .build();
            let key = "k".to_string();
            segment.put(&key, 1).await.unwrap_err();

            assert!(segment.get(&key).await.unwrap().is_some());

            assert!(!capture.output().contains("cache.event"));
            capture.assert_contains("promotion into volatile tier failed");
        });
    }
}
