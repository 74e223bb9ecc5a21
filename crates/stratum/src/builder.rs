// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for segments.

use std::{fmt, hash::Hash, sync::Arc, time::Duration};

use stratum_memory::MemoryTier;
use stratum_tier::{CacheTier, DynamicCache, DynamicCacheExt};
use tick::Clock;
use tokio::sync::Mutex;

use crate::{
    ExpiringTier, PromotionPolicy, Segment, SegmentName, TierPolicy,
    segment::SegmentInner,
    telemetry::{CacheTelemetry, TierRole},
};

const DEFAULT_NAME: SegmentName = "segment";

/// Builder for a [`Segment`].
///
/// Unless configured otherwise:
/// - the volatile tier is a [`MemoryTier`] bounded by the entry count of
///   [`TierPolicy::volatile`], and the durable tier is an unbounded `MemoryTier`;
/// - the time-to-live of each tier comes from [`TierPolicy::volatile`] and
///   [`TierPolicy::durable`];
/// - every durable hit is promoted and telemetry is logged through `tracing`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use stratum::{PromotionPolicy, Segment};
/// use stratum_memory::MemoryTier;
/// use tick::Clock;
///
/// let segment = Segment::<String, String>::builder(Clock::new_frozen())
///     .name("profiles")
///     .volatile(MemoryTier::with_max_entries(10))
///     .volatile_ttl(Duration::from_secs(60))
///     .durable(MemoryTier::new())
///     .durable_ttl(Duration::from_secs(3600))
///     .promotion_policy(PromotionPolicy::never())
///     .build();
///
/// assert_eq!(segment.name(), "profiles");
/// ```
pub struct SegmentBuilder<K, V> {
    clock: Clock,
    name: SegmentName,
    volatile: Option<DynamicCache<K, V>>,
    durable: Option<DynamicCache<K, V>>,
    volatile_ttl: Duration,
    durable_ttl: Duration,
    promotion_policy: PromotionPolicy<V>,
    telemetry: CacheTelemetry,
}

impl<K, V> fmt::Debug for SegmentBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentBuilder")
            .field("name", &self.name)
            .field("volatile", &self.volatile.is_some())
            .field("durable", &self.durable.is_some())
            .field("volatile_ttl", &self.volatile_ttl)
            .field("durable_ttl", &self.durable_ttl)
            .field("promotion_policy", &self.promotion_policy)
            .finish_non_exhaustive()
    }
}

impl<K, V> SegmentBuilder<K, V> {
    pub(crate) fn new(clock: Clock) -> Self {
        Self {
            clock,
            name: DEFAULT_NAME,
            volatile: None,
            durable: None,
            volatile_ttl: TierPolicy::volatile().ttl,
            durable_ttl: TierPolicy::durable().ttl,
            promotion_policy: PromotionPolicy::always(),
            telemetry: CacheTelemetry::default(),
        }
    }

    /// Sets the name reported in telemetry.
    #[must_use]
    pub fn name(mut self, name: SegmentName) -> Self {
        self.name = name;
        self
    }

    /// Sets the fast, bounded tier consulted first on reads.
    #[must_use]
    pub fn volatile(mut self, tier: impl CacheTier<K, V> + 'static) -> Self {
        self.volatile = Some(tier.into_dynamic());
        self
    }

    /// Sets the larger tier consulted when the volatile tier has no live entry.
    #[must_use]
    pub fn durable(mut self, tier: impl CacheTier<K, V> + 'static) -> Self {
        self.durable = Some(tier.into_dynamic());
        self
    }

    /// Sets how long entries stay readable from the volatile tier.
    #[must_use]
    pub fn volatile_ttl(mut self, ttl: Duration) -> Self {
        self.volatile_ttl = ttl;
        self
    }

    /// Sets how long entries stay readable from the durable tier.
    #[must_use]
    pub fn durable_ttl(mut self, ttl: Duration) -> Self {
        self.durable_ttl = ttl;
        self
    }

    /// Sets which durable hits are copied into the volatile tier.
    #[must_use]
    pub fn promotion_policy(mut self, policy: PromotionPolicy<V>) -> Self {
        self.promotion_policy = policy;
        self
    }

    /// Sets the telemetry recorder shared by both tiers.
    #[must_use]
    pub fn telemetry(mut self, telemetry: CacheTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }
}

impl<K, V> SegmentBuilder<K, V>
where
    K: Clone + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Builds the segment.
    #[must_use]
    pub fn build(self) -> Segment<K, V> {
        let volatile = self.volatile.unwrap_or_else(|| {
            let mut tier = MemoryTier::<K, V>::builder().name(self.name);
            if let Some(max) = TierPolicy::volatile().max_entries {
                tier = tier.max_entries(max);
            }
            tier.build().into_dynamic()
        });
        let durable = self
            .durable
            .unwrap_or_else(|| MemoryTier::<K, V>::builder().name(self.name).build().into_dynamic());

        Segment {
            inner: Arc::new(SegmentInner {
                name: self.name,
                volatile: ExpiringTier::new(
                    self.name,
                    TierRole::Volatile,
                    volatile,
                    self.clock.clone(),
                    Some(self.volatile_ttl),
                    self.telemetry.clone(),
                ),
                durable: ExpiringTier::new(
                    self.name,
                    TierRole::Durable,
                    durable,
                    self.clock.clone(),
                    Some(self.durable_ttl),
                    self.telemetry.clone(),
                ),
                promotion: self.promotion_policy,
                clock: self.clock,
                telemetry: self.telemetry,
                writer: Mutex::new(()),
            }),
        }
    }
}
