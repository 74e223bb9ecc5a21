// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for the catalog cache.

use std::path::PathBuf;

use bytes::Bytes;
use stratum::{CacheTelemetry, Segment, SegmentName, SegmentRegistry, TierPolicy};
use stratum_disk::DiskTier;
use stratum_memory::MemoryTier;
use tick::Clock;

use crate::{CacheConfig, CatalogCache};

/// Builder for a [`CatalogCache`].
///
/// Starts from [`CacheConfig::default`] and logs every tier operation.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use catalog_cache::CatalogCache;
/// use stratum::{CacheTelemetry, TierPolicy};
/// use tick::Clock;
///
/// let cache = CatalogCache::builder(Clock::new_frozen())
///     .root(std::env::temp_dir().join("catalog_cache_docs"))
///     .volatile_policy(TierPolicy::volatile().with_ttl(Duration::from_secs(600)))
///     .telemetry(CacheTelemetry::disabled())
///     .build();
/// assert!(cache.segment_names().is_empty());
/// ```
#[derive(Debug)]
pub struct CatalogCacheBuilder {
    clock: Clock,
    config: CacheConfig,
    telemetry: CacheTelemetry,
}

impl CatalogCacheBuilder {
    pub(crate) fn new(clock: Clock) -> Self {
        Self {
            clock,
            config: CacheConfig::default(),
            telemetry: CacheTelemetry::default(),
        }
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the directory holding the on-disk tiers.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Sets the policy of the in-memory tier of every segment.
    #[must_use]
    pub fn volatile_policy(mut self, policy: TierPolicy) -> Self {
        self.config.volatile = policy;
        self
    }

    /// Sets the policy of the on-disk tier of every segment.
    #[must_use]
    pub fn durable_policy(mut self, policy: TierPolicy) -> Self {
        self.config.durable = policy;
        self
    }

    /// Sets the telemetry shared by every segment.
    #[must_use]
    pub fn telemetry(mut self, telemetry: CacheTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Builds the cache. No I/O happens until a segment is first used.
    #[must_use]
    pub fn build(self) -> CatalogCache {
        let Self { clock, config, telemetry } = self;
        CatalogCache::from_registry(SegmentRegistry::new(move |name| build_segment(name, &clock, &config, &telemetry)))
    }
}

/// Builds the segment of one record shape: a byte-weighed memory tier in front of
/// a disk tier stored in `<root>/<name>`.
fn build_segment(name: SegmentName, clock: &Clock, config: &CacheConfig, telemetry: &CacheTelemetry) -> Segment<String, Bytes> {
    let mut volatile = MemoryTier::<String, Bytes>::builder()
        .name(name)
        .weigher(|key: &String, value: &Bytes| (key.len() + value.len()) as u64);
    if let Some(max) = config.volatile.max_entries {
        volatile = volatile.max_entries(max);
    }
    if let Some(max) = config.volatile.max_bytes {
        volatile = volatile.max_weight(max);
    }

    let mut durable = DiskTier::builder(config.root.join(name)).name(name);
    if let Some(max) = config.durable.max_bytes {
        durable = durable.max_size(max);
    }

    Segment::builder(clock.clone())
        .name(name)
        .volatile(volatile.build())
        .volatile_ttl(config.volatile.ttl)
        .durable(durable.build())
        .durable_ttl(config.durable.ttl)
        .telemetry(telemetry.clone())
        .build()
}
