// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Two-tier cache segments with per-tier expiry, promotion and telemetry.
//!
//! A [`Segment`] pairs a fast, bounded volatile tier with a larger durable tier.
//! Each tier is wrapped in an [`ExpiringTier`] that stamps writes with the time of
//! an injected [`tick::Clock`] and treats entries past the tier's time-to-live as
//! absent. A [`SegmentRegistry`] hands out one segment per name, creating it on
//! first use.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use stratum::{Segment, TierPolicy};
//! use stratum_memory::MemoryTier;
//! use tick::ClockControl;
//! # futures::executor::block_on(async {
//!
//! let control = ClockControl::new();
//! let segment = Segment::<String, String>::builder(control.to_clock())
//!     .volatile(MemoryTier::with_max_entries(1))
//!     .volatile_ttl(Duration::from_secs(60))
//!     .durable(MemoryTier::new())
//!     .durable_ttl(TierPolicy::durable().ttl)
//!     .build();
//!
//! let key = "greeting".to_string();
//! segment.put(&key, "hello".to_string()).await?;
//!
//! // Past the volatile time-to-live, the durable tier still answers.
//! control.advance(Duration::from_secs(120));
//! assert!(segment.get(&key).await?.is_some());
//!
//! // Past the durable time-to-live, the key reads as absent.
//! control.advance(TierPolicy::durable().ttl);
//! assert!(segment.get(&key).await?.is_none());
//! # Ok::<(), stratum_tier::Error>(())
//! # });
//! ```
//!
//! # Features
//!
//! - `metrics`: records OpenTelemetry counters, a duration histogram and a size
//!   gauge through [`TelemetryConfig::with_metrics`](telemetry::TelemetryConfig).
//! - `serde`: makes [`TierPolicy`] serializable.
//! - `test-util`: exposes the `testing` helpers.

mod builder;
mod expiring;
mod policy;
mod promotion;
mod registry;
mod segment;
pub mod telemetry;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use builder::SegmentBuilder;
#[doc(inline)]
pub use expiring::ExpiringTier;
#[doc(inline)]
pub use policy::TierPolicy;
#[doc(inline)]
pub use promotion::PromotionPolicy;
#[doc(inline)]
pub use registry::{SegmentFactory, SegmentRegistry};
#[doc(inline)]
pub use segment::{Segment, SegmentName};
#[doc(inline)]
pub use telemetry::{CacheTelemetry, TelemetryConfig, TierRole};
