// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry for tier operations.
//!
//! Every operation a segment performs on one of its tiers is recorded as a
//! structured `tracing` event and, with the `metrics` feature, as OpenTelemetry
//! metrics.

use std::fmt;

use tracing::Level;

pub(crate) mod attributes;
mod cache;
mod config;
pub(crate) mod ext;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

pub use cache::CacheTelemetry;
pub use config::TelemetryConfig;

/// Identifies which of a segment's two tiers an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierRole {
    /// The fast, bounded in-process tier.
    Volatile,
    /// The larger tier backed by persistent storage.
    Durable,
}

impl TierRole {
    /// Returns the role as it appears in telemetry.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Volatile => "volatile",
            Self::Durable => "durable",
        }
    }
}

impl fmt::Display for TierRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheOperation {
    Get,
    Insert,
    Invalidate,
    Clear,
    Purge,
}

impl CacheOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "cache.get",
            Self::Insert => "cache.insert",
            Self::Invalidate => "cache.invalidate",
            Self::Clear => "cache.clear",
            Self::Purge => "cache.purge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    Hit,
    Expired,
    Miss,
    Inserted,
    Invalidated,
    Ok,
    Promotion,
    Purged,
    Error,
}

impl CacheActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::Expired => "cache.expired",
            Self::Miss => "cache.miss",
            Self::Inserted => "cache.inserted",
            Self::Invalidated => "cache.invalidated",
            Self::Ok => "cache.ok",
            Self::Promotion => "cache.promotion",
            Self::Purged => "cache.purged",
            Self::Error => "cache.error",
        }
    }

    pub fn level(self) -> Level {
        match self {
            Self::Hit | Self::Miss | Self::Ok => Level::DEBUG,
            Self::Expired | Self::Inserted | Self::Invalidated | Self::Promotion | Self::Purged => Level::INFO,
            Self::Error => Level::ERROR,
        }
    }
}
