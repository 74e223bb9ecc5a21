// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Expiry and capacity policies for one tier.

use std::time::Duration;

const HOUR_SECS: u64 = 60 * 60;
const MIB: u64 = 1024 * 1024;

/// Time-to-live and capacity bounds of one tier.
///
/// The time-to-live is measured from the moment an entry was written. Capacity
/// bounds are enforced by the tier itself; `None` leaves a dimension unbounded.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use stratum::TierPolicy;
///
/// let volatile = TierPolicy::volatile();
/// assert_eq!(volatile.ttl, Duration::from_secs(12 * 60 * 60));
/// assert_eq!(volatile.max_entries, Some(50));
///
/// let short = TierPolicy::volatile().with_ttl(Duration::from_secs(60));
/// assert_eq!(short.max_entries, Some(50));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TierPolicy {
    /// How long an entry stays readable after it was written.
    pub ttl: Duration,
    /// Maximum number of entries.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_entries: Option<u64>,
    /// Maximum aggregate size of all entries, in bytes.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_bytes: Option<u64>,
}

impl TierPolicy {
    /// The policy of the fast in-process tier: 12 hours, 50 entries, 50 MiB.
    #[must_use]
    pub const fn volatile() -> Self {
        Self {
            ttl: Duration::from_secs(12 * HOUR_SECS),
            max_entries: Some(50),
            max_bytes: Some(50 * MIB),
        }
    }

    /// The policy of the persistent tier: 7 days and 512 MiB, with no entry-count bound.
    #[must_use]
    pub const fn durable() -> Self {
        Self {
            ttl: Duration::from_secs(7 * 24 * HOUR_SECS),
            max_entries: None,
            max_bytes: Some(512 * MIB),
        }
    }

    /// Returns this policy with a different time-to-live.
    #[must_use]
    pub const fn with_ttl(self, ttl: Duration) -> Self {
        Self { ttl, ..self }
    }

    /// Returns this policy with a different entry-count bound.
    #[must_use]
    pub const fn with_max_entries(self, max_entries: Option<u64>) -> Self {
        Self { max_entries, ..self }
    }

    /// Returns this policy with a different size bound.
    #[must_use]
    pub const fn with_max_bytes(self, max_bytes: Option<u64>) -> Self {
        Self { max_bytes, ..self }
    }
}
