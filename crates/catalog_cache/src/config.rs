// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stratum::TierPolicy;

/// Where the cache keeps its files and how long and how much each tier holds.
///
/// Every field is optional when deserializing.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use catalog_cache::CacheConfig;
///
/// let config: CacheConfig = serde_json::from_str(
///     r#"{ "root": "/var/cache/catalog", "volatile": { "ttl": { "secs": 600, "nanos": 0 }, "max_entries": 20 } }"#,
/// )?;
/// assert_eq!(config.volatile.ttl, Duration::from_secs(600));
/// assert_eq!(config.volatile.max_entries, Some(20));
/// assert_eq!(config.durable, CacheConfig::default().durable);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one subdirectory per record shape.
    pub root: PathBuf,
    /// Policy of the in-memory tier.
    pub volatile: TierPolicy,
    /// Policy of the on-disk tier. Only its size bound applies; the disk tier
    /// does not bound the entry count.
    pub durable: TierPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join("catalog_cache"),
            volatile: TierPolicy::volatile(),
            durable: TierPolicy::durable(),
        }
    }
}

impl CacheConfig {
    /// Returns the default configuration rooted at `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config: CacheConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CacheConfig::default());
        assert!(config.root.ends_with("catalog_cache"));
    }

    #[test]
    fn defaults_match_tier_policies() {
        let config = CacheConfig::with_root("/tmp/x");
        assert_eq!(config.root, PathBuf::from("/tmp/x"));
        assert_eq!(config.volatile, TierPolicy::volatile());
        assert_eq!(config.durable, TierPolicy::durable());
    }
}
