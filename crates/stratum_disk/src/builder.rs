// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring disk tiers.

use std::path::PathBuf;

use crate::tier::DiskTier;

/// Builder for configuring a [`DiskTier`].
///
/// # Examples
///
/// ```
/// use stratum_disk::DiskTier;
///
/// let tier = DiskTier::builder(std::env::temp_dir().join("catalog").join("items"))
///     .max_size(512 * 1024 * 1024)
///     .name("items")
///     .build();
/// assert_eq!(tier.name(), Some("items"));
/// ```
#[derive(Debug, Clone)]
pub struct DiskTierBuilder {
    pub(crate) dir: PathBuf,
    pub(crate) max_size: Option<u64>,
    pub(crate) name: Option<String>,
}

impl DiskTierBuilder {
    pub(crate) fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            max_size: None,
            name: None,
        }
    }

    /// Sets the maximum aggregate size of all entry files, in bytes.
    ///
    /// Once exceeded, the oldest-written entries are deleted. If not set, the tier
    /// is bounded only by the filesystem.
    #[must_use]
    pub fn max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Sets a name for the tier, used in logs.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured `DiskTier`.
    ///
    /// No I/O happens here; the directory is opened and scanned on first use.
    #[must_use]
    pub fn build(self) -> DiskTier {
        DiskTier::from_builder(self)
    }
}
