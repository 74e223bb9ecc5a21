// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring memory tiers.

use std::{fmt, hash::Hash, sync::Arc};

use crate::tier::MemoryTier;

pub(crate) type Weigher<K, V> = Arc<dyn Fn(&K, &V) -> u64 + Send + Sync>;

/// Builder for configuring a [`MemoryTier`].
///
/// # Examples
///
/// ```
/// use stratum_memory::MemoryTier;
///
/// let tier = MemoryTier::<String, String>::builder()
///     .max_entries(1000)
///     .max_weight(1024 * 1024)
///     .weigher(|key, value| (key.len() + value.len()) as u64)
///     .name("profiles")
///     .build();
/// ```
pub struct MemoryTierBuilder<K, V> {
    pub(crate) max_entries: Option<u64>,
    pub(crate) max_weight: Option<u64>,
    pub(crate) weigher: Option<Weigher<K, V>>,
    pub(crate) name: Option<String>,
}

impl<K, V> fmt::Debug for MemoryTierBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTierBuilder")
            .field("max_entries", &self.max_entries)
            .field("max_weight", &self.max_weight)
            .field("weigher", &self.weigher.is_some())
            .field("name", &self.name)
            .finish()
    }
}

impl<K, V> Default for MemoryTierBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MemoryTierBuilder<K, V> {
    /// Creates a new builder with default settings.
    ///
    /// The default tier is unbounded and weighs every entry as 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_entries: None,
            max_weight: None,
            weigher: None,
            name: None,
        }
    }

    /// Sets the maximum number of entries.
    ///
    /// Once exceeded, least-recently-used entries are evicted, even if they are
    /// still fresh.
    #[must_use]
    pub fn max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Sets the maximum aggregate weight of all entries.
    ///
    /// Weights come from the [`weigher`](Self::weigher). An entry that alone weighs
    /// more than this ceiling is not retained.
    #[must_use]
    pub fn max_weight(mut self, max_weight: u64) -> Self {
        self.max_weight = Some(max_weight);
        self
    }

    /// Sets the function that computes an entry's weight.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratum_memory::MemoryTier;
    ///
    /// let tier = MemoryTier::<String, Vec<u8>>::builder()
    ///     .max_weight(4096)
    ///     .weigher(|_key, bytes| bytes.len() as u64)
    ///     .build();
    /// ```
    #[must_use]
    pub fn weigher(mut self, weigher: impl Fn(&K, &V) -> u64 + Send + Sync + 'static) -> Self {
        self.weigher = Some(Arc::new(weigher));
        self
    }

    /// Sets a name for the tier, shown in debug output.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured `MemoryTier`.
    #[must_use]
    pub fn build(self) -> MemoryTier<K, V>
    where
        K: Hash + Eq,
    {
        MemoryTier::from_builder(self)
    }
}
