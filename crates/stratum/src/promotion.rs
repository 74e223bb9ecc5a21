// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Promotion of durable hits into the volatile tier.

use std::{fmt, sync::Arc};

use stratum_tier::CacheEntry;

/// Decides whether a value found only in the durable tier is copied into the
/// volatile tier.
///
/// Promoted entries keep their original write time, so promotion never extends
/// how long a value stays readable.
///
/// # Examples
///
/// ```
/// use stratum::PromotionPolicy;
/// use stratum_tier::CacheEntry;
///
/// // Always promote (default)
/// let policy = PromotionPolicy::<String>::always();
///
/// // Never promote
/// let policy = PromotionPolicy::<String>::never();
///
/// // Promote small values only
/// let policy = PromotionPolicy::when(|entry: &CacheEntry<Vec<u8>>| entry.value().len() < 4096);
/// ```
pub struct PromotionPolicy<V>(PolicyType<V>);

enum PolicyType<V> {
    Always,
    Never,
    When(Arc<dyn Fn(&CacheEntry<V>) -> bool + Send + Sync>),
}

impl<V> fmt::Debug for PolicyType<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "Always"),
            Self::Never => write!(f, "Never"),
            Self::When(_) => write!(f, "When(<closure>)"),
        }
    }
}

impl<V> fmt::Debug for PromotionPolicy<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PromotionPolicy").field(&self.0).finish()
    }
}

impl<V> Default for PromotionPolicy<V> {
    fn default() -> Self {
        Self::always()
    }
}

impl<V> Clone for PromotionPolicy<V> {
    fn clone(&self) -> Self {
        Self(match &self.0 {
            PolicyType::Always => PolicyType::Always,
            PolicyType::Never => PolicyType::Never,
            PolicyType::When(predicate) => PolicyType::When(Arc::clone(predicate)),
        })
    }
}

impl<V> PromotionPolicy<V> {
    /// Promotes every durable hit.
    #[must_use]
    pub fn always() -> Self {
        Self(PolicyType::Always)
    }

    /// Never promotes; the volatile tier only receives values through writes.
    #[must_use]
    pub fn never() -> Self {
        Self(PolicyType::Never)
    }

    /// Promotes the durable hits accepted by `predicate`.
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&CacheEntry<V>) -> bool + Send + Sync + 'static,
    {
        Self(PolicyType::When(Arc::new(predicate)))
    }

    #[inline]
    pub(crate) fn should_promote(&self, entry: &CacheEntry<V>) -> bool {
        match &self.0 {
            PolicyType::Always => true,
            PolicyType::Never => false,
            PolicyType::When(predicate) => predicate(entry),
        }
    }
}
