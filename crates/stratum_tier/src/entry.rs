// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    ops::Deref,
    time::{Duration, SystemTime},
};

/// A cached value together with its write timestamp.
///
/// The timestamp is stamped by the expiring layer when the entry is written, and
/// travels with the value between tiers so that a promoted entry keeps the age it
/// had when it was first written.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use stratum_tier::CacheEntry;
///
/// let entry = CacheEntry::new(42);
/// assert_eq!(*entry.value(), 42);
/// assert!(entry.cached_at().is_none());
///
/// let entry = CacheEntry::with_ttl("data".to_string(), Duration::from_secs(60));
/// assert_eq!(entry.ttl(), Some(Duration::from_secs(60)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry<V> {
    value: V,
    cached_at: Option<SystemTime>,
    /// Per-entry TTL override. If set, takes precedence over the tier TTL.
    ttl: Option<Duration>,
}

impl<V> CacheEntry<V> {
    /// Creates a new entry without a timestamp.
    ///
    /// The timestamp is assigned when the entry is written through an expiring tier.
    pub fn new(value: V) -> Self {
        Self {
            value,
            cached_at: None,
            ttl: None,
        }
    }

    /// Creates a new entry with a per-entry TTL.
    pub fn with_ttl(value: V, ttl: Duration) -> Self {
        Self {
            value,
            cached_at: None,
            ttl: Some(ttl),
        }
    }

    /// Creates a new entry with an explicit write timestamp.
    ///
    /// Used when rebuilding entries read back from a persistent medium.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::SystemTime;
    ///
    /// use stratum_tier::CacheEntry;
    ///
    /// let now = SystemTime::now();
    /// let entry = CacheEntry::with_cached_at(42, now);
    /// assert_eq!(entry.cached_at(), Some(now));
    /// ```
    pub fn with_cached_at(value: V, cached_at: SystemTime) -> Self {
        Self {
            value,
            cached_at: Some(cached_at),
            ttl: None,
        }
    }

    /// Returns the time the entry was written, if it has been stamped.
    #[must_use]
    pub fn cached_at(&self) -> Option<SystemTime> {
        self.cached_at
    }

    /// Sets the write timestamp.
    pub fn set_cached_at(&mut self, cached_at: SystemTime) {
        self.cached_at = Some(cached_at);
    }

    /// Stamps the entry with `now` unless it already carries a timestamp.
    pub fn ensure_cached_at(&mut self, now: SystemTime) {
        if self.cached_at.is_none() {
            self.cached_at = Some(now);
        }
    }

    /// Returns the per-entry TTL, if set.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Sets the per-entry TTL.
    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = Some(ttl);
    }

    /// Returns `true` if the entry must be treated as absent at `now`.
    ///
    /// The per-entry TTL wins over `tier_ttl`. Without any TTL the entry never
    /// expires. With a TTL, an unstamped entry or one stamped in the future is
    /// expired; otherwise the entry expires once its age reaches the TTL.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::{Duration, SystemTime};
    ///
    /// use stratum_tier::CacheEntry;
    ///
    /// let written = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
    /// let entry = CacheEntry::with_cached_at("v", written);
    /// let ttl = Some(Duration::from_secs(10));
    ///
    /// assert!(!entry.is_expired_at(written + Duration::from_secs(9), ttl));
    /// assert!(entry.is_expired_at(written + Duration::from_secs(10), ttl));
    /// assert!(!entry.is_expired_at(written + Duration::from_secs(10), None));
    /// ```
    #[must_use]
    pub fn is_expired_at(&self, now: SystemTime, tier_ttl: Option<Duration>) -> bool {
        let Some(ttl) = self.ttl.or(tier_ttl) else {
            return false;
        };

        match self.cached_at {
            Some(cached_at) => now.duration_since(cached_at).map_or(true, |age| age >= ttl),
            None => true,
        }
    }

    /// Consumes the entry and returns the inner value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }

    /// Returns a reference to the cached value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Maps the value while keeping the entry's metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> CacheEntry<U> {
        CacheEntry {
            value: f(self.value),
            cached_at: self.cached_at,
            ttl: self.ttl,
        }
    }
}

impl<V> Deref for CacheEntry<V> {
    type Target = V;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<V> From<V> for CacheEntry<V> {
    fn from(value: V) -> Self {
        Self::new(value)
    }
}
