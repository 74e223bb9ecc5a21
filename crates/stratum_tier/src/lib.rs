// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Storage tier abstractions for the stratum tiered cache.
//!
//! This crate defines the [`CacheTier`] trait that every backing medium implements,
//! along with [`CacheEntry`] for storing values with their write timestamp and
//! [`Error`] for failures of the medium itself.
//!
//! # Overview
//!
//! A tier is a plain store: it keeps what it is given and hands it back. It never
//! decides on its own whether an entry is stale. Expiry is judged by the caller
//! through [`CacheEntry::is_expired_at`], and physical removal of stale entries is
//! requested explicitly through [`CacheTier::purge_expired`]. The `stratum` crate
//! layers TTL enforcement, telemetry and volatile/durable fallback on top.
//!
//! # Implementing a Cache Tier
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//! use std::time::{Duration, SystemTime};
//!
//! use stratum_tier::{CacheEntry, CacheTier, Error};
//!
//! struct SimpleTier<K, V>(RwLock<HashMap<K, CacheEntry<V>>>);
//!
//! impl<K, V> CacheTier<K, V> for SimpleTier<K, V>
//! where
//!     K: Clone + Eq + std::hash::Hash + Send + Sync,
//!     V: Clone + Send + Sync,
//! {
//!     async fn get(&self, key: &K) -> Result<Option<CacheEntry<V>>, Error> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn insert(&self, key: &K, entry: CacheEntry<V>) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(key.clone(), entry);
//!         Ok(())
//!     }
//!
//!     async fn invalidate(&self, key: &K) -> Result<(), Error> {
//!         self.0.write().unwrap().remove(key);
//!         Ok(())
//!     }
//!
//!     async fn clear(&self) -> Result<(), Error> {
//!         self.0.write().unwrap().clear();
//!         Ok(())
//!     }
//!
//!     async fn purge_expired(&self, now: SystemTime, ttl: Option<Duration>) -> Result<u64, Error> {
//!         let mut map = self.0.write().unwrap();
//!         let before = map.len();
//!         map.retain(|_, entry| !entry.is_expired_at(now, ttl));
//!         Ok((before - map.len()) as u64)
//!     }
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! The `dynamic-cache` feature (on by default) provides [`DynamicCache`], which
//! erases any `CacheTier` behind a cloneable handle so that stores built from
//! different media can share one concrete type.

mod entry;
pub mod error;
#[cfg(any(feature = "test-util", test))]
pub mod testing;
pub(crate) mod tier;

#[cfg(any(test, feature = "dynamic-cache"))]
mod dynamic;

#[cfg(any(test, feature = "dynamic-cache"))]
#[doc(inline)]
pub use dynamic::{DynamicCache, DynamicCacheExt};
#[doc(inline)]
pub use entry::CacheEntry;
#[doc(inline)]
pub use error::{Error, Result, TierOperation};
#[doc(inline)]
pub use tier::CacheTier;
