// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Bounded in-memory cache tier.
//!
//! This crate provides [`MemoryTier`], a concurrent in-process store with strict
//! least-recently-used eviction. Use [`MemoryTierBuilder`] to bound it by entry
//! count, by aggregate weight, or both.
//!
//! # Quick Start
//!
//! ```
//! use stratum_memory::MemoryTier;
//! use stratum_tier::{CacheEntry, CacheTier};
//!
//! # futures::executor::block_on(async {
//! let tier = MemoryTier::<String, Vec<u8>>::builder()
//!     .max_entries(50)
//!     .max_weight(50 * 1024 * 1024)
//!     .weigher(|_key, value| value.len() as u64)
//!     .build();
//!
//! tier.insert(&"key".to_string(), CacheEntry::new(vec![1, 2, 3])).await.unwrap();
//! let entry = tier.get(&"key".to_string()).await.unwrap();
//! assert_eq!(entry.unwrap().value(), &vec![1, 2, 3]);
//! # });
//! ```
//!
//! # Features
//!
//! - **Two ceilings**: entry count and aggregate weight are enforced together
//! - **Strict LRU**: every read refreshes recency; the coldest entry goes first
//! - **Exact accounting**: `len` and `weight` reflect the stored entries precisely

pub mod builder;
pub mod tier;

#[doc(inline)]
pub use builder::MemoryTierBuilder;
#[doc(inline)]
pub use tier::MemoryTier;
