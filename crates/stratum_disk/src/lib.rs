// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Durable, directory-backed cache tier.
//!
//! [`DiskTier`] implements [`CacheTier<String, Bytes>`](stratum_tier::CacheTier) on top
//! of a plain directory: one file per entry, bounded by the aggregate size of all
//! files, evicting the oldest-written entries first. Entries survive process
//! restarts; the directory is rescanned lazily the first time a new tier touches it.
//!
//! Any I/O failure is reported as a [`stratum_tier::Error`] for the call that hit it
//! and does not poison the tier.
//!
//! The tier uses `tokio::fs` and spawns its mutations onto Tokio tasks, so it must
//! be used from within a Tokio runtime.

mod builder;
mod format;
mod index;
mod tier;

#[doc(inline)]
pub use builder::DiskTierBuilder;
#[doc(inline)]
pub use tier::DiskTier;
