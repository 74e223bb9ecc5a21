// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Typed two-tier caching for catalog records.
//!
//! [`CatalogCache`] stores media items of every category, user profiles, marks,
//! library pages, galleries, timelines and search results. Each record shape lives
//! in a `stratum` segment of its own: a bounded in-memory tier in front of a
//! directory-backed tier, each with its own time-to-live. Records are stored as
//! JSON.
//!
//! # Shapes and Categories
//!
//! Every record type implements [`Shape`], which names its segment. Items are
//! polymorphic: an [`Item`](records::Item) is stored in the segment of the shape
//! its [`ItemCategory`] dispatches to through [`shape_for`], and decoded back as
//! that shape. Categories without a dedicated shape use the generic
//! [`ItemSchema`](records::ItemSchema).
//!
//! # Keys
//!
//! The [`keys`] module builds every cache key. Keys are deterministic, search
//! queries are normalized, and item ids given as URLs are reduced to their last
//! path segment.
//!
//! # Examples
//!
//! ```no_run
//! use catalog_cache::{CacheConfig, CatalogCache, ItemCategory};
//! use tick::Clock;
//!
//! # async fn example() -> Result<(), catalog_cache::Error> {
//! let cache = CatalogCache::new(Clock::new_tokio(), CacheConfig::with_root("/var/cache/catalog"));
//!
//! if let Some(item) = cache.retrieve_item("https://neodb.social/api/book/1", ItemCategory::Book, None).await {
//!     println!("cached: {}", item.common().display_title);
//! }
//!
//! cache.sweep_expired().await?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod cache;
mod category;
mod config;
mod dispatch;
mod error;
pub mod keys;
pub mod records;
mod shape;

#[doc(inline)]
pub use builder::CatalogCacheBuilder;
#[doc(inline)]
pub use cache::CatalogCache;
#[doc(inline)]
pub use category::{ItemCategory, ShelfCategory, ShelfType};
#[doc(inline)]
pub use config::CacheConfig;
#[doc(inline)]
pub use dispatch::{ItemShape, shape_for};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use shape::{Shape, ShapeId, TypedSegment};
