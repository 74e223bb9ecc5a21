// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mapping from item categories to the record shape their payloads decode as.

use std::fmt;

use serde::de::DeserializeOwned;

use crate::{
    ItemCategory,
    records::{
        AlbumSchema, EditionSchema, GameSchema, Item, ItemSchema, MovieSchema, PerformanceProductionSchema, PerformanceSchema,
        PodcastSchema, TvShowSchema,
    },
    shape::{Shape, ShapeId},
};

/// The record shape an item payload is stored and decoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemShape {
    /// [`ItemSchema`], for categories without a dedicated shape.
    Base,
    /// [`EditionSchema`].
    Edition,
    /// [`MovieSchema`].
    Movie,
    /// [`TvShowSchema`].
    TvShow,
    /// [`AlbumSchema`].
    Album,
    /// [`PodcastSchema`].
    Podcast,
    /// [`GameSchema`].
    Game,
    /// [`PerformanceSchema`].
    Performance,
    /// [`PerformanceProductionSchema`].
    PerformanceProduction,
}

/// Categories with a dedicated shape. Every other category falls back to [`ItemShape::Base`].
///
/// Seasons and episodes map to the show shape, not to shapes of their own.
const DISPATCH: [(ItemCategory, ItemShape); 10] = [
    (ItemCategory::Book, ItemShape::Edition),
    (ItemCategory::Movie, ItemShape::Movie),
    (ItemCategory::Tv, ItemShape::TvShow),
    (ItemCategory::TvSeason, ItemShape::TvShow),
    (ItemCategory::TvEpisode, ItemShape::TvShow),
    (ItemCategory::Music, ItemShape::Album),
    (ItemCategory::Game, ItemShape::Game),
    (ItemCategory::Podcast, ItemShape::Podcast),
    (ItemCategory::Performance, ItemShape::Performance),
    (ItemCategory::PerformanceProduction, ItemShape::PerformanceProduction),
];

/// Returns the shape items of `category` are stored and decoded as.
///
/// # Examples
///
/// ```
/// use catalog_cache::{ItemCategory, ItemShape, shape_for};
///
/// assert_eq!(shape_for(ItemCategory::Book), ItemShape::Edition);
/// assert_eq!(shape_for(ItemCategory::TvSeason), ItemShape::TvShow);
/// assert_eq!(shape_for(ItemCategory::Fanfic), ItemShape::Base);
/// ```
#[must_use]
pub fn shape_for(category: ItemCategory) -> ItemShape {
    DISPATCH
        .iter()
        .find(|(known, _)| *known == category)
        .map_or(ItemShape::Base, |(_, shape)| *shape)
}

impl ItemShape {
    /// Returns the id of the segment that stores items of this shape.
    #[must_use]
    pub fn shape_id(self) -> ShapeId {
        match self {
            Self::Base => ItemSchema::SHAPE,
            Self::Edition => EditionSchema::SHAPE,
            Self::Movie => MovieSchema::SHAPE,
            Self::TvShow => TvShowSchema::SHAPE,
            Self::Album => AlbumSchema::SHAPE,
            Self::Podcast => PodcastSchema::SHAPE,
            Self::Game => GameSchema::SHAPE,
            Self::Performance => PerformanceSchema::SHAPE,
            Self::PerformanceProduction => PerformanceProductionSchema::SHAPE,
        }
    }

    /// Decodes JSON `bytes` as this shape.
    pub(crate) fn decode(self, bytes: &[u8]) -> serde_json::Result<Item> {
        match self {
            Self::Base => decode_as::<ItemSchema>(bytes),
            Self::Edition => decode_as::<EditionSchema>(bytes),
            Self::Movie => decode_as::<MovieSchema>(bytes),
            Self::TvShow => decode_as::<TvShowSchema>(bytes),
            Self::Album => decode_as::<AlbumSchema>(bytes),
            Self::Podcast => decode_as::<PodcastSchema>(bytes),
            Self::Game => decode_as::<GameSchema>(bytes),
            Self::Performance => decode_as::<PerformanceSchema>(bytes),
            Self::PerformanceProduction => decode_as::<PerformanceProductionSchema>(bytes),
        }
    }
}

fn decode_as<T: DeserializeOwned + Into<Item>>(bytes: &[u8]) -> serde_json::Result<Item> {
    serde_json::from_slice::<T>(bytes).map(Into::into)
}

impl fmt::Display for ItemShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.shape_id().fmt(f)
    }
}
