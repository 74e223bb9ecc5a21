// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Category tags of catalog items and shelves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The category of a catalog item.
///
/// Serialized in camel case (`"tvSeason"`, `"performanceProduction"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemCategory {
    /// A book edition.
    Book,
    /// A movie.
    Movie,
    /// A TV show.
    Tv,
    /// One season of a TV show.
    TvSeason,
    /// One episode of a TV show.
    TvEpisode,
    /// A music album.
    Music,
    /// A video game.
    Game,
    /// A podcast.
    Podcast,
    /// A stage performance.
    Performance,
    /// One production of a stage performance.
    PerformanceProduction,
    /// A work of fan fiction.
    Fanfic,
    /// An exhibition.
    Exhibition,
    /// A user-curated collection.
    Collection,
}

impl ItemCategory {
    /// Every category, in declaration order.
    pub const ALL: [Self; 13] = [
        Self::Book,
        Self::Movie,
        Self::Tv,
        Self::TvSeason,
        Self::TvEpisode,
        Self::Music,
        Self::Game,
        Self::Podcast,
        Self::Performance,
        Self::PerformanceProduction,
        Self::Fanfic,
        Self::Exhibition,
        Self::Collection,
    ];

    /// Returns the serialized name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::TvSeason => "tvSeason",
            Self::TvEpisode => "tvEpisode",
            Self::Music => "music",
            Self::Game => "game",
            Self::Podcast => "podcast",
            Self::Performance => "performance",
            Self::PerformanceProduction => "performanceProduction",
            Self::Fanfic => "fanfic",
            Self::Exhibition => "exhibition",
            Self::Collection => "collection",
        }
    }

    /// Returns the path segment under which the catalog serves items of this category.
    ///
    /// Seasons and episodes live under their show, productions under their performance.
    #[must_use]
    pub const fn url_path(self) -> &'static str {
        match self {
            Self::TvSeason | Self::TvEpisode => "tv",
            Self::PerformanceProduction => "performance",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The shelf a mark places an item on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShelfType {
    /// Wants to read, watch, listen or play.
    Wishlist,
    /// Currently in progress.
    Progress,
    /// Finished.
    Complete,
    /// Abandoned.
    Dropped,
}

impl ShelfType {
    /// Returns the serialized name of the shelf.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wishlist => "wishlist",
            Self::Progress => "progress",
            Self::Complete => "complete",
            Self::Dropped => "dropped",
        }
    }
}

impl fmt::Display for ShelfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The categories a shelf can be filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShelfCategory {
    /// Books.
    Book,
    /// Movies.
    Movie,
    /// TV shows.
    Tv,
    /// Music albums.
    Music,
    /// Video games.
    Game,
    /// Podcasts.
    Podcast,
    /// Stage performances.
    Performance,
}

impl ShelfCategory {
    /// Returns the serialized name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.item_category().as_str()
    }

    /// Returns the item category this shelf filter selects.
    #[must_use]
    pub const fn item_category(self) -> ItemCategory {
        match self {
            Self::Book => ItemCategory::Book,
            Self::Movie => ItemCategory::Movie,
            Self::Tv => ItemCategory::Tv,
            Self::Music => ItemCategory::Music,
            Self::Game => ItemCategory::Game,
            Self::Podcast => ItemCategory::Podcast,
            Self::Performance => ItemCategory::Performance,
        }
    }
}

impl fmt::Display for ShelfCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_serde() {
        for category in ItemCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
        assert_eq!(serde_json::to_string(&ShelfType::Wishlist).unwrap(), "\"wishlist\"");
        assert_eq!(serde_json::to_string(&ShelfCategory::Podcast).unwrap(), "\"podcast\"");
    }

    #[test]
    fn url_paths_fold_children_into_parents() {
        assert_eq!(ItemCategory::TvSeason.url_path(), "tv");
        assert_eq!(ItemCategory::TvEpisode.url_path(), "tv");
        assert_eq!(ItemCategory::PerformanceProduction.url_path(), "performance");
        assert_eq!(ItemCategory::Book.url_path(), "book");
    }

    #[test]
    fn parses_camel_case() {
        let category: ItemCategory = serde_json::from_str("\"performanceProduction\"").unwrap();
        assert_eq!(category, ItemCategory::PerformanceProduction);
    }
}
