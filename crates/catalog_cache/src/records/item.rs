// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::{CrewMember, ItemCommon};
use crate::{ItemCategory, ItemShape};

macro_rules! item_schema {
    ($(#[$meta:meta])* $name:ident { $($(#[$field_meta:meta])* $field:ident: $ty:ty,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, Deserialize)]
        pub struct $name {
            /// Fields shared by every item.
            #[serde(flatten)]
            pub common: ItemCommon,
            $($(#[$field_meta])* pub $field: $ty,)*
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.common == other.common
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.common.hash(state);
            }
        }
    };
}

item_schema! {
    /// An item of a category without a dedicated shape.
    ItemSchema {}
}

item_schema! {
    /// A book edition.
    EditionSchema {
        /// Subtitle.
        subtitle: Option<String>,
        /// Title in the original language.
        orig_title: Option<String>,
        /// Authors.
        #[serde(default)]
        author: Vec<String>,
        /// Translators.
        #[serde(default)]
        translator: Vec<String>,
        /// Languages.
        #[serde(default)]
        language: Vec<String>,
        /// Publisher.
        pub_house: Option<String>,
        /// Publication year.
        pub_year: Option<i32>,
        /// Publication month.
        pub_month: Option<u8>,
        /// Binding.
        binding: Option<String>,
        /// Listed price.
        price: Option<String>,
        /// Page count.
        pages: Option<u32>,
        /// Series the edition belongs to.
        series: Option<String>,
        /// Imprint.
        imprint: Option<String>,
        /// ISBN-13.
        isbn: Option<String>,
    }
}

item_schema! {
    /// A movie.
    MovieSchema {
        /// Title in the original language.
        orig_title: Option<String>,
        /// Alternative titles.
        #[serde(default)]
        other_title: Vec<String>,
        /// Directors.
        #[serde(default)]
        director: Vec<String>,
        /// Screenwriters.
        #[serde(default)]
        playwright: Vec<String>,
        /// Cast.
        #[serde(default)]
        actor: Vec<String>,
        /// Genres.
        #[serde(default)]
        genre: Vec<String>,
        /// Languages.
        #[serde(default)]
        language: Vec<String>,
        /// Production regions.
        #[serde(default)]
        area: Vec<String>,
        /// Release year.
        year: Option<i32>,
        /// Official site.
        site: Option<String>,
        /// Running time, as given by the catalog.
        duration: Option<String>,
        /// IMDb identifier.
        imdb: Option<String>,
    }
}

item_schema! {
    /// A TV show. Seasons and episodes are stored with this shape too.
    TvShowSchema {
        /// Number of seasons.
        season_count: Option<u32>,
        /// Season number, when the record describes a season.
        season_number: Option<u32>,
        /// Episode number, when the record describes an episode.
        episode_number: Option<u32>,
        /// Title in the original language.
        orig_title: Option<String>,
        /// Alternative titles.
        #[serde(default)]
        other_title: Vec<String>,
        /// Directors.
        #[serde(default)]
        director: Vec<String>,
        /// Screenwriters.
        #[serde(default)]
        playwright: Vec<String>,
        /// Cast.
        #[serde(default)]
        actor: Vec<String>,
        /// Genres.
        #[serde(default)]
        genre: Vec<String>,
        /// Languages.
        #[serde(default)]
        language: Vec<String>,
        /// Production regions.
        #[serde(default)]
        area: Vec<String>,
        /// First air year.
        year: Option<i32>,
        /// Official site.
        site: Option<String>,
        /// Number of episodes.
        episode_count: Option<u32>,
        /// Identifiers of the episodes, when the record describes a season.
        #[serde(default)]
        episode_uuids: Vec<String>,
        /// IMDb identifier.
        imdb: Option<String>,
    }
}

item_schema! {
    /// A music album.
    AlbumSchema {
        /// Alternative titles.
        #[serde(default)]
        other_title: Vec<String>,
        /// Genres.
        #[serde(default)]
        genre: Vec<String>,
        /// Artists.
        #[serde(default)]
        artist: Vec<String>,
        /// Labels.
        #[serde(default)]
        company: Vec<String>,
        /// Total length in seconds.
        duration: Option<u32>,
        /// Release date.
        release_date: Option<String>,
        /// Track list as plain text.
        track_list: Option<String>,
        /// Barcode.
        barcode: Option<String>,
    }
}

item_schema! {
    /// A podcast.
    PodcastSchema {
        /// Hosts.
        #[serde(default)]
        host: Vec<String>,
        /// Genres.
        #[serde(default)]
        genre: Vec<String>,
        /// Languages.
        #[serde(default)]
        language: Vec<String>,
        /// Number of episodes.
        episode_count: Option<u32>,
        /// Date of the latest episode.
        last_episode_date: Option<String>,
        /// Feed address.
        rss_url: Option<String>,
        /// Website.
        website_url: Option<String>,
    }
}

item_schema! {
    /// A video game.
    GameSchema {
        /// Genres.
        #[serde(default)]
        genre: Vec<String>,
        /// Developers.
        #[serde(default)]
        developer: Vec<String>,
        /// Publishers.
        #[serde(default)]
        publisher: Vec<String>,
        /// Platforms.
        #[serde(default)]
        platform: Vec<String>,
        /// Release type, such as `game` or `dlc`.
        release_type: Option<String>,
        /// Release date.
        release_date: Option<String>,
        /// Official site.
        official_site: Option<String>,
    }
}

item_schema! {
    /// A stage performance.
    PerformanceSchema {
        /// Title in the original language.
        orig_title: Option<String>,
        /// Alternative titles.
        #[serde(default)]
        other_title: Vec<String>,
        /// Genres.
        #[serde(default)]
        genre: Vec<String>,
        /// Languages.
        #[serde(default)]
        language: Vec<String>,
        /// Opening date.
        opening_date: Option<String>,
        /// Closing date.
        closing_date: Option<String>,
        /// Directors.
        #[serde(default)]
        director: Vec<String>,
        /// Playwrights.
        #[serde(default)]
        playwright: Vec<String>,
        /// Original creators.
        #[serde(default)]
        orig_creator: Vec<String>,
        /// Composers.
        #[serde(default)]
        composer: Vec<String>,
        /// Choreographers.
        #[serde(default)]
        choreographer: Vec<String>,
        /// Performers.
        #[serde(default)]
        performer: Vec<String>,
        /// Cast, with roles.
        #[serde(default)]
        actor: Vec<CrewMember>,
        /// Crew, with roles.
        #[serde(default)]
        crew: Vec<CrewMember>,
        /// Official site.
        official_site: Option<String>,
    }
}

item_schema! {
    /// One production of a stage performance.
    PerformanceProductionSchema {
        /// Title in the original language.
        orig_title: Option<String>,
        /// Alternative titles.
        #[serde(default)]
        other_title: Vec<String>,
        /// Languages.
        #[serde(default)]
        language: Vec<String>,
        /// Opening date.
        opening_date: Option<String>,
        /// Closing date.
        closing_date: Option<String>,
        /// Directors.
        #[serde(default)]
        director: Vec<String>,
        /// Playwrights.
        #[serde(default)]
        playwright: Vec<String>,
        /// Original creators.
        #[serde(default)]
        orig_creator: Vec<String>,
        /// Composers.
        #[serde(default)]
        composer: Vec<String>,
        /// Choreographers.
        #[serde(default)]
        choreographer: Vec<String>,
        /// Performers.
        #[serde(default)]
        performer: Vec<String>,
        /// Cast, with roles.
        #[serde(default)]
        actor: Vec<CrewMember>,
        /// Crew, with roles.
        #[serde(default)]
        crew: Vec<CrewMember>,
        /// Official site.
        official_site: Option<String>,
    }
}

/// An item of any shape.
///
/// Serializes as the JSON of the wrapped record, without a tag; the shape to
/// decode it back with comes from the item's category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Item {
    /// An item of a category without a dedicated shape.
    Base(ItemSchema),
    /// A book edition.
    Edition(EditionSchema),
    /// A movie.
    Movie(MovieSchema),
    /// A TV show, season or episode.
    TvShow(TvShowSchema),
    /// A music album.
    Album(AlbumSchema),
    /// A podcast.
    Podcast(PodcastSchema),
    /// A video game.
    Game(GameSchema),
    /// A stage performance.
    Performance(PerformanceSchema),
    /// One production of a stage performance.
    PerformanceProduction(PerformanceProductionSchema),
}

impl Item {
    /// Returns the shape of the wrapped record.
    #[must_use]
    pub fn shape(&self) -> ItemShape {
        match self {
            Self::Base(_) => ItemShape::Base,
            Self::Edition(_) => ItemShape::Edition,
            Self::Movie(_) => ItemShape::Movie,
            Self::TvShow(_) => ItemShape::TvShow,
            Self::Album(_) => ItemShape::Album,
            Self::Podcast(_) => ItemShape::Podcast,
            Self::Game(_) => ItemShape::Game,
            Self::Performance(_) => ItemShape::Performance,
            Self::PerformanceProduction(_) => ItemShape::PerformanceProduction,
        }
    }

    /// Returns the fields shared by every item.
    #[must_use]
    pub fn common(&self) -> &ItemCommon {
        match self {
            Self::Base(item) => &item.common,
            Self::Edition(item) => &item.common,
            Self::Movie(item) => &item.common,
            Self::TvShow(item) => &item.common,
            Self::Album(item) => &item.common,
            Self::Podcast(item) => &item.common,
            Self::Game(item) => &item.common,
            Self::Performance(item) => &item.common,
            Self::PerformanceProduction(item) => &item.common,
        }
    }

    /// Returns the catalog id of the item.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.common().id
    }

    /// Returns the category the item reports for itself.
    #[must_use]
    pub fn category(&self) -> ItemCategory {
        self.common().category
    }
}

macro_rules! impl_from_schema {
    ($($schema:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$schema> for Item {
                fn from(item: $schema) -> Self {
                    Self::$variant(item)
                }
            }
        )*
    };
}

impl_from_schema! {
    ItemSchema => Base,
    EditionSchema => Edition,
    MovieSchema => Movie,
    TvShowSchema => TvShow,
    AlbumSchema => Album,
    PodcastSchema => Podcast,
    GameSchema => Game,
    PerformanceSchema => Performance,
    PerformanceProductionSchema => PerformanceProduction,
}
