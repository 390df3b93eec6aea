//! Data models for owned items, canonical sets and gap reports

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A movie or episode present in the library
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnedItem {
    /// Library-local key (e.g. Plex rating key)
    pub key: String,
    pub title: String,
    pub year: Option<i32>,
    /// External id (TMDB id for movies, TVDB id for episodes)
    pub external_id: Option<String>,
    /// External id of the parent series, for episodes
    pub parent_id: Option<String>,
    /// Title of the parent series, for episodes
    pub parent_title: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl OwnedItem {
    /// External id, treating an empty string as absent
    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Reference to a canonical group (collection or series)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: String,
    pub name: String,
}

/// One item of a canonical set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalItem {
    pub id: String,
    pub title: String,
    /// Release date (movies) or air date (episodes)
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
}

/// Authoritative membership of a collection or series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSet {
    pub id: String,
    pub name: String,
    pub items: Vec<CanonicalItem>,
}

/// A movie missing from the library
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingMovie {
    pub tmdb_id: String,
    pub title: String,
    pub release_date: Option<NaiveDate>,
}

impl MissingMovie {
    pub fn year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }

    /// Title with year when known
    pub fn display_title(&self) -> String {
        match self.year() {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}

impl From<&CanonicalItem> for MissingMovie {
    fn from(item: &CanonicalItem) -> Self {
        Self {
            tmdb_id: item.id.clone(),
            title: item.title.clone(),
            release_date: item.date,
        }
    }
}

/// A collection with missing movies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionGap {
    pub collection_id: String,
    pub collection_name: String,
    pub total_movies: usize,
    pub owned_movies: usize,
    pub missing_movies: Vec<MissingMovie>,
}

impl CollectionGap {
    pub fn missing_count(&self) -> usize {
        self.missing_movies.len()
    }

    pub fn completion_percent(&self) -> f64 {
        completion_percent(self.owned_movies, self.total_movies)
    }
}

/// Result of a movie library scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieGapReport {
    pub library_name: String,
    pub total_movies_scanned: usize,
    pub movies_with_tmdb_id: usize,
    pub movies_in_collections: usize,
    pub unique_collections: usize,
    pub collections_with_gaps: Vec<CollectionGap>,
}

impl MovieGapReport {
    pub fn total_missing(&self) -> usize {
        self.collections_with_gaps
            .iter()
            .map(CollectionGap::missing_count)
            .sum()
    }

    pub fn complete_collections(&self) -> usize {
        self.unique_collections
            .saturating_sub(self.collections_with_gaps.len())
    }
}

/// An episode missing from the library
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingEpisode {
    pub tvdb_id: String,
    pub season: u32,
    pub episode: Option<u32>,
    pub title: String,
    pub aired: Option<NaiveDate>,
}

impl MissingEpisode {
    /// `S01E05` style code
    pub fn episode_code(&self) -> String {
        match self.episode {
            Some(episode) => format!("S{:02}E{:02}", self.season, episode),
            None => format!("S{:02}E??", self.season),
        }
    }
}

impl From<&CanonicalItem> for MissingEpisode {
    fn from(item: &CanonicalItem) -> Self {
        Self {
            tvdb_id: item.id.clone(),
            season: item.season.unwrap_or(0),
            episode: item.number,
            title: item.title.clone(),
            aired: item.date,
        }
    }
}

/// Missing episodes within one season
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonGap {
    pub season_number: u32,
    pub total_episodes: usize,
    pub owned_episodes: usize,
    pub missing_episodes: Vec<MissingEpisode>,
}

/// A show with missing episodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowGap {
    pub tvdb_id: String,
    pub show_title: String,
    pub total_episodes: usize,
    pub owned_episodes: usize,
    pub seasons_with_gaps: Vec<SeasonGap>,
}

impl ShowGap {
    pub fn missing_count(&self) -> usize {
        self.seasons_with_gaps
            .iter()
            .map(|s| s.missing_episodes.len())
            .sum()
    }

    pub fn completion_percent(&self) -> f64 {
        completion_percent(self.owned_episodes, self.total_episodes)
    }
}

/// Result of a TV library scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeGapReport {
    pub library_name: String,
    pub total_episodes_scanned: usize,
    pub episodes_with_tvdb_id: usize,
    pub episodes_in_shows: usize,
    pub unique_shows: usize,
    pub shows_with_gaps: Vec<ShowGap>,
}

impl EpisodeGapReport {
    pub fn total_missing(&self) -> usize {
        self.shows_with_gaps.iter().map(ShowGap::missing_count).sum()
    }

    pub fn complete_shows(&self) -> usize {
        self.unique_shows.saturating_sub(self.shows_with_gaps.len())
    }
}

/// Owned share of a set in percent; an empty set counts as complete
pub fn completion_percent(owned: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    owned as f64 / total as f64 * 100.0
}

/// Display rating for a completion score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreRating {
    Good,
    Warning,
    Bad,
}

impl ScoreRating {
    pub fn for_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Good
        } else if score >= 70.0 {
            Self::Warning
        } else {
            Self::Bad
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(id: &str) -> MissingMovie {
        MissingMovie {
            tmdb_id: id.to_string(),
            title: format!("Movie {}", id),
            release_date: None,
        }
    }

    #[test]
    fn display_title_with_and_without_year() {
        let mut movie = missing("123");
        movie.title = "Test Movie".into();
        assert_eq!(movie.display_title(), "Test Movie");

        movie.release_date = NaiveDate::from_ymd_opt(2020, 6, 1);
        assert_eq!(movie.display_title(), "Test Movie (2020)");
    }

    #[test]
    fn collection_completion() {
        let gap = CollectionGap {
            collection_id: "1".into(),
            collection_name: "Test Collection".into(),
            total_movies: 4,
            owned_movies: 3,
            missing_movies: vec![missing("1")],
        };
        assert_eq!(gap.missing_count(), 1);
        assert_eq!(gap.completion_percent(), 75.0);
    }

    #[test]
    fn empty_set_is_complete() {
        assert_eq!(completion_percent(0, 0), 100.0);
    }

    #[test]
    fn report_totals_are_derived() {
        let report = MovieGapReport {
            library_name: "Movies".into(),
            total_movies_scanned: 100,
            movies_with_tmdb_id: 95,
            movies_in_collections: 50,
            unique_collections: 10,
            collections_with_gaps: vec![
                CollectionGap {
                    collection_id: "1".into(),
                    collection_name: "Collection 1".into(),
                    total_movies: 5,
                    owned_movies: 3,
                    missing_movies: vec![missing("1"), missing("2")],
                },
                CollectionGap {
                    collection_id: "2".into(),
                    collection_name: "Collection 2".into(),
                    total_movies: 3,
                    owned_movies: 2,
                    missing_movies: vec![missing("3")],
                },
            ],
        };
        assert_eq!(report.total_missing(), 3);
        assert_eq!(report.complete_collections(), 8);
    }

    #[test]
    fn episode_code_format() {
        let ep = MissingEpisode {
            tvdb_id: "1".into(),
            season: 1,
            episode: Some(5),
            title: "Pilot".into(),
            aired: None,
        };
        assert_eq!(ep.episode_code(), "S01E05");
    }

    #[test]
    fn owned_item_treats_empty_id_as_missing() {
        let item = OwnedItem {
            external_id: Some(String::new()),
            ..Default::default()
        };
        assert!(item.external_id().is_none());
    }

    #[test]
    fn score_ratings() {
        assert_eq!(ScoreRating::for_score(95.0), ScoreRating::Good);
        assert_eq!(ScoreRating::for_score(70.0), ScoreRating::Warning);
        assert_eq!(ScoreRating::for_score(10.0), ScoreRating::Bad);
    }
}
