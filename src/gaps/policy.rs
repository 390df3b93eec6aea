//! Inclusion and exclusion policy for gap scans

use crate::config::Config;
use std::collections::BTreeSet;

/// Policy for movie collection scans
#[derive(Debug, Clone, PartialEq)]
pub struct MoviePolicy {
    /// Count unreleased (or undated) movies as gaps
    pub include_future: bool,
    /// Skip collections with fewer released movies than this
    pub min_collection_size: usize,
    /// Suppress collections where fewer than this many movies are owned
    pub min_owned: usize,
    /// Collection names to skip (exact match)
    pub excluded_collections: BTreeSet<String>,
}

impl Default for MoviePolicy {
    fn default() -> Self {
        Self {
            include_future: false,
            min_collection_size: 2,
            min_owned: 2,
            excluded_collections: BTreeSet::new(),
        }
    }
}

impl MoviePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            include_future: !config.options.exclude_future,
            min_collection_size: config.options.min_collection_size,
            min_owned: config.options.min_owned,
            excluded_collections: config.exclusions.collections.iter().cloned().collect(),
        }
    }

    pub fn is_excluded(&self, collection_name: &str) -> bool {
        self.excluded_collections.contains(collection_name)
    }
}

/// Policy for TV series scans
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodePolicy {
    /// Count unaired (or undated) episodes as gaps
    pub include_future: bool,
    /// Count season 0 episodes
    pub include_specials: bool,
    /// Episodes aired less than this many hours ago are not gaps yet
    pub recent_threshold_hours: u32,
    /// Show titles to skip (exact match)
    pub excluded_shows: BTreeSet<String>,
}

impl Default for EpisodePolicy {
    fn default() -> Self {
        Self {
            include_future: false,
            include_specials: false,
            recent_threshold_hours: 24,
            excluded_shows: BTreeSet::new(),
        }
    }
}

impl EpisodePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            include_future: !config.options.exclude_future,
            include_specials: !config.options.exclude_specials,
            recent_threshold_hours: config.options.recent_threshold_hours,
            excluded_shows: config.exclusions.shows.iter().cloned().collect(),
        }
    }

    pub fn is_excluded(&self, show_title: &str) -> bool {
        self.excluded_shows.contains(show_title)
    }
}
