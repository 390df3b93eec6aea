//! Configuration schema for reelgap
//!
//! Configuration is stored at `~/.config/reelgap/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Plex server connection
    pub plex: PlexConfig,

    /// TMDB API access
    pub tmdb: TmdbConfig,

    /// TVDB API access
    pub tvdb: TvdbConfig,

    /// Scan options
    pub options: OptionsConfig,

    /// Collections and shows to skip
    pub exclusions: ExclusionsConfig,

    /// Metadata cache settings
    pub cache: CacheConfig,

    /// Retry policy for remote calls
    pub retry: RetryConfig,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Plex server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlexConfig {
    /// Server URL
    pub url: String,

    /// X-Plex-Token
    pub token: String,
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:32400".to_string(),
            token: String::new(),
        }
    }
}

/// TMDB settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    /// v3 API key
    pub api_key: String,
}

/// TVDB settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TvdbConfig {
    /// v4 API key
    pub api_key: String,

    /// Subscriber PIN (optional)
    pub pin: String,
}

/// Scan options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    /// Skip unreleased movies and unaired episodes
    pub exclude_future: bool,

    /// Skip season 0
    pub exclude_specials: bool,

    /// Episodes aired within this many hours are not reported yet
    pub recent_threshold_hours: u32,

    /// Ignore collections smaller than this
    pub min_collection_size: usize,

    /// Only report collections where at least this many movies are owned
    pub min_owned: usize,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            exclude_future: true,
            exclude_specials: true,
            recent_threshold_hours: 24,
            min_collection_size: 2,
            min_owned: 2,
        }
    }
}

/// Exclusion lists (exact, case-sensitive titles)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionsConfig {
    pub shows: Vec<String>,
    pub collections: Vec<String>,
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable metadata caching (default: true)
    pub enabled: bool,

    /// Cache directory (default: platform cache dir)
    pub dir: Option<PathBuf>,

    /// TTL for TMDB movie details
    pub movie_ttl_hours: u32,

    /// TTL for TMDB collections
    pub collection_ttl_hours: u32,

    /// TTL for TVDB episode lists
    pub episode_ttl_hours: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            movie_ttl_hours: crate::cache::MOVIE_TTL_HOURS,
            collection_ttl_hours: crate::cache::COLLECTION_TTL_HOURS,
            episode_ttl_hours: crate::cache::EPISODE_TTL_HOURS,
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry
    pub base_delay_ms: u64,

    /// Upper bound for computed delays
    pub max_delay_ms: u64,

    /// Backoff multiplier
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
        }
    }
}
