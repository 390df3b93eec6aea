//! Clients for the library server and metadata services
//!
//! | Client | Role | Cache |
//! |--------|------|-------|
//! | [`PlexClient`] | [`LibrarySource`](crate::gaps::LibrarySource) | none |
//! | [`TmdbClient`] | movie collections | `tmdb/movies`, `tmdb/collections` |
//! | [`TvdbClient`] | series episodes | `tvdb/episodes` |

pub mod http;
pub mod plex;
pub mod retry;
pub mod tmdb;
pub mod tvdb;

pub use http::{HttpClient, HttpRequest};
pub use plex::PlexClient;
pub use retry::RetryPolicy;
pub use tmdb::TmdbClient;
pub use tvdb::TvdbClient;

use crate::cache::TtlCache;
use crate::error::{Service, SourceError};
use crate::stats::ScanStatistics;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Look up a cached payload, counting the hit or miss
pub(crate) fn cache_lookup<T: DeserializeOwned>(
    cache: &TtlCache,
    stats: &ScanStatistics,
    namespace: &str,
    category: &str,
    key: &str,
) -> Option<T> {
    if !cache.is_enabled() {
        return None;
    }
    let found = cache.get(namespace, category, key);
    if found.is_some() {
        debug!(namespace, category, key, "Cache hit");
        stats.record_cache_hit();
    } else {
        debug!(namespace, category, key, "Cache miss");
        stats.record_cache_miss();
    }
    found
}

/// Store a payload; a failed write is fatal for the scan
pub(crate) fn cache_store<T: Serialize + ?Sized>(
    cache: &TtlCache,
    service: Service,
    entry: (&str, &str, &str),
    payload: &T,
    ttl_hours: u32,
    description: &str,
) -> Result<(), SourceError> {
    let (namespace, category, key) = entry;
    cache
        .set(namespace, category, key, payload, ttl_hours, description)
        .map_err(|e| SourceError::CacheWrite {
            service,
            reason: e.to_string(),
        })
}

/// Parse an API date, treating empty or malformed values as unknown
pub(crate) fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    value
        .filter(|v| !v.is_empty())
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}
