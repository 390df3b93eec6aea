//! Cache entry envelope and statistics

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Expiry metadata stored with every entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ttl_hours: u32,
    #[serde(default)]
    pub description: String,
}

impl CacheMeta {
    /// Metadata for an entry written at `now`
    pub fn new(now: DateTime<Utc>, ttl_hours: u32, description: &str) -> Self {
        Self {
            cached_at: now,
            expires_at: now + Duration::hours(i64::from(ttl_hours)),
            ttl_hours,
            description: description.to_string(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Borrowed view used when writing an entry
#[derive(Serialize)]
pub(crate) struct EntryRef<'a, T: ?Sized> {
    #[serde(rename = "_cache_meta")]
    pub meta: &'a CacheMeta,
    pub data: &'a T,
}

/// Owned entry decoded on read
#[derive(Deserialize)]
pub(crate) struct StoredEntry<T> {
    #[serde(rename = "_cache_meta")]
    pub meta: CacheMeta,
    pub data: T,
}

/// Metadata-only view; the payload is skipped
#[derive(Deserialize)]
pub(crate) struct StoredMeta {
    #[serde(rename = "_cache_meta")]
    pub meta: CacheMeta,
}

/// Summary of the cache contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    /// Entry counts keyed by `namespace/category`
    pub by_category: BTreeMap<String, usize>,
    pub oldest_cached_at: Option<DateTime<Utc>>,
    pub newest_cached_at: Option<DateTime<Utc>>,
}

impl CacheStats {
    /// Number of entries in one category
    pub fn count(&self, namespace: &str, category: &str) -> usize {
        self.by_category
            .get(&format!("{}/{}", namespace, category))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn record_cached_at(&mut self, cached_at: DateTime<Utc>) {
        if self.oldest_cached_at.is_none_or(|oldest| cached_at < oldest) {
            self.oldest_cached_at = Some(cached_at);
        }
        if self.newest_cached_at.is_none_or(|newest| cached_at > newest) {
            self.newest_cached_at = Some(cached_at);
        }
    }
}
