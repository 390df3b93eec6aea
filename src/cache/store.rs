//! File-backed TTL cache store

use super::entry::{CacheMeta, CacheStats, EntryRef, StoredEntry, StoredMeta};
use crate::clock::{self, Clock};
use crate::error::{ReelgapError, ReelgapResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Namespaced JSON-file cache with per-entry expiry
///
/// Missing, expired and corrupt entries are all ordinary misses. When
/// disabled, `get` always misses and `set`/`delete` do nothing.
#[derive(Debug, Clone)]
pub struct TtlCache {
    root: PathBuf,
    enabled: bool,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    /// Create an enabled cache rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            enabled: true,
            clock: clock::system(),
        }
    }

    /// Turn caching on or off
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Use a specific time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get a cached payload if present, fresh and decodable
    pub fn get<T: DeserializeOwned>(&self, namespace: &str, category: &str, key: &str) -> Option<T> {
        if !self.enabled {
            return None;
        }

        let path = self.entry_path(namespace, category, key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                debug!("Unreadable cache entry {}: {}", path.display(), e);
                discard(&path);
                return None;
            }
        };

        match serde_json::from_str::<StoredEntry<T>>(&content) {
            Ok(entry) if entry.meta.is_expired(self.clock.now()) => {
                debug!("Cache entry {}/{}/{} expired", namespace, category, key);
                discard(&path);
                None
            }
            Ok(entry) => Some(entry.data),
            Err(e) => {
                debug!("Corrupt cache entry {}: {}", path.display(), e);
                discard(&path);
                None
            }
        }
    }

    /// Store a payload, replacing any existing entry
    ///
    /// The entry is written to a temporary file in the target directory and
    /// renamed into place, so readers never observe a partial entry.
    pub fn set<T: Serialize + ?Sized>(
        &self,
        namespace: &str,
        category: &str,
        key: &str,
        payload: &T,
        ttl_hours: u32,
        description: &str,
    ) -> ReelgapResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let path = self.entry_path(namespace, category, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ReelgapError::io(format!("creating cache directory {}", parent.display()), e)
            })?;
        }

        let meta = CacheMeta::new(self.clock.now(), ttl_hours, description);
        let entry = EntryRef {
            meta: &meta,
            data: payload,
        };

        let tmp = temp_path(&path);
        let result = write_entry(&tmp, &entry).and_then(|()| {
            fs::rename(&tmp, &path).map_err(|e| ReelgapError::CacheWrite {
                path: path.clone(),
                source: e,
            })
        });

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        debug!(
            "Cached {}/{}/{} until {}",
            namespace, category, key, meta.expires_at
        );
        Ok(())
    }

    /// Delete one entry, returning whether anything was removed
    pub fn delete(&self, namespace: &str, category: &str, key: &str) -> bool {
        if !self.enabled {
            return false;
        }
        fs::remove_file(self.entry_path(namespace, category, key)).is_ok()
    }

    /// Delete every entry, or every entry in one namespace
    pub fn clear(&self, namespace: Option<&str>) -> ReelgapResult<usize> {
        let dir = match namespace {
            Some(ns) => self.root.join(sanitize_segment(ns)),
            None => self.root.clone(),
        };

        let mut count = 0;
        for file in entry_files(&dir) {
            fs::remove_file(&file).map_err(|e| {
                ReelgapError::io(format!("removing cache entry {}", file.display()), e)
            })?;
            count += 1;
        }

        self.prune_empty_dirs();
        debug!("Cleared {} cache entries", count);
        Ok(count)
    }

    /// Delete expired and corrupt entries
    pub fn sweep_expired(&self) -> ReelgapResult<usize> {
        let now = self.clock.now();
        let mut count = 0;

        for file in entry_files(&self.root) {
            let expired = read_meta(&file).is_none_or(|meta| meta.expires_at < now);
            if expired {
                match fs::remove_file(&file) {
                    Ok(()) => count += 1,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        return Err(ReelgapError::io(
                            format!("removing cache entry {}", file.display()),
                            e,
                        ))
                    }
                }
            }
        }

        self.prune_empty_dirs();
        debug!("Swept {} expired cache entries", count);
        Ok(count)
    }

    /// Count expired and corrupt entries without removing them
    pub fn expired_count(&self) -> usize {
        let now = self.clock.now();
        entry_files(&self.root)
            .iter()
            .filter(|file| read_meta(file).is_none_or(|meta| now > meta.expires_at))
            .count()
    }

    /// Scan the cache and summarize it, skipping unreadable entries
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();

        for file in entry_files(&self.root) {
            let Ok(metadata) = fs::metadata(&file) else {
                continue;
            };
            stats.total_entries += 1;
            stats.total_size_bytes += metadata.len();

            if let Ok(rel) = file.strip_prefix(&self.root) {
                let parts: Vec<_> = rel.iter().map(|p| p.to_string_lossy()).collect();
                if parts.len() >= 3 {
                    *stats
                        .by_category
                        .entry(format!("{}/{}", parts[0], parts[1]))
                        .or_insert(0) += 1;
                }
            }

            if let Some(meta) = read_meta(&file) {
                stats.record_cached_at(meta.cached_at);
            }
        }

        stats
    }

    fn entry_path(&self, namespace: &str, category: &str, key: &str) -> PathBuf {
        self.root
            .join(sanitize_segment(namespace))
            .join(sanitize_segment(category))
            .join(format!("{}.json", sanitize_segment(key)))
    }

    /// Remove empty directories bottom-up, keeping the root
    fn prune_empty_dirs(&self) {
        fn prune(dir: &Path) -> bool {
            let Ok(entries) = fs::read_dir(dir) else {
                return false;
            };
            let mut empty = true;
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    if prune(&path) {
                        let _ = fs::remove_dir(&path);
                    } else {
                        empty = false;
                    }
                } else {
                    empty = false;
                }
            }
            empty
        }

        prune(&self.root);
    }
}

fn write_entry<T: Serialize + ?Sized>(tmp: &Path, entry: &EntryRef<'_, T>) -> ReelgapResult<()> {
    let write_err = |e: io::Error| ReelgapError::CacheWrite {
        path: tmp.to_path_buf(),
        source: e,
    };

    let file = File::create(tmp).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, entry).map_err(|e| ReelgapError::CacheEncode {
        path: tmp.to_path_buf(),
        source: e,
    })?;
    writer.flush().map_err(write_err)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

fn read_meta(path: &Path) -> Option<CacheMeta> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str::<StoredMeta>(&content)
        .ok()
        .map(|stored| stored.meta)
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            debug!("Failed to remove cache entry {}: {}", path.display(), e);
        }
    }
}

/// All `*.json` entry files below `dir`
fn entry_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let Ok(entries) = fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
    }

    files.sort();
    files
}

/// Keep keys from escaping their directory
fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        cleaned.replace('.', "_") + "_"
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};
    use serde::{Deserialize, Serializer};
    use serde_json::json;
    use tempfile::TempDir;

    fn test_cache() -> (TtlCache, Arc<ManualClock>, TempDir) {
        let temp = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 25, 10, 0, 0).unwrap(),
        ));
        let cache = TtlCache::new(temp.path()).with_clock(clock.clone());
        (cache, clock, temp)
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Movie {
        id: u64,
        title: String,
    }

    /// Payload whose serialization fails partway through
    struct Exploding;

    impl Serialize for Exploding {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("disk gremlins"))
        }
    }

    #[test]
    fn set_and_get_round_trip() {
        let (cache, _clock, _temp) = test_cache();
        let movie = Movie {
            id: 348,
            title: "Alien".into(),
        };

        cache.set("tmdb", "movies", "348", &movie, 168, "Movie: Alien").unwrap();
        let cached: Movie = cache.get("tmdb", "movies", "348").unwrap();
        assert_eq!(cached, movie);
    }

    #[test]
    fn missing_entry_is_a_miss() {
        let (cache, _clock, _temp) = test_cache();
        assert!(cache.get::<Movie>("tmdb", "movies", "1").is_none());
    }

    #[test]
    fn expired_entry_is_removed_on_get() {
        let (cache, clock, temp) = test_cache();
        cache.set("tmdb", "movies", "348", &json!({"id": 348}), 2, "").unwrap();
        let path = temp.path().join("tmdb/movies/348.json");
        assert!(path.exists());

        clock.advance(Duration::hours(2));
        assert!(cache.get::<serde_json::Value>("tmdb", "movies", "348").is_some());

        clock.advance(Duration::seconds(1));
        assert!(cache.get::<serde_json::Value>("tmdb", "movies", "348").is_none());
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_entry_is_removed_on_get() {
        let (cache, _clock, temp) = test_cache();
        let dir = temp.path().join("tmdb/movies");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("7.json"), "{ not json").unwrap();

        assert!(cache.get::<Movie>("tmdb", "movies", "7").is_none());
        assert!(!dir.join("7.json").exists());
    }

    #[test]
    fn payload_shape_mismatch_counts_as_corrupt() {
        let (cache, _clock, temp) = test_cache();
        cache.set("tmdb", "movies", "9", &json!({"unexpected": true}), 24, "").unwrap();

        assert!(cache.get::<Movie>("tmdb", "movies", "9").is_none());
        assert!(!temp.path().join("tmdb/movies/9.json").exists());
    }

    #[test]
    fn written_entry_has_meta_envelope() {
        let (cache, _clock, temp) = test_cache();
        cache.set("tvdb", "episodes", "81189", &json!([1, 2]), 24, "Series: Breaking Bad").unwrap();

        let raw = fs::read_to_string(temp.path().join("tvdb/episodes/81189.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["_cache_meta"]["ttl_hours"], 24);
        assert_eq!(value["_cache_meta"]["description"], "Series: Breaking Bad");
        assert!(value["_cache_meta"]["cached_at"].as_str().unwrap().starts_with("2025-01-25T10:00:00"));
        assert!(value["_cache_meta"]["expires_at"].as_str().unwrap().starts_with("2025-01-26T10:00:00"));
        assert_eq!(value["data"], json!([1, 2]));
    }

    #[test]
    fn disabled_cache_never_returns_data() {
        let temp = TempDir::new().unwrap();
        let cache = TtlCache::new(temp.path()).with_enabled(false);

        cache.set("tmdb", "movies", "1", &json!({"id": 1}), 168, "").unwrap();
        assert!(cache.get::<serde_json::Value>("tmdb", "movies", "1").is_none());
        assert!(!cache.delete("tmdb", "movies", "1"));
        assert!(!temp.path().join("tmdb").exists());
    }

    #[test]
    fn failed_write_keeps_previous_entry() {
        let (cache, _clock, temp) = test_cache();
        let movie = Movie {
            id: 1,
            title: "Original".into(),
        };
        cache.set("tmdb", "movies", "1", &movie, 168, "").unwrap();

        let err = cache.set("tmdb", "movies", "1", &Exploding, 168, "").unwrap_err();
        assert!(matches!(err, ReelgapError::CacheEncode { .. }));

        let cached: Movie = cache.get("tmdb", "movies", "1").unwrap();
        assert_eq!(cached, movie);

        let leftovers: Vec<_> = fs::read_dir(temp.path().join("tmdb/movies"))
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn failed_first_write_leaves_no_entry() {
        let (cache, _clock, _temp) = test_cache();
        assert!(cache.set("tmdb", "movies", "2", &Exploding, 168, "").is_err());
        assert!(cache.get::<serde_json::Value>("tmdb", "movies", "2").is_none());
    }

    #[test]
    fn delete_reports_removal() {
        let (cache, _clock, _temp) = test_cache();
        cache.set("tmdb", "movies", "1", &json!(1), 168, "").unwrap();

        assert!(cache.delete("tmdb", "movies", "1"));
        assert!(!cache.delete("tmdb", "movies", "1"));
    }

    #[test]
    fn clear_namespace_prunes_directories() {
        let (cache, _clock, temp) = test_cache();
        cache.set("tmdb", "movies", "1", &json!(1), 168, "").unwrap();
        cache.set("tmdb", "collections", "10", &json!(10), 168, "").unwrap();
        cache.set("tvdb", "episodes", "100", &json!(100), 24, "").unwrap();

        assert_eq!(cache.clear(Some("tmdb")).unwrap(), 2);
        assert!(!temp.path().join("tmdb").exists());
        assert!(cache.get::<serde_json::Value>("tvdb", "episodes", "100").is_some());

        assert_eq!(cache.clear(None).unwrap(), 1);
        assert!(!temp.path().join("tvdb").exists());
        assert!(temp.path().exists());
    }

    #[test]
    fn clear_on_missing_root_is_zero() {
        let temp = TempDir::new().unwrap();
        let cache = TtlCache::new(temp.path().join("nowhere"));
        assert_eq!(cache.clear(None).unwrap(), 0);
    }

    #[test]
    fn sweep_removes_expired_and_corrupt() {
        let (cache, clock, temp) = test_cache();
        cache.set("tvdb", "episodes", "short", &json!(1), 1, "").unwrap();
        cache.set("tmdb", "movies", "long", &json!(2), 168, "").unwrap();
        fs::write(temp.path().join("tmdb/movies/broken.json"), "garbage").unwrap();

        clock.advance(Duration::hours(2));
        assert_eq!(cache.expired_count(), 2);
        assert_eq!(cache.sweep_expired().unwrap(), 2);

        assert!(!temp.path().join("tvdb").exists());
        assert!(cache.get::<serde_json::Value>("tmdb", "movies", "long").is_some());
        assert_eq!(cache.expired_count(), 0);
    }

    #[test]
    fn stats_counts_by_category() {
        let (cache, clock, temp) = test_cache();
        cache.set("tmdb", "movies", "1", &json!(1), 168, "").unwrap();
        cache.set("tmdb", "movies", "2", &json!(2), 168, "").unwrap();
        clock.advance(Duration::hours(3));
        cache.set("tmdb", "collections", "10", &json!(10), 168, "").unwrap();
        fs::write(temp.path().join("tmdb/movies/bad.json"), "nope").unwrap();

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 4);
        assert_eq!(stats.count("tmdb", "movies"), 3);
        assert_eq!(stats.count("tmdb", "collections"), 1);
        assert_eq!(stats.count("tvdb", "episodes"), 0);
        assert!(stats.total_size_bytes > 0);
        assert_eq!(
            stats.oldest_cached_at,
            Some(Utc.with_ymd_and_hms(2025, 1, 25, 10, 0, 0).unwrap())
        );
        assert_eq!(
            stats.newest_cached_at,
            Some(Utc.with_ymd_and_hms(2025, 1, 25, 13, 0, 0).unwrap())
        );
    }

    #[test]
    fn keys_cannot_escape_the_cache_root() {
        let (cache, _clock, temp) = test_cache();
        cache.set("tmdb", "movies", "../../evil", &json!(1), 1, "").unwrap();

        assert!(temp.path().join("tmdb/movies/.._.._evil.json").exists());
        assert_eq!(sanitize_segment(".."), "___");
        assert_eq!(sanitize_segment(""), "_");
    }
}
