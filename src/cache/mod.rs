//! On-disk TTL cache for metadata lookups
//!
//! Shields scans from the cost and rate limits of remote services.
//! Entries are JSON files partitioned by namespace and category:
//!
//! ```text
//! <root>/
//! ├── tmdb/
//! │   ├── movies/<movie_id>.json
//! │   └── collections/<collection_id>.json
//! └── tvdb/
//!     └── episodes/<series_id>.json
//! ```
//!
//! Each file holds a `_cache_meta` object (`cached_at`, `expires_at`,
//! `ttl_hours`, `description`) next to the opaque `data` payload.
//!
//! # Entry lifecycle
//!
//! | State | On `get` | On `sweep_expired` |
//! |-------|----------|--------------------|
//! | Fresh | payload returned | kept |
//! | Expired | deleted, miss | deleted, counted |
//! | Corrupt | deleted, miss | deleted, counted |

pub mod entry;
pub mod store;

pub use entry::{CacheMeta, CacheStats};
pub use store::TtlCache;

/// Namespace for TMDB lookups
pub const NS_TMDB: &str = "tmdb";
/// Namespace for TVDB lookups
pub const NS_TVDB: &str = "tvdb";

/// Category holding TMDB movie details
pub const CAT_MOVIES: &str = "movies";
/// Category holding TMDB collections
pub const CAT_COLLECTIONS: &str = "collections";
/// Category holding TVDB series episode lists
pub const CAT_EPISODES: &str = "episodes";

/// Default TTL for movie details (7 days)
pub const MOVIE_TTL_HOURS: u32 = 168;
/// Default TTL for collections (7 days)
pub const COLLECTION_TTL_HOURS: u32 = 168;
/// Default TTL for episode lists
pub const EPISODE_TTL_HOURS: u32 = 24;
