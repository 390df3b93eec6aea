//! Read interfaces the gap finders depend on
//!
//! The library side lists what the user owns; the metadata side knows
//! which group (collection or series) an item belongs to and what the
//! complete group looks like. Implementations live in `crate::sources`.

use crate::error::SourceError;
use crate::gaps::models::{CanonicalSet, GroupRef, OwnedItem};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Kind of media a library holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryKind {
    Movie,
    Show,
    Other,
}

impl fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Show => write!(f, "show"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A library exposed by the library source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Library {
    pub key: String,
    pub title: String,
    pub kind: LibraryKind,
}

/// Source of owned items (e.g. a Plex server)
#[async_trait]
pub trait LibrarySource: Send + Sync {
    /// Human-readable source name for progress labels
    fn name(&self) -> &str;

    /// List all libraries on the source
    async fn list_libraries(&self) -> Result<Vec<Library>, SourceError>;

    /// List owned items of one library, in a stable order.
    ///
    /// Movie libraries yield movies, show libraries yield episodes.
    async fn list_owned(&self, library_name: &str) -> Result<Vec<OwnedItem>, SourceError>;
}

/// Source of canonical group membership (e.g. TMDB, TVDB)
#[async_trait]
pub trait MetadataSource: Send + Sync {
    fn name(&self) -> &str;

    /// Group the item belongs to, if any
    async fn resolve_group(&self, item: &OwnedItem) -> Result<Option<GroupRef>, SourceError>;

    /// Full canonical item list of a group
    async fn fetch_group(&self, group_id: &str) -> Result<CanonicalSet, SourceError>;
}
