//! In-memory sources for finder tests

use crate::error::{Service, SourceError};
use crate::gaps::models::{CanonicalItem, CanonicalSet, GroupRef, OwnedItem};
use crate::gaps::source::{Library, LibraryKind, LibrarySource, MetadataSource};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

pub(crate) fn canonical(id: &str, title: &str, date: &str) -> CanonicalItem {
    CanonicalItem {
        id: id.to_string(),
        title: title.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
        season: None,
        number: None,
    }
}

pub(crate) fn episode(id: &str, season: u32, number: u32, aired: &str) -> CanonicalItem {
    CanonicalItem {
        season: Some(season),
        number: Some(number),
        ..canonical(id, &format!("Episode {}", number), aired)
    }
}

pub(crate) fn owned_movie(id: &str, title: &str) -> OwnedItem {
    OwnedItem {
        key: format!("key-{}", id),
        title: title.to_string(),
        external_id: (!id.is_empty()).then(|| id.to_string()),
        ..Default::default()
    }
}

pub(crate) fn owned_episode(id: &str, series_id: &str, show: &str, season: u32, number: u32) -> OwnedItem {
    OwnedItem {
        key: format!("key-{}", id),
        title: format!("Episode {}", number),
        external_id: Some(id.to_string()),
        parent_id: Some(series_id.to_string()),
        parent_title: Some(show.to_string()),
        season: Some(season),
        episode: Some(number),
        ..Default::default()
    }
}

pub(crate) struct FakeLibrary {
    library: String,
    items: Vec<OwnedItem>,
    failure: Option<SourceError>,
}

impl FakeLibrary {
    /// A "Movies" library holding `(tmdb_id, title)` pairs
    pub fn movies(items: &[(&str, &str)]) -> Self {
        Self::new(
            "Movies",
            items.iter().map(|(id, title)| owned_movie(id, title)).collect(),
        )
    }

    pub fn new(library: &str, items: Vec<OwnedItem>) -> Self {
        Self {
            library: library.to_string(),
            items,
            failure: None,
        }
    }

    pub fn failing(err: SourceError) -> Self {
        Self {
            failure: Some(err),
            ..Self::new("Movies", Vec::new())
        }
    }
}

#[async_trait]
impl LibrarySource for FakeLibrary {
    fn name(&self) -> &str {
        "Fake Plex"
    }

    async fn list_libraries(&self) -> Result<Vec<Library>, SourceError> {
        Ok(vec![Library {
            key: "1".to_string(),
            title: self.library.clone(),
            kind: LibraryKind::Movie,
        }])
    }

    async fn list_owned(&self, library_name: &str) -> Result<Vec<OwnedItem>, SourceError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if library_name != self.library {
            return Err(SourceError::NotFound {
                service: Service::Plex,
                what: format!("library '{}'", library_name),
            });
        }
        Ok(self.items.clone())
    }
}

#[derive(Default)]
pub(crate) struct FakeMetadata {
    membership: HashMap<String, GroupRef>,
    sets: HashMap<String, CanonicalSet>,
    resolve_errors: HashMap<String, SourceError>,
    fetch_errors: HashMap<String, SourceError>,
    by_parent: bool,
    fetched: Mutex<Vec<String>>,
}

impl FakeMetadata {
    /// Resolve episodes to their parent series without lookups
    pub fn series() -> Self {
        Self {
            by_parent: true,
            ..Default::default()
        }
    }

    pub fn with_membership(mut self, item_id: &str, group_id: &str, group_name: &str) -> Self {
        self.membership.insert(
            item_id.to_string(),
            GroupRef {
                id: group_id.to_string(),
                name: group_name.to_string(),
            },
        );
        self
    }

    pub fn with_set(mut self, group_id: &str, name: &str, items: Vec<CanonicalItem>) -> Self {
        self.sets.insert(
            group_id.to_string(),
            CanonicalSet {
                id: group_id.to_string(),
                name: name.to_string(),
                items,
            },
        );
        self
    }

    pub fn with_resolve_error(mut self, item_id: &str, err: SourceError) -> Self {
        self.resolve_errors.insert(item_id.to_string(), err);
        self
    }

    pub fn with_fetch_error(mut self, group_id: &str, err: SourceError) -> Self {
        self.fetch_errors.insert(group_id.to_string(), err);
        self
    }

    /// Group ids passed to `fetch_group`, in call order
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataSource for FakeMetadata {
    fn name(&self) -> &str {
        "Fake TMDB"
    }

    async fn resolve_group(&self, item: &OwnedItem) -> Result<Option<GroupRef>, SourceError> {
        let id = item.external_id().unwrap_or_default();
        if let Some(err) = self.resolve_errors.get(id) {
            return Err(err.clone());
        }
        if self.by_parent {
            return Ok(item.parent_id.clone().map(|parent| GroupRef {
                id: parent,
                name: item.parent_title.clone().unwrap_or_default(),
            }));
        }
        Ok(self.membership.get(id).cloned())
    }

    async fn fetch_group(&self, group_id: &str) -> Result<CanonicalSet, SourceError> {
        self.fetched.lock().unwrap().push(group_id.to_string());
        if let Some(err) = self.fetch_errors.get(group_id) {
            return Err(err.clone());
        }
        self.sets.get(group_id).cloned().ok_or_else(|| SourceError::NotFound {
            service: Service::Tmdb,
            what: format!("collection {}", group_id),
        })
    }
}
