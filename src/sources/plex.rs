//! Plex Media Server client

use crate::config::Config;
use crate::error::{ReelgapError, ReelgapResult, Service, SourceError};
use crate::gaps::models::OwnedItem;
use crate::gaps::source::{Library, LibraryKind, LibrarySource};
use crate::sources::http::{HttpClient, HttpRequest};
use crate::sources::retry::RetryPolicy;
use crate::stats::ScanStatistics;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Plex item type for shows in `/all` listings
const TYPE_SHOW: &str = "2";
/// Plex item type for episodes in `/all` listings
const TYPE_EPISODE: &str = "4";

#[derive(Debug, Deserialize)]
struct Response<T> {
    #[serde(rename = "MediaContainer")]
    container: T,
}

#[derive(Debug, Default, Deserialize)]
struct Sections {
    #[serde(rename = "Directory", default)]
    directories: Vec<Section>,
}

#[derive(Debug, Deserialize)]
struct Section {
    key: String,
    title: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Default, Deserialize)]
struct Items {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<PlexItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlexItem {
    rating_key: String,
    title: String,
    #[serde(default)]
    year: Option<i32>,
    #[serde(rename = "Guid", default)]
    guids: Vec<PlexGuid>,
    #[serde(default)]
    grandparent_rating_key: Option<String>,
    #[serde(default)]
    grandparent_title: Option<String>,
    /// Season number for episodes
    #[serde(default)]
    parent_index: Option<u32>,
    /// Episode number for episodes
    #[serde(default)]
    index: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlexGuid {
    id: String,
}

impl PlexItem {
    /// External id for a scheme such as `tmdb` or `tvdb`
    fn external_id(&self, scheme: &str) -> Option<String> {
        let prefix = format!("{}://", scheme);
        self.guids
            .iter()
            .find_map(|g| g.id.strip_prefix(&prefix))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

/// Plex library source
pub struct PlexClient {
    http: HttpClient,
    base_url: String,
    token: String,
}

impl PlexClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, http: HttpClient) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Build from configuration; fails when no token is set
    pub fn from_config(config: &Config, stats: Arc<ScanStatistics>) -> ReelgapResult<Self> {
        if config.plex.token.trim().is_empty() || config.plex.url.trim().is_empty() {
            return Err(ReelgapError::NotConfigured {
                service: Service::Plex,
            });
        }
        let http = HttpClient::new(
            Service::Plex,
            Duration::from_secs(config.general.request_timeout_secs),
            RetryPolicy::from_config(&config.retry),
            stats,
        );
        Ok(Self::new(config.plex.url.clone(), config.plex.token.clone(), http))
    }

    fn request(&self, path: &str, kind: &'static str, what: String) -> HttpRequest {
        HttpRequest::get(format!("{}{}", self.base_url, path), kind, what)
            .header("X-Plex-Token", self.token.clone())
            .header("Accept", "application/json")
    }

    /// Verify the server URL and token
    pub async fn test_connection(&self) -> Result<(), SourceError> {
        self.list_libraries().await.map(|_| ())
    }

    async fn section(&self, library_name: &str) -> Result<Section, SourceError> {
        let sections: Response<Sections> = self
            .http
            .get_json(self.request("/library/sections", "plex.sections", "library sections".into()))
            .await?;
        sections
            .container
            .directories
            .into_iter()
            .find(|s| s.title == library_name)
            .ok_or_else(|| SourceError::NotFound {
                service: Service::Plex,
                what: format!("library '{}'", library_name),
            })
    }

    async fn items(&self, section: &Section, item_type: Option<&str>) -> Result<Vec<PlexItem>, SourceError> {
        let mut request = self
            .request(
                &format!("/library/sections/{}/all", section.key),
                "plex.items",
                format!("library '{}'", section.title),
            )
            .query("includeGuids", "1");
        if let Some(item_type) = item_type {
            request = request.query("type", item_type);
        }
        let items: Response<Items> = self.http.get_json(request).await?;
        Ok(items.container.metadata)
    }

    async fn movies(&self, section: &Section) -> Result<Vec<OwnedItem>, SourceError> {
        let items = self.items(section, None).await?;
        Ok(items.iter().map(movie_item).collect())
    }

    async fn episodes(&self, section: &Section) -> Result<Vec<OwnedItem>, SourceError> {
        let shows = self.items(section, Some(TYPE_SHOW)).await?;
        let series_ids: HashMap<String, String> = shows
            .iter()
            .filter_map(|show| {
                show.external_id("tvdb")
                    .map(|id| (show.rating_key.clone(), id))
            })
            .collect();
        debug!(shows = shows.len(), with_tvdb = series_ids.len(), "Listed shows");

        let episodes = self.items(section, Some(TYPE_EPISODE)).await?;
        Ok(episodes
            .iter()
            .map(|ep| episode_item(ep, &series_ids))
            .collect())
    }
}

fn movie_item(item: &PlexItem) -> OwnedItem {
    OwnedItem {
        key: item.rating_key.clone(),
        title: item.title.clone(),
        year: item.year,
        external_id: item.external_id("tmdb"),
        ..Default::default()
    }
}

fn episode_item(item: &PlexItem, series_ids: &HashMap<String, String>) -> OwnedItem {
    OwnedItem {
        key: item.rating_key.clone(),
        title: item.title.clone(),
        year: item.year,
        external_id: item.external_id("tvdb"),
        parent_id: item
            .grandparent_rating_key
            .as_ref()
            .and_then(|key| series_ids.get(key))
            .cloned(),
        parent_title: item.grandparent_title.clone(),
        season: item.parent_index,
        episode: item.index,
    }
}

fn library_kind(kind: &str) -> LibraryKind {
    match kind {
        "movie" => LibraryKind::Movie,
        "show" => LibraryKind::Show,
        _ => LibraryKind::Other,
    }
}

#[async_trait]
impl LibrarySource for PlexClient {
    fn name(&self) -> &str {
        "Plex"
    }

    async fn list_libraries(&self) -> Result<Vec<Library>, SourceError> {
        let sections: Response<Sections> = self
            .http
            .get_json(self.request("/library/sections", "plex.sections", "library sections".into()))
            .await?;
        Ok(sections
            .container
            .directories
            .into_iter()
            .map(|s| Library {
                kind: library_kind(&s.kind),
                key: s.key,
                title: s.title,
            })
            .collect())
    }

    async fn list_owned(&self, library_name: &str) -> Result<Vec<OwnedItem>, SourceError> {
        let section = self.section(library_name).await?;
        match library_kind(&section.kind) {
            LibraryKind::Movie => self.movies(&section).await,
            LibraryKind::Show => self.episodes(&section).await,
            LibraryKind::Other => Err(SourceError::InvalidResponse {
                service: Service::Plex,
                reason: format!(
                    "library '{}' holds '{}' items, not movies or shows",
                    section.title, section.kind
                ),
            }),
        }
    }
}
