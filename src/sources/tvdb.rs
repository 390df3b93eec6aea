//! TVDB v4 client: series episode lists

use crate::cache::{TtlCache, CAT_EPISODES, NS_TVDB};
use crate::config::Config;
use crate::error::{ReelgapError, ReelgapResult, Service, SourceError};
use crate::gaps::models::{CanonicalItem, CanonicalSet, GroupRef, OwnedItem};
use crate::gaps::source::MetadataSource;
use crate::sources::http::{HttpClient, HttpRequest};
use crate::sources::retry::RetryPolicy;
use crate::sources::{cache_lookup, cache_store, parse_date};
use crate::stats::ScanStatistics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api4.thetvdb.com/v4";

/// Guard against endless `links.next` chains
const MAX_PAGES: u32 = 100;

/// Episode list as cached under `tvdb/episodes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvdbSeriesEpisodes {
    pub series_id: String,
    pub series_name: String,
    pub episodes: Vec<TvdbEpisode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TvdbEpisode {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub aired: Option<String>,
    pub season_number: u32,
    pub number: u32,
}

impl TvdbSeriesEpisodes {
    /// Canonical set ordered by season and episode number
    pub fn to_canonical(&self) -> CanonicalSet {
        let mut items: Vec<CanonicalItem> = self
            .episodes
            .iter()
            .map(|ep| CanonicalItem {
                id: ep.id.to_string(),
                title: ep
                    .name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| format!("Episode {}", ep.number)),
                date: parse_date(ep.aired.as_deref()),
                season: Some(ep.season_number),
                number: Some(ep.number),
            })
            .collect();
        items.sort_by_key(|item| (item.season, item.number));

        CanonicalSet {
            id: self.series_id.clone(),
            name: self.series_name.clone(),
            items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
    #[serde(default)]
    links: Option<Links>,
}

#[derive(Debug, Deserialize)]
struct Links {
    #[serde(default)]
    next: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct EpisodePage {
    #[serde(default)]
    series: Option<SeriesInfo>,
    #[serde(default)]
    episodes: Vec<TvdbEpisode>,
}

#[derive(Debug, Deserialize)]
struct SeriesInfo {
    #[serde(default)]
    name: Option<String>,
}

/// TVDB metadata source
pub struct TvdbClient {
    http: HttpClient,
    api_key: String,
    pin: String,
    base_url: String,
    cache: TtlCache,
    episode_ttl_hours: u32,
    token: OnceCell<String>,
}

impl TvdbClient {
    pub fn new(api_key: impl Into<String>, pin: impl Into<String>, http: HttpClient, cache: TtlCache) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            pin: pin.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cache,
            episode_ttl_hours: crate::cache::EPISODE_TTL_HOURS,
            token: OnceCell::new(),
        }
    }

    /// Build from configuration; fails when no API key is set
    pub fn from_config(
        config: &Config,
        cache: TtlCache,
        stats: Arc<ScanStatistics>,
    ) -> ReelgapResult<Self> {
        if config.tvdb.api_key.trim().is_empty() {
            return Err(ReelgapError::NotConfigured {
                service: Service::Tvdb,
            });
        }
        let http = HttpClient::new(
            Service::Tvdb,
            Duration::from_secs(config.general.request_timeout_secs),
            RetryPolicy::from_config(&config.retry),
            stats,
        );
        Ok(
            Self::new(config.tvdb.api_key.clone(), config.tvdb.pin.clone(), http, cache)
                .with_ttl(config.cache.episode_ttl_hours),
        )
    }

    pub fn with_ttl(mut self, episode_ttl_hours: u32) -> Self {
        self.episode_ttl_hours = episode_ttl_hours;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Bearer token, logging in on first use
    async fn token(&self) -> Result<&str, SourceError> {
        let token = self
            .token
            .get_or_try_init(|| async {
                let mut body = serde_json::json!({ "apikey": self.api_key });
                if !self.pin.is_empty() {
                    body["pin"] = serde_json::Value::String(self.pin.clone());
                }
                let login: Envelope<LoginData> = self
                    .http
                    .get_json(HttpRequest::post_json(
                        format!("{}/login", self.base_url),
                        "tvdb.login",
                        "login",
                        &body,
                    ))
                    .await?;
                debug!("TVDB login succeeded");
                Ok::<_, SourceError>(login.data.token)
            })
            .await?;
        Ok(token.as_str())
    }

    /// Verify the API key by logging in
    pub async fn test_connection(&self) -> Result<(), SourceError> {
        self.token().await.map(|_| ())
    }

    /// All episodes of a series, cache first
    pub async fn series_episodes(&self, series_id: &str) -> Result<TvdbSeriesEpisodes, SourceError> {
        if let Some(cached) =
            cache_lookup(&self.cache, self.http.stats(), NS_TVDB, CAT_EPISODES, series_id)
        {
            return Ok(cached);
        }

        let token = self.token().await?.to_string();
        let mut series_name = None;
        let mut episodes = Vec::new();

        for page in 0..MAX_PAGES {
            let response: Envelope<EpisodePage> = self
                .http
                .get_json(
                    HttpRequest::get(
                        format!("{}/series/{}/episodes/default", self.base_url, series_id),
                        "tvdb.episodes",
                        format!("series {}", series_id),
                    )
                    .query("page", page.to_string())
                    .header("Authorization", format!("Bearer {}", token))
                    .header("Accept", "application/json"),
                )
                .await?;

            if series_name.is_none() {
                series_name = response.data.series.and_then(|s| s.name);
            }
            episodes.extend(response.data.episodes);

            let has_next = response
                .links
                .and_then(|l| l.next)
                .is_some_and(|next| !next.is_null());
            if !has_next {
                break;
            }
        }

        let series = TvdbSeriesEpisodes {
            series_id: series_id.to_string(),
            series_name: series_name.unwrap_or_else(|| format!("Series {}", series_id)),
            episodes,
        };

        cache_store(
            &self.cache,
            Service::Tvdb,
            (NS_TVDB, CAT_EPISODES, series_id),
            &series,
            self.episode_ttl_hours,
            &format!("Series: {}", series.series_name),
        )?;
        Ok(series)
    }
}

#[async_trait]
impl MetadataSource for TvdbClient {
    fn name(&self) -> &str {
        "TVDB"
    }

    /// Episodes belong to the series their library parent maps to
    async fn resolve_group(&self, item: &OwnedItem) -> Result<Option<GroupRef>, SourceError> {
        Ok(item
            .parent_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| GroupRef {
                id: id.to_string(),
                name: item
                    .parent_title
                    .clone()
                    .unwrap_or_else(|| format!("Series {}", id)),
            }))
    }

    async fn fetch_group(&self, group_id: &str) -> Result<CanonicalSet, SourceError> {
        Ok(self.series_episodes(group_id).await?.to_canonical())
    }
}
