//! TMDB v3 client: movie details and collections

use crate::cache::{TtlCache, CAT_COLLECTIONS, CAT_MOVIES, NS_TMDB};
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

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Movie details as cached under `tmdb/movies`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub belongs_to_collection: Option<TmdbCollectionRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbCollectionRef {
    pub id: u64,
    pub name: String,
}

/// Collection as cached under `tmdb/collections`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbCollection {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub parts: Vec<TmdbPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbPart {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl TmdbCollection {
    /// Canonical set with parts in release order, undated parts last
    pub fn to_canonical(&self) -> CanonicalSet {
        let mut items: Vec<CanonicalItem> = self
            .parts
            .iter()
            .map(|part| CanonicalItem {
                id: part.id.to_string(),
                title: part.title.clone(),
                date: parse_date(part.release_date.as_deref()),
                season: None,
                number: None,
            })
            .collect();
        items.sort_by_key(|item| (item.date.is_none(), item.date));

        CanonicalSet {
            id: self.id.to_string(),
            name: self.name.clone(),
            items,
        }
    }
}

/// TMDB metadata source
pub struct TmdbClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
    cache: TtlCache,
    movie_ttl_hours: u32,
    collection_ttl_hours: u32,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, http: HttpClient, cache: TtlCache) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cache,
            movie_ttl_hours: crate::cache::MOVIE_TTL_HOURS,
            collection_ttl_hours: crate::cache::COLLECTION_TTL_HOURS,
        }
    }

    /// Build from configuration; fails when no API key is set
    pub fn from_config(
        config: &Config,
        cache: TtlCache,
        stats: Arc<ScanStatistics>,
    ) -> ReelgapResult<Self> {
        if config.tmdb.api_key.trim().is_empty() {
            return Err(ReelgapError::NotConfigured {
                service: Service::Tmdb,
            });
        }
        let http = HttpClient::new(
            Service::Tmdb,
            Duration::from_secs(config.general.request_timeout_secs),
            RetryPolicy::from_config(&config.retry),
            stats,
        );
        Ok(Self::new(config.tmdb.api_key.clone(), http, cache)
            .with_ttls(config.cache.movie_ttl_hours, config.cache.collection_ttl_hours))
    }

    pub fn with_ttls(mut self, movie_ttl_hours: u32, collection_ttl_hours: u32) -> Self {
        self.movie_ttl_hours = movie_ttl_hours;
        self.collection_ttl_hours = collection_ttl_hours;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, path: &str, kind: &'static str, what: String) -> HttpRequest {
        HttpRequest::get(format!("{}{}", self.base_url, path), kind, what)
            .query("api_key", self.api_key.clone())
            .header("Accept", "application/json")
    }

    /// Verify the API key
    pub async fn test_connection(&self) -> Result<(), SourceError> {
        let _: serde_json::Value = self
            .http
            .get_json(self.request("/configuration", "tmdb.configuration", "configuration".into()))
            .await?;
        Ok(())
    }

    /// Movie details, cache first
    pub async fn movie(&self, movie_id: &str) -> Result<TmdbMovie, SourceError> {
        if let Some(movie) =
            cache_lookup(&self.cache, self.http.stats(), NS_TMDB, CAT_MOVIES, movie_id)
        {
            return Ok(movie);
        }

        let movie: TmdbMovie = self
            .http
            .get_json(self.request(
                &format!("/movie/{}", movie_id),
                "tmdb.movie",
                format!("movie {}", movie_id),
            ))
            .await?;

        cache_store(
            &self.cache,
            Service::Tmdb,
            (NS_TMDB, CAT_MOVIES, movie_id),
            &movie,
            self.movie_ttl_hours,
            &format!("Movie: {}", movie.title),
        )?;
        Ok(movie)
    }

    /// Collection with all parts, cache first
    pub async fn collection(&self, collection_id: &str) -> Result<TmdbCollection, SourceError> {
        if let Some(collection) = cache_lookup(
            &self.cache,
            self.http.stats(),
            NS_TMDB,
            CAT_COLLECTIONS,
            collection_id,
        ) {
            return Ok(collection);
        }

        let collection: TmdbCollection = self
            .http
            .get_json(self.request(
                &format!("/collection/{}", collection_id),
                "tmdb.collection",
                format!("collection {}", collection_id),
            ))
            .await?;

        cache_store(
            &self.cache,
            Service::Tmdb,
            (NS_TMDB, CAT_COLLECTIONS, collection_id),
            &collection,
            self.collection_ttl_hours,
            &format!("Collection: {}", collection.name),
        )?;
        Ok(collection)
    }
}

#[async_trait]
impl MetadataSource for TmdbClient {
    fn name(&self) -> &str {
        "TMDB"
    }

    async fn resolve_group(&self, item: &OwnedItem) -> Result<Option<GroupRef>, SourceError> {
        let Some(movie_id) = item.external_id() else {
            return Ok(None);
        };
        let movie = self.movie(movie_id).await?;
        Ok(movie.belongs_to_collection.map(|c| GroupRef {
            id: c.id.to_string(),
            name: c.name,
        }))
    }

    async fn fetch_group(&self, group_id: &str) -> Result<CanonicalSet, SourceError> {
        Ok(self.collection(group_id).await?.to_canonical())
    }
}
