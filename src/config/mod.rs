//! Configuration management for reelgap
//!
//! The configuration is loaded once at startup and handed to the scan
//! components by reference. String values may reference environment
//! variables (`$PLEX_TOKEN`, `${TMDB_API_KEY}`); unset variables expand
//! to an empty string.

pub mod schema;

pub use schema::Config;

use crate::error::{ReelgapError, ReelgapResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reelgap")
            .join("config.toml")
    }

    /// Default metadata cache directory
    pub fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reelgap")
    }

    /// Cache directory for a configuration, honoring `cache.dir`
    pub fn cache_dir(config: &Config) -> PathBuf {
        config
            .cache
            .dir
            .clone()
            .unwrap_or_else(Self::default_cache_dir)
    }

    /// Load configuration, falling back to defaults if the file is missing
    pub async fn load(&self) -> ReelgapResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> ReelgapResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ReelgapError::io(format!("reading config from {}", path.display()), e))?;

        parse_config(&content).map_err(|e| ReelgapError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> ReelgapResult<()> {
        self.write(toml::to_string_pretty(config)?).await
    }

    /// Raw TOML document as written on disk, without env expansion.
    /// A missing file is an empty table.
    pub async fn load_document(&self) -> ReelgapResult<toml::Value> {
        if !self.config_path.exists() {
            return Ok(toml::Value::Table(toml::map::Map::new()));
        }

        let content = fs::read_to_string(&self.config_path).await.map_err(|e| {
            ReelgapError::io(
                format!("reading config from {}", self.config_path.display()),
                e,
            )
        })?;
        toml::from_str(&content).map_err(|e| ReelgapError::ConfigInvalid {
            path: self.config_path.clone(),
            reason: e.to_string(),
        })
    }

    /// Save a raw TOML document
    pub async fn save_document(&self, doc: &toml::Value) -> ReelgapResult<()> {
        self.write(toml::to_string_pretty(doc)?).await
    }

    async fn write(&self, content: String) -> ReelgapResult<()> {
        self.ensure_config_dir().await?;

        fs::write(&self.config_path, content).await.map_err(|e| {
            ReelgapError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> ReelgapResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ReelgapError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse TOML and expand environment references in every string value
pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    let mut value: toml::Value = toml::from_str(content)?;
    expand_env(&mut value);
    value.try_into()
}

fn expand_env(value: &mut toml::Value) {
    match value {
        toml::Value::String(s) => {
            let expanded = shellexpand::env_with_context_no_errors(s.as_str(), |var| {
                Some(std::env::var(var).unwrap_or_default())
            })
            .into_owned();
            *s = expanded;
        }
        toml::Value::Array(items) => items.iter_mut().for_each(expand_env),
        toml::Value::Table(table) => table.iter_mut().for_each(|(_, v)| expand_env(v)),
        _ => {}
    }
}

/// Problems that prevent a scan from running
pub fn validate(config: &Config) -> Vec<String> {
    let mut issues = Vec::new();

    if config.plex.url.trim().is_empty() {
        issues.push("plex.url is not set".to_string());
    } else if !config.plex.url.starts_with("http://") && !config.plex.url.starts_with("https://") {
        issues.push(format!(
            "plex.url must start with http:// or https:// (got '{}')",
            config.plex.url
        ));
    }
    if config.plex.token.trim().is_empty() {
        issues.push("plex.token is not set".to_string());
    }
    if config.tmdb.api_key.trim().is_empty() {
        issues.push("tmdb.api_key is not set (needed for movie scans)".to_string());
    }
    if config.tvdb.api_key.trim().is_empty() {
        issues.push("tvdb.api_key is not set (needed for episode scans)".to_string());
    }
    if !matches!(config.general.log_format.as_str(), "text" | "json") {
        issues.push(format!(
            "general.log_format must be \"text\" or \"json\" (got '{}')",
            config.general.log_format
        ));
    }
    if config.retry.multiplier < 1.0 {
        issues.push("retry.multiplier must be at least 1.0".to_string());
    }
    if config.retry.max_delay_ms < config.retry.base_delay_ms {
        issues.push("retry.max_delay_ms must not be below retry.base_delay_ms".to_string());
    }

    issues
}
