//! Error types for reelgap
//!
//! Crate-level operations return `ReelgapResult<T>`. Remote collaborators
//! (library server, metadata services) return the closed [`SourceError`]
//! set so callers can decide between skip, retry and abort without
//! inspecting messages.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for reelgap operations
pub type ReelgapResult<T> = Result<T, ReelgapError>;

/// Remote services reelgap talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Plex,
    Tmdb,
    Tvdb,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Plex => "Plex",
            Self::Tmdb => "TMDB",
            Self::Tvdb => "TVDB",
        };
        write!(f, "{}", name)
    }
}

/// Failures reported by a library or metadata source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("{service} rejected the configured credentials")]
    Unauthorized { service: Service },

    #[error("{service} has no record for {what}")]
    NotFound { service: Service, what: String },

    #[error("{service} rate limit reached")]
    RateLimited {
        service: Service,
        retry_after: Option<Duration>,
    },

    #[error("{service} request timed out")]
    Timeout { service: Service },

    #[error("{service} is unreachable: {reason}")]
    Unreachable { service: Service, reason: String },

    /// Connection dropped mid-request, e.g. reset by peer
    #[error("{service} connection interrupted: {reason}")]
    Interrupted { service: Service, reason: String },

    #[error("{service} returned HTTP {status}")]
    Http { service: Service, status: u16 },

    #[error("unexpected response from {service}: {reason}")]
    InvalidResponse { service: Service, reason: String },

    #[error("failed to write {service} cache entry: {reason}")]
    CacheWrite { service: Service, reason: String },
}

impl SourceError {
    /// The service that produced this error
    pub fn service(&self) -> Service {
        match self {
            Self::Unauthorized { service }
            | Self::NotFound { service, .. }
            | Self::RateLimited { service, .. }
            | Self::Timeout { service }
            | Self::Unreachable { service, .. }
            | Self::Interrupted { service, .. }
            | Self::Http { service, .. }
            | Self::InvalidResponse { service, .. }
            | Self::CacheWrite { service, .. } => *service,
        }
    }

    /// Whether repeating the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. }
            | Self::Timeout { .. }
            | Self::Unreachable { .. }
            | Self::Interrupted { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the source as a whole is unusable, so a scan must abort
    /// instead of skipping the current item.
    ///
    /// Only meaningful once retries are exhausted: an `Unreachable`
    /// that survives every retry means the service is down.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::Unreachable { .. } | Self::CacheWrite { .. }
        )
    }

    /// Server-provided wait hint for rate limiting
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Message suitable for showing to a user
    pub fn friendly_message(&self) -> String {
        match self {
            Self::Unauthorized { service: Service::Plex } => {
                "Plex authentication failed. Check your token in the config.".to_string()
            }
            Self::Unauthorized { service } => {
                format!("{} API key is invalid. Check your key in the config.", service)
            }
            Self::RateLimited { service, .. } => format!(
                "{} rate limit reached. Please wait a moment and try again.",
                service
            ),
            Self::Timeout { .. } => {
                "Connection timed out. The server may be slow or unreachable.".to_string()
            }
            Self::Unreachable { service, .. } => {
                format!("Cannot connect to {}. Is it running?", service)
            }
            Self::NotFound { service, what } => format!("{} has no record for {}.", service, what),
            Self::Interrupted { service, .. } => {
                format!("Connection to {} was interrupted. Try again.", service)
            }
            Self::Http { .. } | Self::InvalidResponse { .. } | Self::CacheWrite { .. } => {
                self.to_string()
            }
        }
    }
}

/// All errors that can occur in reelgap
#[derive(Error, Debug)]
pub enum ReelgapError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{service} is not configured")]
    NotConfigured { service: Service },

    // Scan errors
    #[error("Library source unavailable: {0}")]
    LibraryUnavailable(#[source] SourceError),

    #[error("Metadata source unavailable: {0}")]
    MetadataUnavailable(#[source] SourceError),

    #[error("Library not found: {0}")]
    LibraryNotFound(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    // Cache errors
    #[error("Failed to write cache entry {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode cache entry {path}: {source}")]
    CacheEncode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl ReelgapError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotConfigured { service: Service::Plex } => {
                Some("Set [plex] url and token in the config, then run: reelgap config validate")
            }
            Self::NotConfigured { service: Service::Tmdb } => {
                Some("Get an API key at https://www.themoviedb.org/settings/api")
            }
            Self::NotConfigured { service: Service::Tvdb } => {
                Some("Get an API key at https://thetvdb.com/api-information")
            }
            Self::LibraryUnavailable(_) | Self::MetadataUnavailable(_) => {
                Some("Run: reelgap config validate")
            }
            Self::LibraryNotFound(_) => Some("Run the command without --library to list libraries"),
            Self::ConfigInvalid { .. } => Some("Run: reelgap config init --force"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ReelgapError::LibraryNotFound("Films".to_string());
        assert!(err.to_string().contains("Library not found: Films"));
    }

    #[test]
    fn error_hint() {
        let err = ReelgapError::NotConfigured {
            service: Service::Tmdb,
        };
        assert!(err.hint().unwrap().contains("themoviedb"));
        assert!(ReelgapError::Internal("x".into()).hint().is_none());
    }

    #[test]
    fn source_error_classification() {
        let limited = SourceError::RateLimited {
            service: Service::Tmdb,
            retry_after: Some(Duration::from_secs(3)),
        };
        assert!(limited.is_retryable());
        assert!(!limited.is_fatal());
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(3)));

        let denied = SourceError::Unauthorized {
            service: Service::Tvdb,
        };
        assert!(denied.is_fatal());
        assert!(!denied.is_retryable());

        let missing = SourceError::NotFound {
            service: Service::Tmdb,
            what: "movie 1".into(),
        };
        assert!(!missing.is_fatal());
        assert!(!missing.is_retryable());

        assert!(SourceError::Http {
            service: Service::Plex,
            status: 503
        }
        .is_retryable());
        assert!(!SourceError::Http {
            service: Service::Plex,
            status: 400
        }
        .is_retryable());
    }

    #[test]
    fn dropped_connections_retry_without_aborting() {
        let reset = SourceError::Interrupted {
            service: Service::Tmdb,
            reason: "connection reset by peer".into(),
        };
        assert!(reset.is_retryable());
        assert!(!reset.is_fatal());

        let down = SourceError::Unreachable {
            service: Service::Tmdb,
            reason: "connection refused".into(),
        };
        assert!(down.is_retryable());
        assert!(down.is_fatal());
    }

    #[test]
    fn friendly_messages_name_the_service() {
        let err = SourceError::Unauthorized {
            service: Service::Tmdb,
        };
        assert_eq!(
            err.friendly_message(),
            "TMDB API key is invalid. Check your key in the config."
        );

        let err = SourceError::Unauthorized {
            service: Service::Plex,
        };
        assert!(err.friendly_message().starts_with("Plex authentication failed"));
    }
}
