//! Blocking HTTP over ureq, bridged onto the async runtime
//!
//! Every request runs on the blocking pool and is wrapped in the
//! client's [`RetryPolicy`]. Transport failures and HTTP statuses are
//! mapped to [`SourceError`] here so the clients above only deal with
//! typed outcomes.

use crate::error::{Service, SourceError};
use crate::sources::retry::RetryPolicy;
use crate::stats::ScanStatistics;
use serde::de::DeserializeOwned;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("reelgap/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
}

/// A request description, cheap to clone for retries
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    url: String,
    /// Endpoint kind for statistics, e.g. `tmdb.movie`
    kind: &'static str,
    /// Subject used in not-found errors and logs
    what: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, kind: &'static str, what: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            kind,
            what: what.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(
        url: impl Into<String>,
        kind: &'static str,
        what: impl Into<String>,
        body: &serde_json::Value,
    ) -> Self {
        Self {
            method: Method::Post,
            body: Some(body.to_string()),
            ..Self::get(url, kind, what)
        }
        .header("Content-Type", "application/json")
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }
}

/// HTTP client for one remote service
#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    service: Service,
    retry: RetryPolicy,
    stats: Arc<ScanStatistics>,
}

impl HttpClient {
    pub fn new(
        service: Service,
        timeout: Duration,
        retry: RetryPolicy,
        stats: Arc<ScanStatistics>,
    ) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            service,
            retry,
            stats,
        }
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn stats(&self) -> &Arc<ScanStatistics> {
        &self.stats
    }

    /// Send a request and return the response body
    pub async fn send(&self, request: HttpRequest) -> Result<String, SourceError> {
        let what = request.what.clone();
        self.retry
            .run(&what, || {
                let agent = self.agent.clone();
                let request = request.clone();
                let service = self.service;
                self.stats.record_api_call(request.kind);
                async move {
                    tokio::task::spawn_blocking(move || execute(&agent, service, &request))
                        .await
                        .map_err(|e| SourceError::Unreachable {
                            service,
                            reason: format!("request task failed: {}", e),
                        })?
                }
            })
            .await
    }

    /// Send a request and decode the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, SourceError> {
        let body = self.send(request).await?;
        decode(self.service, &body)
    }
}

/// Decode a JSON body into `T`
pub fn decode<T: DeserializeOwned>(service: Service, body: &str) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::InvalidResponse {
        service,
        reason: e.to_string(),
    })
}

fn execute(agent: &ureq::Agent, service: Service, request: &HttpRequest) -> Result<String, SourceError> {
    debug!(url = %request.url, kind = request.kind, "HTTP request");

    let result = match request.method {
        Method::Get => {
            let mut builder = agent.get(request.url.as_str()).header("User-Agent", USER_AGENT);
            for (key, value) in &request.query {
                builder = builder.query(key, value);
            }
            for (key, value) in &request.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }
            builder.call()
        }
        Method::Post => {
            let mut builder = agent.post(request.url.as_str()).header("User-Agent", USER_AGENT);
            for (key, value) in &request.query {
                builder = builder.query(key, value);
            }
            for (key, value) in &request.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }
            builder.send(request.body.as_deref().unwrap_or_default().as_bytes())
        }
    };

    let mut response = result.map_err(|e| transport_error(service, e))?;
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);

    check_status(service, status, retry_after, &request.what)?;

    response
        .body_mut()
        .read_to_string()
        .map_err(|e| transport_error(service, e))
}

/// Refused or unresolvable connections mean the service is down; I/O
/// failures on an established connection only lose the current request.
fn transport_error(service: Service, err: ureq::Error) -> SourceError {
    match err {
        ureq::Error::Timeout(_) => SourceError::Timeout { service },
        ureq::Error::StatusCode(status) => SourceError::Http { service, status },
        ureq::Error::Io(e) if !is_refused(&e) => SourceError::Interrupted {
            service,
            reason: e.to_string(),
        },
        ureq::Error::Protocol(_) | ureq::Error::BodyStalled => SourceError::Interrupted {
            service,
            reason: err.to_string(),
        },
        other => SourceError::Unreachable {
            service,
            reason: other.to_string(),
        },
    }
}

fn is_refused(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::NotConnected
    )
}

/// Map an HTTP status to a typed error
pub fn check_status(
    service: Service,
    status: u16,
    retry_after: Option<Duration>,
    what: &str,
) -> Result<(), SourceError> {
    match status {
        200..=299 => Ok(()),
        401 | 403 => Err(SourceError::Unauthorized { service }),
        404 => Err(SourceError::NotFound {
            service,
            what: what.to_string(),
        }),
        429 => Err(SourceError::RateLimited {
            service,
            retry_after,
        }),
        _ => Err(SourceError::Http { service, status }),
    }
}

/// `Retry-After` in delta-seconds form
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
