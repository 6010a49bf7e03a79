//! HTTP fetcher implementation
//!
//! This module handles every HTTP request the harvester makes:
//! - Building the HTTP client with the configured user agent and timeout
//! - Bounding in-flight requests with a shared semaphore
//! - Classifying each response as a body or an empty outcome
//!
//! No request made through here can fail the caller. Transport errors and
//! non-200 statuses become [`FetchOutcome::Empty`] with the reason attached.

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Result of a single GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 with its body (which may itself be empty)
    Body(String),

    /// No usable response
    Empty(EmptyReason),
}

/// Why a fetch produced no body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// HTTP 404
    NotFound,

    /// Any other non-200 status
    Status(u16),

    /// The request exceeded the per-request timeout
    Timeout,

    /// Connection refused or DNS failure
    Connect(String),

    /// Connection reset, broken body, or any other transport failure
    Transport(String),

    /// The entity had nothing to fetch (no id or no web URL)
    MissingUrl,

    /// The limiter was closed before a slot was granted
    Aborted(String),
}

impl FetchOutcome {
    /// Returns the body if the fetch succeeded
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Body(body) => Some(body),
            Self::Empty(_) => None,
        }
    }

    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Body(body) => Some(body),
            Self::Empty(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "404 not found"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Timeout => write!(f, "request timeout"),
            Self::Connect(e) => write!(f, "connection failed: {}", e),
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::MissingUrl => write!(f, "no url to fetch"),
            Self::Aborted(e) => write!(f, "aborted: {}", e),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Crawler settings carrying the per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// A bounded GET client shared by every batch of a harvest
///
/// Cloning is cheap and clones share both the connection pool and the
/// concurrency limit, so spawned tasks can each hold their own handle.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    limiter: Arc<Semaphore>,
}

impl Fetcher {
    /// Wraps `client` with a limit of `concurrency` in-flight requests
    pub fn new(client: Client, concurrency: usize) -> Self {
        Self {
            client,
            limiter: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Builds the client from configuration and wraps it
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, crawler)?;
        Ok(Self::new(client, crawler.concurrency as usize))
    }

    /// Number of requests that could start right now
    pub fn available_slots(&self) -> usize {
        self.limiter.available_permits()
    }

    /// Fetches `url`, holding one limiter slot for the whole request
    ///
    /// # Response Classification
    ///
    /// | Condition | Outcome | Log level |
    /// |-----------|---------|-----------|
    /// | HTTP 200 | `Body` | - |
    /// | HTTP 404 | `Empty(NotFound)` | warn |
    /// | Other status | `Empty(Status)` | warn |
    /// | Timeout | `Empty(Timeout)` | error |
    /// | Connection refused | `Empty(Connect)` | error |
    /// | Reset / body error | `Empty(Transport)` | error |
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        // The permit is released when it drops, on every return path
        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(e) => return FetchOutcome::Empty(EmptyReason::Aborted(e.to_string())),
        };

        tracing::trace!("GET {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = classify_error(&e);
                tracing::error!("{} for {}", reason, url);
                return FetchOutcome::Empty(reason);
            }
        };

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::warn!("404 code: {}", url);
            return FetchOutcome::Empty(EmptyReason::NotFound);
        }

        if status != StatusCode::OK {
            tracing::warn!("Unavailable url: {} - {} code", url, status.as_u16());
            return FetchOutcome::Empty(EmptyReason::Status(status.as_u16()));
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Body(body),
            Err(e) => {
                let reason = classify_error(&e);
                tracing::error!("Failed to read body of {}: {}", url, reason);
                FetchOutcome::Empty(reason)
            }
        }
    }
}

/// Maps a reqwest error onto an empty reason
fn classify_error(error: &reqwest::Error) -> EmptyReason {
    if error.is_timeout() {
        EmptyReason::Timeout
    } else if error.is_connect() {
        EmptyReason::Connect(error.to_string())
    } else {
        EmptyReason::Transport(error.to_string())
    }
}
