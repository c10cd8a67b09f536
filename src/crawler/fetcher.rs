//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients that route through the configured forward proxy
//! - Opening one session (connection pool) per chunk
//! - GET requests to fetch page content
//! - Error classification

use crate::config::Config;
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::{Client, Proxy};
use std::time::Duration;
use thiserror::Error;

/// A successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// The URL as it appeared in the input list
    pub url: String,

    /// HTTP status code of the final response
    pub status: u16,

    /// Page body, exactly as decoded by the transport
    pub body: String,
}

/// Classified failure of a single fetch
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Network, proxy or protocol failure, or a non-success status
    #[error("transport error [{}]: {message}", display_status(.status))]
    Transport {
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Error description
        message: String,
    },

    /// Anything else (body decoding, resource exhaustion, ...)
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "-".to_string(),
    }
}

impl FetchError {
    /// Classifies a reqwest error
    ///
    /// Body decoding problems are unexpected; everything else the client
    /// reports (connect, timeout, redirect, status, proxy) is transport.
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return FetchError::Unexpected(format!("failed to decode body: {}", error));
        }

        let message = if error.is_timeout() {
            format!("request timeout: {}", error)
        } else if error.is_connect() {
            format!("connection failed: {}", error)
        } else {
            error.to_string()
        };

        FetchError::Transport {
            status: error.status().map(|s| s.as_u16()),
            message,
        }
    }

    /// HTTP status attached to the failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Transport { status, .. } => *status,
            FetchError::Unexpected(_) => None,
        }
    }

    /// Whether another attempt could plausibly succeed
    ///
    /// Client errors other than 408 and 429 are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { status: None, .. } => true,
            FetchError::Transport {
                status: Some(code), ..
            } => *code >= 500 || *code == 408 || *code == 429,
            FetchError::Unexpected(_) => false,
        }
    }
}

/// A shared HTTP context scoped to one chunk
///
/// All pages of a chunk are fetched concurrently through the same session,
/// so implementations must tolerate concurrent `get` calls.
#[async_trait]
pub trait Session: Send + Sync {
    /// Issues one GET for `url`, logging the status of a successful response
    async fn get(&self, url: &str) -> Result<FetchResult, FetchError>;
}

/// Opens sessions, one per chunk
pub trait Connector: Send + Sync {
    type Session: Session;

    /// Creates a fresh session; dropping it releases pooled connections
    fn open_session(&self) -> Result<Self::Session, HarvestError>;
}

/// Fetches a single page through `session`
///
/// Sessions log the status and URL of every successful response as soon as
/// the status is known, before the body is read.
///
/// # Returns
///
/// * `Ok(FetchResult)` - The page was fetched with a success status
/// * `Err(FetchError)` - The fetch failed; the caller decides how to report it
pub async fn fetch_page<S>(session: &S, url: &str) -> Result<FetchResult, FetchError>
where
    S: Session + ?Sized,
{
    session.get(url).await
}

/// Settings for the real HTTP transport
#[derive(Clone)]
pub struct HttpConnector {
    proxy_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: String,
}

impl HttpConnector {
    /// Creates a connector routing through `proxy_url` (if any)
    pub fn new(proxy_url: Option<String>, timeout: Option<Duration>) -> Self {
        Self {
            proxy_url,
            timeout,
            user_agent: format!("page-harvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Creates a connector from the crawler and proxy sections of a config
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.proxy.url.clone(),
            config.crawler.request_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Whether requests are routed through a proxy
    pub fn uses_proxy(&self) -> bool {
        self.proxy_url.is_some()
    }
}

impl Connector for HttpConnector {
    type Session = HttpSession;

    fn open_session(&self) -> Result<HttpSession, HarvestError> {
        let client = build_http_client(self.proxy_url.as_deref(), self.timeout, &self.user_agent)?;
        Ok(HttpSession { client })
    }
}

/// Builds an HTTP client with proper configuration
///
/// Credentials embedded in `proxy_url` are sent as proxy basic auth.
/// Without a proxy, environment proxy variables are ignored so that every
/// request goes exactly where the configuration says.
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Invalid proxy URL or TLS backend failure
pub fn build_http_client(
    proxy_url: Option<&str>,
    timeout: Option<Duration>,
    user_agent: &str,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(user_agent)
        .gzip(true)
        .brotli(true);

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder = match proxy_url {
        Some(proxy) => builder.proxy(Proxy::all(proxy)?),
        None => builder.no_proxy(),
    };

    builder.build()
}

/// Session backed by a pooled reqwest client
pub struct HttpSession {
    client: Client,
}

#[async_trait]
impl Session for HttpSession {
    async fn get(&self, url: &str) -> Result<FetchResult, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?
            .error_for_status()
            .map_err(FetchError::from_reqwest)?;

        let status = response.status().as_u16();
        tracing::info!("Got response [{}] for URL: {}", status, url);

        let body = response.text().await.map_err(FetchError::from_reqwest)?;

        Ok(FetchResult {
            url: url.to_string(),
            status,
            body,
        })
    }
}
