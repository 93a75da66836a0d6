//! Document fetching for soft navigations.
//!
//! ### Request
//! - GET with `Accept: text/html, application/xhtml+xml`
//! - Cookies kept per origin by the client's cookie store
//! - One bounded timeout for the whole exchange (default: 8s)
//!
//! ### Failure classes
//! - Non-success status: `Error::Network`
//! - DNS/TLS/connection failures, body read errors, timeout: `Error::Transport`
//!
//! Successful bodies are parsed and sanitized before being returned.

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use page_loader_core::{Document, Error, LoaderConfig, dom::sanitize};
use reqwest::{Client, header};

pub use self::url::{UrlError, canonicalize, resolve};

const ACCEPT_HTML: &str = "text/html, application/xhtml+xml";

/// Retrieves destination documents.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch, parse and sanitize the document at `location`.
    async fn fetch(&self, location: &::url::Url) -> Result<Document, Error>;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "page-loader/0.1")
    pub user_agent: String,

    /// Request timeout (default: 8s)
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "page-loader/0.1".to_string(), timeout: Duration::from_millis(8000) }
    }
}

impl From<&LoaderConfig> for FetchConfig {
    fn from(config: &LoaderConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.fetch_timeout() }
    }
}

/// reqwest-backed [`Fetcher`].
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .cookie_store(true)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn transport_error(&self, err: &reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Transport(format!("timed out after {}ms", self.config.timeout.as_millis()))
        } else {
            Error::Transport(format!("network error: {}", err))
        }
    }
}

impl HttpFetcher {
    /// Load `location` as a whole page, the way the address bar does.
    ///
    /// Unlike [`Fetcher::fetch`], an error status is not a failure: the
    /// server's error page becomes the new page.
    pub async fn load_page(&self, location: &::url::Url) -> Result<Document, Error> {
        self.get(location, true).await
    }

    async fn get(&self, location: &::url::Url, accept_error_status: bool) -> Result<Document, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(location.as_str())
            .header(header::ACCEPT, ACCEPT_HTML)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() && !accept_error_status {
            return Err(Error::Network { location: location.to_string(), status: status.as_u16() });
        }

        let body = response.text().await.map_err(|e| self.transport_error(&e))?;
        let document = sanitize(Document::parse(&body));

        tracing::debug!(
            "fetched {} ({}) in {}ms ({} bytes)",
            location,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(document)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, location: &::url::Url) -> Result<Document, Error> {
        self.get(location, false).await
    }
}
