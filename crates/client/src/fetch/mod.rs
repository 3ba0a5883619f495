//! HTTP fetch pipeline.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `http`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Limits
//! - Redirects followed up to `max_redirects` (default: 10)
//! - Max body bytes: 5MB (configurable)
//! - Whole-request timeout (default: 20s)

pub mod url;

use bytes::Bytes;
use reqwest::Url;
use reqwest::{Client, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, canonicalize};

use hubble_core::{AppConfig, Error};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "hubble/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 10)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "hubble/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 10,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The final URL after redirects
    pub final_url: Url,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes (empty for HEAD)
    pub bytes: Bytes,
}

impl FetchResponse {
    /// Whether the Content-Type header names an HTML document.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/html"))
    }
}

/// HTTP fetch client with redirect, size and time limits.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::FetchTimeout(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Issue a HEAD request, following redirects.
    ///
    /// The status code is not checked: any response carries a final URL and
    /// possibly a Content-Type, which is all a type lookup needs.
    pub async fn head(&self, url_str: &str) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let url = canonicalize(url_str).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let response = self.http.head(url.as_str()).send().await.map_err(map_send_error)?;

        let status = response.status();
        let final_url = response.url().clone();
        let content_type = content_type(response.headers());
        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!("HEAD {} -> {} ({}) in {}ms", url, final_url, status.as_u16(), fetch_ms);

        Ok(FetchResponse { final_url, content_type, bytes: Bytes::new() })
    }

    /// Fetch a URL, returning raw bytes and metadata.
    ///
    /// Non-success statuses and bodies over `max_bytes` are errors.
    pub async fn get(&self, url_str: &str) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let url = canonicalize(url_str).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let response = self
            .http
            .get(url.as_str())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/*;q=0.8,*/*;q=0.5")
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpError(format!("status {}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let content_type = content_type(response.headers());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::HttpError(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", url, final_url, fetch_ms, bytes.len());

        Ok(FetchResponse { final_url, content_type, bytes })
    }
}

fn content_type(headers: &header::HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn map_send_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::FetchTimeout(format!("request timed out: {}", e))
    } else {
        Error::HttpError(format!("network error: {}", e))
    }
}
