//! HTTP fetching

use crate::{extract, FetchConfig, PageRecord, Result};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION,
    UPGRADE_INSECURE_REQUESTS,
};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Desktop Chrome user agent, sent by default so trivial bot filters let us through
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    StatusError { url: String, status: StatusCode },
}

/// Headers a desktop browser sends with a top-level navigation
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}

/// Fetcher for web pages
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    /// Create a new fetcher with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    /// Create a new fetcher with custom configuration
    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(browser_headers())
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .build()
            .map_err(FetchError::from)?;

        Ok(Self { client, config })
    }

    /// The configuration this fetcher was built with
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch a page by URL and extract it
    pub async fn fetch(&self, url: &str) -> Result<PageRecord> {
        let url = Url::parse(url)?;
        info!("Fetching: {}", url);

        let html = self.fetch_html(&url).await?;
        Ok(extract::extract_page(&html, &url))
    }

    /// Fetch the raw HTML of a page. Any non-2xx status is an error.
    pub async fn fetch_html(&self, url: &Url) -> std::result::Result<String, FetchError> {
        debug!("Fetching with HTTP: {}", url);
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned {}", url, status);
            return Err(FetchError::StatusError {
                url: url.to_string(),
                status,
            });
        }

        let html = response.text().await?;
        debug!("Fetched {} bytes from {}", html.len(), url);
        Ok(html)
    }

    /// Extract HTML from a string (no fetching)
    pub fn render_html(&self, html: &str, base_url: Option<&str>) -> Result<PageRecord> {
        let url = Url::parse(base_url.unwrap_or("about:blank"))?;
        Ok(extract::extract_page(html, &url))
    }
}
