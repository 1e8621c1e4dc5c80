//! # Downloader Module
//!
//! The HTTP seam of the crawler. A `Downloader` performs one GET, follows redirects and hands
//! back the full body. It is used both for search result pages and for every image.
//!
//! Implementations must be safe to call from many keyword tasks at once; the crawler shares a
//! single instance behind an `Arc` and never retries on its behalf.

use crate::error::{FetchError, FetchErrorCause, SpiderError};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Browser-like user agent; image hosts and search providers frequently reject library defaults.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// A fetched body together with the URL it was finally served from.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub final_url: String,
    pub body: Bytes,
}

/// Fetches the body behind a URL.
#[async_trait]
pub trait Downloader: Send + Sync + 'static {
    /// Performs a GET against `url`, following redirects, and returns the final body.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;

    /// Like `fetch`, but also reports the URL after redirects.
    ///
    /// Implementations that cannot observe redirects report `url` itself.
    async fn fetch_resolved(&self, url: &str) -> Result<Fetched, FetchError> {
        let body = self.fetch(url).await?;
        Ok(Fetched {
            final_url: url.to_string(),
            body,
        })
    }
}

/// `Downloader` backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestClientDownloader {
    client: reqwest::Client,
}

impl ReqwestClientDownloader {
    /// Wraps an already configured client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a client with the given user agent, per-request timeout and redirect limit.
    pub fn with_settings(
        user_agent: &str,
        request_timeout: Duration,
        max_redirects: usize,
    ) -> Result<Self, SpiderError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(request_timeout)
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                SpiderError::ConfigurationError(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Default for ReqwestClientDownloader {
    fn default() -> Self {
        Self::with_settings(
            DEFAULT_USER_AGENT,
            DEFAULT_REQUEST_TIMEOUT,
            DEFAULT_MAX_REDIRECTS,
        )
        .unwrap_or_else(|_| Self::new(reqwest::Client::new()))
    }
}

#[async_trait]
impl Downloader for ReqwestClientDownloader {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.fetch_resolved(url).await.map(|fetched| fetched.body)
    }

    async fn fetch_resolved(&self, url: &str) -> Result<Fetched, FetchError> {
        let parsed = Url::parse(url)
            .map_err(|e| FetchError::new(url, FetchErrorCause::InvalidUrl(e.to_string())))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::new(
                url,
                FetchErrorCause::InvalidUrl(format!("unsupported scheme '{}'", parsed.scheme())),
            ));
        }

        trace!("Sending GET {}", parsed);
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!("GET {} ended with status {}", url, status);
            return Err(FetchError::new(url, FetchErrorCause::Status(status.as_u16())));
        }
        let final_url = response.url().to_string();
        if final_url != url {
            trace!("GET {} redirected to {}", url, final_url);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        Ok(Fetched { final_url, body })
    }
}
