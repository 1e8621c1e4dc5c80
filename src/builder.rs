//! # Builder Module
//!
//! Provides the `CrawlerBuilder`, a fluent API for configuring and constructing a `Crawler`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use spider_images::{BingImageSpider, CrawlerBuilder};
//! use std::time::Duration;
//!
//! async fn crawl() -> Result<(), SpiderError> {
//!     let crawler = CrawlerBuilder::new(BingImageSpider::default())
//!         .destination_root("overwatch_images")
//!         .concurrency(5)
//!         .per_keyword_timeout(Duration::from_secs(60))
//!         .build()?;
//!
//!     let report = crawler.run_batch(["Overwatch", "Valorant"]).await;
//!     println!("{}", report.message());
//!     Ok(())
//! }
//! ```

use crate::crawler::Crawler;
use crate::downloader::{
    DEFAULT_MAX_REDIRECTS, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT, Downloader,
    ReqwestClientDownloader,
};
use crate::error::SpiderError;
use crate::spider::Spider;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_DESTINATION_ROOT: &str = "downloaded_images";
pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_PER_KEYWORD_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings of a crawler.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Folder every image is written to.
    pub destination_root: PathBuf,
    /// Number of keywords crawled at the same time.
    pub concurrency: usize,
    /// Upper bound on the whole crawl of one keyword.
    pub per_keyword_timeout: Duration,
    /// Upper bound on a single HTTP request of the default downloader.
    pub request_timeout: Duration,
    /// User agent of the default downloader.
    pub user_agent: String,
    /// Redirect hops the default downloader follows.
    pub max_redirects: usize,
    /// Capacity of the keyword channel; `0` picks twice the concurrency.
    pub channel_capacity: usize,
}

impl CrawlerConfig {
    pub(crate) fn channel_capacity(&self) -> usize {
        if self.channel_capacity == 0 {
            self.concurrency * 2
        } else {
            self.channel_capacity
        }
    }

    fn validate(&self) -> Result<(), SpiderError> {
        if self.concurrency == 0 {
            return Err(SpiderError::ConfigurationError(
                "concurrency must be greater than 0.".to_string(),
            ));
        }
        if self.per_keyword_timeout.is_zero() {
            return Err(SpiderError::ConfigurationError(
                "per_keyword_timeout must be greater than 0.".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(SpiderError::ConfigurationError(
                "request_timeout must be greater than 0.".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        CrawlerConfig {
            destination_root: PathBuf::from(DEFAULT_DESTINATION_ROOT),
            concurrency: DEFAULT_CONCURRENCY,
            per_keyword_timeout: DEFAULT_PER_KEYWORD_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            channel_capacity: 0,
        }
    }
}

pub struct CrawlerBuilder<S: Spider> {
    crawler_config: CrawlerConfig,
    downloader: Option<Arc<dyn Downloader>>,
    spider: Option<S>,
}

impl<S: Spider> CrawlerBuilder<S> {
    /// Creates a new `CrawlerBuilder` for a given spider. Unless another downloader is set, a
    /// `ReqwestClientDownloader` is built from the configuration.
    pub fn new(spider: S) -> Self {
        Self {
            crawler_config: CrawlerConfig::default(),
            downloader: None,
            spider: Some(spider),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: CrawlerConfig) -> Self {
        self.crawler_config = config;
        self
    }

    pub fn destination_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.crawler_config.destination_root = path.into();
        self
    }

    /// Sets the number of keywords crawled concurrently.
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.crawler_config.concurrency = limit;
        self
    }

    pub fn per_keyword_timeout(mut self, timeout: Duration) -> Self {
        self.crawler_config.per_keyword_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.crawler_config.request_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.crawler_config.user_agent = user_agent.into();
        self
    }

    pub fn max_redirects(mut self, hops: usize) -> Self {
        self.crawler_config.max_redirects = hops;
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.crawler_config.channel_capacity = capacity;
        self
    }

    /// Sets a custom downloader. Request timeout, user agent and redirect settings only apply
    /// to the default downloader.
    pub fn downloader<D: Downloader>(mut self, downloader: D) -> Self {
        self.downloader = Some(Arc::new(downloader));
        self
    }

    /// Validates the configuration and builds the `Crawler`.
    pub fn build(mut self) -> Result<Crawler<S>, SpiderError> {
        self.crawler_config.validate()?;
        let spider = self.spider.take().ok_or_else(|| {
            SpiderError::ConfigurationError("Crawler must have a spider.".to_string())
        })?;

        let downloader = match self.downloader.take() {
            Some(downloader) => downloader,
            None => {
                debug!(
                    "Building default downloader: request_timeout={:?}, max_redirects={}",
                    self.crawler_config.request_timeout, self.crawler_config.max_redirects
                );
                Arc::new(ReqwestClientDownloader::with_settings(
                    &self.crawler_config.user_agent,
                    self.crawler_config.request_timeout,
                    self.crawler_config.max_redirects,
                )?) as Arc<dyn Downloader>
            }
        };

        Ok(Crawler::new(spider, downloader, self.crawler_config))
    }
}
