//! # spider-images
//!
//! Keyword-driven image crawler. For every keyword the crawler queries an image search
//! provider, extracts the direct image URLs from the results page and downloads each image
//! into a destination folder, running many keywords concurrently on a bounded worker pool.
//!
//! Failures are isolated: a broken image link only skips that image, a failed or slow keyword
//! only fails that keyword, and a batch always ends with a `BatchReport`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use spider_images::{BingImageSpider, CrawlerBuilder, CsvKeywordSource};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), spider_images::SpiderError> {
//!     let crawler = CrawlerBuilder::new(BingImageSpider::default())
//!         .destination_root("downloaded_images")
//!         .concurrency(5)
//!         .per_keyword_timeout(Duration::from_secs(60))
//!         .build()?;
//!
//!     let source = CsvKeywordSource::new("keywords.csv").reversed(true);
//!     let report = crawler.run_source(&source).await;
//!     println!("{}: {}", report.status(), report.message());
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod crawler;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod keyword;
pub mod prelude;
pub mod report;
pub mod source;
pub mod spider;
pub mod state;
pub mod stats;

pub use builder::{CrawlerBuilder, CrawlerConfig};
pub use crawler::{Crawler, KeywordCrawler};
pub use downloader::{Downloader, Fetched, ReqwestClientDownloader};
pub use error::{FetchError, FetchErrorCause, SpiderError};
pub use extractor::{ImageCandidate, extract};
pub use keyword::{Keyword, sanitize};
pub use report::{BatchReport, BatchStatus, KeywordOutcome, KeywordReport};
pub use source::{CsvKeywordSource, KeywordSource, StaticKeywordSource};
pub use spider::{BingImageSpider, Spider};
pub use state::CrawlerState;
pub use stats::StatCollector;

pub use async_trait::async_trait;
pub use tokio;
