//! A "prelude" for users of the `spider-images` crate.
//!
//! Re-exports the types needed to configure a crawler, run a batch and implement a custom
//! spider or downloader.
//!
//! # Example
//!
//! ```
//! use spider_images::prelude::*;
//! ```

pub use crate::{
    // Core structs
    BatchReport,
    BingImageSpider,
    Crawler,
    CrawlerBuilder,
    CsvKeywordSource,
    Fetched,
    KeywordOutcome,
    // Core traits
    Downloader,
    KeywordSource,
    Spider,
    // Errors
    FetchError,
    SpiderError,
    // Essential re-export for trait implementation
    async_trait,
};
