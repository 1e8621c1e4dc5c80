//! # Spider Module
//!
//! Defines the `Spider` trait, the search-provider seam of the crawler.
//!
//! ## Overview
//!
//! A spider knows two things about its provider: where the image search for a term lives, and
//! how to pull candidate image URLs out of the page that comes back. Everything else (fetching,
//! timeouts, persistence, concurrency) belongs to the crawler, so a spider stays a plain,
//! synchronous value that can be shared between workers.
//!
//! ## Example
//!
//! ```rust,ignore
//! use spider_images::{BingImageSpider, Spider};
//!
//! let spider = BingImageSpider::default();
//! let url = spider.search_url("Overwatch");
//! assert_eq!(url.as_str(), "https://www.bing.com/images/search?q=Overwatch");
//! ```

use crate::extractor::{self, ImageCandidate};
use url::Url;

pub const BING_IMAGE_SEARCH: &str = "https://www.bing.com/images/search";

/// Defines the contract for an image search provider.
pub trait Spider: Send + Sync + 'static {
    /// Short provider name used in logs.
    fn name(&self) -> &str;

    /// Endpoint the search term is appended to.
    fn base_url(&self) -> &Url;

    /// Builds the results page URL for an already sanitized term.
    fn search_url(&self, term: &str) -> Url {
        let mut url = self.base_url().clone();
        url.query_pairs_mut().append_pair("q", term);
        url
    }

    /// Extracts image candidates from a results page, in page order.
    fn parse(&self, page_body: &str) -> Vec<ImageCandidate>;
}

/// Spider for Bing image search.
#[derive(Debug, Clone)]
pub struct BingImageSpider {
    base_url: Url,
}

impl BingImageSpider {
    /// Points the spider at a different endpoint, e.g. a local mirror or a test server.
    pub fn with_base_url(base_url: Url) -> Self {
        Self { base_url }
    }
}

impl Default for BingImageSpider {
    fn default() -> Self {
        Self {
            base_url: Url::parse(BING_IMAGE_SEARCH).expect("static search URL must parse"),
        }
    }
}

impl Spider for BingImageSpider {
    fn name(&self) -> &str {
        "bing_image_spider"
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn parse(&self, page_body: &str) -> Vec<ImageCandidate> {
        extractor::extract(page_body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_term() {
        let spider = BingImageSpider::default();
        assert_eq!(
            spider.search_url("Overwatch").as_str(),
            "https://www.bing.com/images/search?q=Overwatch"
        );
        assert_eq!(
            spider.search_url("Valornt 2").as_str(),
            "https://www.bing.com/images/search?q=Valornt+2"
        );
    }

    #[test]
    fn custom_base_url_is_respected() {
        let base = Url::parse("http://127.0.0.1:8080/images/search").unwrap();
        let spider = BingImageSpider::with_base_url(base);
        let url = spider.search_url("cats");
        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(url.query(), Some("q=cats"));
    }
}
