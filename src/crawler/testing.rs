//! In-memory fixtures for crawler unit tests.

use crate::downloader::{Downloader, Fetched};
use crate::error::{FetchError, FetchErrorCause};
use crate::spider::{BingImageSpider, Spider};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub(crate) const SEARCH_BASE: &str = "http://search.test/images/search";

pub(crate) fn test_spider() -> BingImageSpider {
    BingImageSpider::with_base_url(Url::parse(SEARCH_BASE).unwrap())
}

/// Results page whose tiles point at `urls`, escaped the way the provider escapes them.
pub(crate) fn page_with(urls: &[&str]) -> String {
    let tiles: String = urls
        .iter()
        .map(|url| {
            format!(
                r#"<a class="iusc" m='{{"cid":"x","murl":"{}","turl":"t"}}'>img</a>"#,
                url.replace('/', "\\/")
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", tiles)
}

/// Serves canned bodies; unknown URLs fail with a 404.
#[derive(Default)]
pub(crate) struct FakeDownloader {
    bodies: HashMap<String, Bytes>,
    delays: HashMap<String, Duration>,
    redirects: HashMap<String, String>,
    requested: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl FakeDownloader {
    pub(crate) fn with_page(mut self, term: &str, html: &str) -> Self {
        let url = test_spider().search_url(term).to_string();
        self.bodies.insert(url, Bytes::from(html.to_string()));
        self
    }

    pub(crate) fn with_page_delay(mut self, term: &str, delay: Duration) -> Self {
        let url = test_spider().search_url(term).to_string();
        self.delays.insert(url, delay);
        self
    }

    pub(crate) fn with_body(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies
            .insert(url.to_string(), Bytes::copy_from_slice(body));
        self
    }

    pub(crate) fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// Answers `from` with whatever `to` serves, reporting `to` as the final URL.
    pub(crate) fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    pub(crate) fn requested(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requested)
    }

    /// High-water mark of fetches running at the same time.
    pub(crate) fn peak_in_flight(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.peak_in_flight)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.fetch_resolved(url).await.map(|fetched| fetched.body)
    }

    async fn fetch_resolved(&self, url: &str) -> Result<Fetched, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        let final_url = self.redirects.get(url).map_or(url, String::as_str);
        self.bodies
            .get(final_url)
            .cloned()
            .map(|body| Fetched {
                final_url: final_url.to_string(),
                body,
            })
            .ok_or_else(|| FetchError::new(url, FetchErrorCause::Status(404)))
    }
}
