//! Crawl of a single keyword.
//!
//! `KeywordCrawler::run` performs the whole sequence for one keyword: build the search URL,
//! fetch the results page, extract candidates, then fetch and save each image in extraction
//! order. Failures of individual images are logged and skipped; only a failed results page (or an
//! unusable destination) fails the keyword. The sequence as a whole is bounded by a deadline.

use crate::downloader::Downloader;
use crate::error::FetchError;
use crate::extractor::ImageCandidate;
use crate::keyword::Keyword;
use crate::report::KeywordOutcome;
use crate::spider::Spider;
use crate::state::{CrawlerState, GaugeGuard};
use crate::stats::StatCollector;
use bytes::Bytes;
use log::{debug, trace, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
enum KeywordError {
    #[error("search page unavailable: {0}")]
    SearchPage(#[from] FetchError),
    #[error("cannot create destination {}: {source}", .path.display())]
    Destination {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
enum CandidateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Runs the search-and-download sequence for individual keywords.
pub struct KeywordCrawler<S: Spider> {
    spider: Arc<S>,
    downloader: Arc<dyn Downloader>,
    stats: Arc<StatCollector>,
    state: Arc<CrawlerState>,
}

impl<S: Spider> Clone for KeywordCrawler<S> {
    fn clone(&self) -> Self {
        Self {
            spider: Arc::clone(&self.spider),
            downloader: Arc::clone(&self.downloader),
            stats: Arc::clone(&self.stats),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: Spider> KeywordCrawler<S> {
    /// Creates a crawler with its own statistics and state.
    pub fn new(spider: Arc<S>, downloader: Arc<dyn Downloader>) -> Self {
        Self::with_shared(
            spider,
            downloader,
            Arc::new(StatCollector::new()),
            CrawlerState::new(),
        )
    }

    pub(crate) fn with_shared(
        spider: Arc<S>,
        downloader: Arc<dyn Downloader>,
        stats: Arc<StatCollector>,
        state: Arc<CrawlerState>,
    ) -> Self {
        Self {
            spider,
            downloader,
            stats,
            state,
        }
    }

    pub fn stats(&self) -> Arc<StatCollector> {
        Arc::clone(&self.stats)
    }

    /// Crawls `keyword` into `destination`, giving up at `deadline`.
    ///
    /// Never fails: every problem is folded into the returned outcome. When the deadline passes,
    /// the in-flight fetch is dropped and files already written stay on disk.
    pub async fn run(
        &self,
        keyword: &Keyword,
        destination: &Path,
        deadline: Instant,
    ) -> KeywordOutcome {
        let _active = GaugeGuard::enter(&self.state.active_keywords);

        match tokio::time::timeout_at(deadline, self.crawl(keyword, destination)).await {
            Ok(Ok(saved)) => {
                debug!("Keyword '{}' completed with {} images saved", keyword.term, saved);
                KeywordOutcome::Completed { saved }
            }
            Ok(Err(e)) => {
                warn!("Keyword '{}' failed: {}", keyword.raw, e);
                KeywordOutcome::failed(e.to_string())
            }
            Err(_) => {
                warn!("Keyword '{}' exceeded its deadline", keyword.raw);
                KeywordOutcome::timeout()
            }
        }
    }

    async fn crawl(&self, keyword: &Keyword, destination: &Path) -> Result<usize, KeywordError> {
        let search_url = self.spider.search_url(&keyword.term);
        debug!(
            "[{}] Fetching search page for '{}': {}",
            self.spider.name(),
            keyword.term,
            search_url
        );
        let page = match self.fetch(search_url.as_str()).await {
            Ok(page) => {
                self.stats.increment_search_pages_fetched();
                page
            }
            Err(e) => {
                self.stats.increment_search_pages_failed();
                return Err(e.into());
            }
        };

        let candidates = self.spider.parse(&String::from_utf8_lossy(&page));
        drop(page);
        self.stats.add_candidates_extracted(candidates.len());
        debug!(
            "Extracted {} image candidates for '{}'",
            candidates.len(),
            keyword.term
        );

        tokio::fs::create_dir_all(destination)
            .await
            .map_err(|source| KeywordError::Destination {
                path: destination.to_path_buf(),
                source,
            })?;

        let mut saved = 0;
        for candidate in &candidates {
            match self.save_candidate(&keyword.term, candidate, destination).await {
                Ok(path) => {
                    trace!("Saved candidate {} to {}", candidate.index, path.display());
                    self.stats.increment_images_saved();
                    saved += 1;
                }
                Err(e) => {
                    warn!(
                        "Skipping candidate {} of '{}': {}",
                        candidate.index, keyword.term, e
                    );
                    self.stats.increment_images_failed();
                }
            }
        }

        Ok(saved)
    }

    async fn save_candidate(
        &self,
        term: &str,
        candidate: &ImageCandidate,
        destination: &Path,
    ) -> Result<PathBuf, CandidateError> {
        let fetched = {
            let _in_flight = GaugeGuard::enter(&self.state.in_flight_fetches);
            self.downloader.fetch_resolved(&candidate.url).await?
        };
        let path = destination.join(candidate.file_name_served_from(term, &fetched.final_url));
        tokio::fs::write(&path, &fetched.body)
            .await
            .map_err(|source| CandidateError::Write {
                path: path.clone(),
                source,
            })?;
        self.stats.add_bytes_downloaded(fetched.body.len());
        Ok(path)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let _in_flight = GaugeGuard::enter(&self.state.in_flight_fetches);
        self.downloader.fetch(url).await
    }
}
