//! # Statistics Module
//!
//! Collects metrics about a batch while it runs.
//!
//! ## Overview
//!
//! The `StatCollector` is shared by every keyword task of a crawler. Counters are atomics so
//! workers update them without coordination; a consistent `StatsSnapshot` is taken whenever the
//! numbers are rendered.
//!
//! ## Key Metrics Tracked
//!
//! - **Keyword Metrics**: enqueued, completed, failed and timed out keywords
//! - **Search Metrics**: result pages fetched and failed, candidates extracted
//! - **Image Metrics**: images saved and failed, bytes downloaded
//! - **Timing Metrics**: elapsed time and per-keyword durations
//!
//! ## Example
//!
//! ```rust,ignore
//! let crawler = CrawlerBuilder::new(BingImageSpider::default()).build()?;
//! let report = crawler.run_batch(["cats", "dogs"]).await;
//!
//! println!("{}", crawler.get_stats());
//! println!("{}", crawler.get_stats().to_markdown_string());
//! ```

use crate::error::SpiderError;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

// Point-in-time copy of the counters shared by the export and display paths.
struct StatsSnapshot {
    keywords_enqueued: usize,
    keywords_completed: usize,
    keywords_failed: usize,
    keywords_timed_out: usize,
    search_pages_fetched: usize,
    search_pages_failed: usize,
    candidates_extracted: usize,
    images_saved: usize,
    images_failed: usize,
    total_bytes_downloaded: usize,
    slowest_keyword: Option<(String, Duration)>,
    elapsed_duration: Duration,
}

impl StatsSnapshot {
    fn formatted_duration(&self) -> String {
        format!("{:?}", self.elapsed_duration)
    }

    fn images_per_second(&self) -> f64 {
        let total_seconds = self.elapsed_duration.as_secs_f64();
        if total_seconds > 0.0 {
            self.images_saved as f64 / total_seconds
        } else {
            0.0
        }
    }

    fn formatted_bytes(&self) -> String {
        const KB: usize = 1024;
        const MB: usize = 1024 * KB;
        const GB: usize = 1024 * MB;

        if self.total_bytes_downloaded >= GB {
            format!("{:.2} GB", self.total_bytes_downloaded as f64 / GB as f64)
        } else if self.total_bytes_downloaded >= MB {
            format!("{:.2} MB", self.total_bytes_downloaded as f64 / MB as f64)
        } else if self.total_bytes_downloaded >= KB {
            format!("{:.2} KB", self.total_bytes_downloaded as f64 / KB as f64)
        } else {
            format!("{} B", self.total_bytes_downloaded)
        }
    }

    fn formatted_slowest(&self) -> String {
        match &self.slowest_keyword {
            Some((term, duration)) => format!("'{}' in {:?}", term, duration),
            None => "n/a".to_string(),
        }
    }
}

/// Collects and stores statistics about a crawler's most recent batch.
///
/// The collector is reset when a batch starts, so durations and rates never include idle time
/// between batches.
#[derive(Debug, serde::Serialize)]
pub struct StatCollector {
    #[serde(skip)]
    start_time: Mutex<Instant>,

    // Keyword-related metrics
    pub keywords_enqueued: AtomicUsize,
    pub keywords_completed: AtomicUsize,
    pub keywords_failed: AtomicUsize,
    pub keywords_timed_out: AtomicUsize,

    // Search page metrics
    pub search_pages_fetched: AtomicUsize,
    pub search_pages_failed: AtomicUsize,
    pub candidates_extracted: AtomicUsize,

    // Image metrics
    pub images_saved: AtomicUsize,
    pub images_failed: AtomicUsize,
    pub total_bytes_downloaded: AtomicUsize,

    // Timing metrics, keyed by sanitized term
    pub keyword_times: Arc<DashMap<String, Duration>>,
}

impl StatCollector {
    /// Creates a new `StatCollector` with all counters initialized to zero.
    pub(crate) fn new() -> Self {
        StatCollector {
            start_time: Mutex::new(Instant::now()),
            keywords_enqueued: AtomicUsize::new(0),
            keywords_completed: AtomicUsize::new(0),
            keywords_failed: AtomicUsize::new(0),
            keywords_timed_out: AtomicUsize::new(0),
            search_pages_fetched: AtomicUsize::new(0),
            search_pages_failed: AtomicUsize::new(0),
            candidates_extracted: AtomicUsize::new(0),
            images_saved: AtomicUsize::new(0),
            images_failed: AtomicUsize::new(0),
            total_bytes_downloaded: AtomicUsize::new(0),
            keyword_times: Arc::new(DashMap::new()),
        }
    }

    fn snapshot(&self) -> StatsSnapshot {
        let slowest_keyword = self
            .keyword_times
            .iter()
            .max_by_key(|entry| *entry.value())
            .map(|entry| (entry.key().clone(), *entry.value()));

        StatsSnapshot {
            keywords_enqueued: self.keywords_enqueued.load(Ordering::SeqCst),
            keywords_completed: self.keywords_completed.load(Ordering::SeqCst),
            keywords_failed: self.keywords_failed.load(Ordering::SeqCst),
            keywords_timed_out: self.keywords_timed_out.load(Ordering::SeqCst),
            search_pages_fetched: self.search_pages_fetched.load(Ordering::SeqCst),
            search_pages_failed: self.search_pages_failed.load(Ordering::SeqCst),
            candidates_extracted: self.candidates_extracted.load(Ordering::SeqCst),
            images_saved: self.images_saved.load(Ordering::SeqCst),
            images_failed: self.images_failed.load(Ordering::SeqCst),
            total_bytes_downloaded: self.total_bytes_downloaded.load(Ordering::SeqCst),
            slowest_keyword,
            elapsed_duration: self.start_time.lock().elapsed(),
        }
    }

    /// When the current batch started.
    pub fn start_time(&self) -> Instant {
        *self.start_time.lock()
    }

    /// Zeroes every counter and restarts the clock.
    pub(crate) fn reset(&self) {
        for counter in [
            &self.keywords_enqueued,
            &self.keywords_completed,
            &self.keywords_failed,
            &self.keywords_timed_out,
            &self.search_pages_fetched,
            &self.search_pages_failed,
            &self.candidates_extracted,
            &self.images_saved,
            &self.images_failed,
            &self.total_bytes_downloaded,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
        self.keyword_times.clear();
        *self.start_time.lock() = Instant::now();
    }

    pub(crate) fn increment_keywords_enqueued(&self) {
        self.keywords_enqueued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_keywords_completed(&self) {
        self.keywords_completed.fetch_add(1, Ordering::SeqCst);
    }

    /// Timeouts count as failures too.
    pub(crate) fn increment_keywords_failed(&self, timed_out: bool) {
        self.keywords_failed.fetch_add(1, Ordering::SeqCst);
        if timed_out {
            self.keywords_timed_out.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn increment_search_pages_fetched(&self) {
        self.search_pages_fetched.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_search_pages_failed(&self) {
        self.search_pages_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn add_candidates_extracted(&self, count: usize) {
        self.candidates_extracted.fetch_add(count, Ordering::SeqCst);
    }

    pub(crate) fn increment_images_saved(&self) {
        self.images_saved.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_images_failed(&self) {
        self.images_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn add_bytes_downloaded(&self, bytes: usize) {
        self.total_bytes_downloaded
            .fetch_add(bytes, Ordering::SeqCst);
    }

    pub(crate) fn record_keyword_time(&self, term: &str, duration: Duration) {
        self.keyword_times.insert(term.to_string(), duration);
    }

    pub fn to_json_string(&self) -> Result<String, SpiderError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String, SpiderError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Exports the current statistics to a Markdown formatted string.
    pub fn to_markdown_string(&self) -> String {
        let snapshot = self.snapshot();

        format!(
            r#"# Image Crawl Statistics Report

- **Duration**: {}
- **Average Speed**: {:.2} images/s
- **Slowest Keyword**: {}

## Keywords
| Metric     | Count |
|------------|-------|
| Enqueued   | {}     |
| Completed  | {}     |
| Failed     | {}     |
| Timed Out  | {}     |

## Search Pages
| Metric     | Count |
|------------|-------|
| Fetched    | {}     |
| Failed     | {}     |
| Candidates | {}     |

## Images
| Metric     | Count |
|------------|-------|
| Saved      | {}     |
| Failed     | {}     |
| Downloaded | {}     |
"#,
            snapshot.formatted_duration(),
            snapshot.images_per_second(),
            snapshot.formatted_slowest(),
            snapshot.keywords_enqueued,
            snapshot.keywords_completed,
            snapshot.keywords_failed,
            snapshot.keywords_timed_out,
            snapshot.search_pages_fetched,
            snapshot.search_pages_failed,
            snapshot.candidates_extracted,
            snapshot.images_saved,
            snapshot.images_failed,
            snapshot.formatted_bytes(),
        )
    }
}

impl Default for StatCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StatCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();

        writeln!(f, "\nImage Crawl Statistics")?;
        writeln!(f, "----------------------")?;
        writeln!(f, "  duration : {}", snapshot.formatted_duration())?;
        writeln!(f, "  speed    : images/s: {:.2}", snapshot.images_per_second())?;
        writeln!(
            f,
            "  keywords : enqueued: {}, ok: {}, fail: {}, timeout: {}",
            snapshot.keywords_enqueued,
            snapshot.keywords_completed,
            snapshot.keywords_failed,
            snapshot.keywords_timed_out
        )?;
        writeln!(
            f,
            "  search   : fetched: {}, fail: {}, candidates: {}",
            snapshot.search_pages_fetched,
            snapshot.search_pages_failed,
            snapshot.candidates_extracted
        )?;
        writeln!(
            f,
            "  images   : saved: {}, fail: {}, downloaded: {}",
            snapshot.images_saved,
            snapshot.images_failed,
            snapshot.formatted_bytes()
        )?;
        writeln!(f, "  slowest  : {}\n", snapshot.formatted_slowest())
    }
}
