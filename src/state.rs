//! Live activity gauges for a running crawler.
//!
//! `CrawlerState` tracks how many keywords are being crawled and how many HTTP fetches are in
//! flight at this moment. Unlike `StatCollector`, which only ever grows, these counters go back
//! to zero once a batch drains.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared activity state of the crawler's workers.
#[derive(Debug, Default)]
pub struct CrawlerState {
    /// Keywords handed to the pool but not yet picked up by a worker.
    pub pending_keywords: AtomicUsize,
    /// Keywords currently being crawled.
    pub active_keywords: AtomicUsize,
    /// Search page and image fetches currently awaiting a response.
    pub in_flight_fetches: AtomicUsize,
}

impl CrawlerState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_idle(&self) -> bool {
        self.pending_keywords.load(Ordering::SeqCst) == 0
            && self.active_keywords.load(Ordering::SeqCst) == 0
            && self.in_flight_fetches.load(Ordering::SeqCst) == 0
    }
}

/// Increments a gauge and decrements it again when dropped, including on cancellation.
pub(crate) struct GaugeGuard<'a> {
    gauge: &'a AtomicUsize,
}

impl<'a> GaugeGuard<'a> {
    pub(crate) fn enter(gauge: &'a AtomicUsize) -> Self {
        gauge.fetch_add(1, Ordering::SeqCst);
        Self { gauge }
    }
}

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.gauge.fetch_sub(1, Ordering::SeqCst);
    }
}
