//! The batch dispatcher.
//!
//! `Crawler` owns the shared pieces of a run (spider, downloader, statistics, activity state)
//! and fans a keyword list out to a bounded pool of workers. Outcomes are collected in the
//! order keywords finish and folded into a single `BatchReport`. Nothing that goes wrong for an
//! individual keyword escapes as an error; only an unavailable keyword source turns the batch
//! report into an error report.

use crate::builder::CrawlerConfig;
use crate::crawler::keyword_task::KeywordCrawler;
use crate::downloader::Downloader;
use crate::keyword::Keyword;
use crate::report::{BatchReport, KeywordReport};
use crate::source::KeywordSource;
use crate::spider::Spider;
use crate::state::CrawlerState;
use crate::stats::StatCollector;
use futures_util::future::join_all;
use kanal::bounded_async;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{debug, error, info, trace};

/// Runs batches of keyword crawls on a bounded worker pool.
pub struct Crawler<S: Spider> {
    spider: Arc<S>,
    downloader: Arc<dyn Downloader>,
    config: CrawlerConfig,
    stats: Arc<StatCollector>,
    state: Arc<CrawlerState>,
}

impl<S: Spider> Crawler<S> {
    pub(crate) fn new(spider: S, downloader: Arc<dyn Downloader>, config: CrawlerConfig) -> Self {
        Crawler {
            spider: Arc::new(spider),
            downloader,
            config,
            stats: Arc::new(StatCollector::new()),
            state: CrawlerState::new(),
        }
    }

    /// Crawls every keyword once and reports the outcomes in completion order.
    ///
    /// An empty keyword list is a valid, trivially completed batch.
    pub async fn run_batch<I, K>(&self, keywords: I) -> BatchReport
    where
        I: IntoIterator<Item = K>,
        K: Into<Keyword>,
    {
        let keywords: Vec<Keyword> = keywords.into_iter().map(Into::into).collect();
        let total = keywords.len();
        self.stats.reset();
        let workers = self.config.concurrency.min(total).max(1);

        info!(
            "Starting image batch: keywords={}, workers={}, per_keyword_timeout={:?}, destination={}",
            total,
            workers,
            self.config.per_keyword_timeout,
            self.config.destination_root.display()
        );
        if total == 0 {
            info!("Keyword list is empty, nothing to crawl");
            return BatchReport::completed(Vec::new());
        }

        let (keyword_tx, keyword_rx) = bounded_async::<Keyword>(self.config.channel_capacity());
        let (outcome_tx, outcome_rx) = bounded_async::<KeywordReport>(total);

        trace!("Spawning keyword feeder task");
        let feeder = {
            let state = Arc::clone(&self.state);
            let stats = Arc::clone(&self.stats);
            tokio::spawn(async move {
                for keyword in keywords {
                    state.pending_keywords.fetch_add(1, Ordering::SeqCst);
                    stats.increment_keywords_enqueued();
                    if keyword_tx.send(keyword).await.is_err() {
                        state.pending_keywords.fetch_sub(1, Ordering::SeqCst);
                        error!("Keyword channel closed before all keywords were dispatched");
                        break;
                    }
                }
            })
        };

        let keyword_crawler = KeywordCrawler::with_shared(
            Arc::clone(&self.spider),
            Arc::clone(&self.downloader),
            Arc::clone(&self.stats),
            Arc::clone(&self.state),
        );
        let worker_handles = super::spawn_keyword_workers(
            keyword_crawler,
            Arc::new(self.config.destination_root.clone()),
            keyword_rx,
            outcome_tx,
            workers,
            self.config.per_keyword_timeout,
            Arc::clone(&self.state),
            Arc::clone(&self.stats),
        );

        let mut outcomes = Vec::with_capacity(total);
        while let Ok(report) = outcome_rx.recv().await {
            debug!(
                "Collected outcome {}/{} for '{}': {}",
                outcomes.len() + 1,
                total,
                report.keyword,
                report.outcome
            );
            outcomes.push(report);
        }

        if let Err(e) = feeder.await {
            error!("Keyword feeder task failed: {}", e);
        }
        for result in join_all(worker_handles).await {
            if let Err(e) = result {
                error!("Keyword worker failed: {}", e);
            }
        }

        info!(
            "Image batch finished: keywords={}, completed={}, failed={}, images_saved={}",
            outcomes.len(),
            outcomes.iter().filter(|r| r.outcome.is_completed()).count(),
            outcomes.iter().filter(|r| !r.outcome.is_completed()).count(),
            outcomes.iter().map(|r| r.outcome.saved()).sum::<usize>()
        );
        debug!("{}", self.stats);

        BatchReport::completed(outcomes)
    }

    /// Loads keywords from `source` and runs them as a batch.
    ///
    /// A source that cannot be read yields an error report without attempting any keyword.
    pub async fn run_source(&self, source: &dyn KeywordSource) -> BatchReport {
        match source.load() {
            Ok(keywords) => self.run_batch(keywords).await,
            Err(e) => {
                error!("Keyword source {} unavailable: {}", source.describe(), e);
                BatchReport::error(e.to_string())
            }
        }
    }

    pub fn destination_root(&self) -> &Path {
        &self.config.destination_root
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Returns a cloned Arc to the `StatCollector` shared by all batches of this crawler.
    pub fn get_stats(&self) -> Arc<StatCollector> {
        Arc::clone(&self.stats)
    }

    pub fn state(&self) -> Arc<CrawlerState> {
        Arc::clone(&self.state)
    }
}
