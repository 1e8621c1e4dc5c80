//! # Keyword Worker Pool
//!
//! Spawns the fixed set of workers that drain the keyword channel.
//!
//! ## Architecture
//!
//! Every worker pulls the next keyword from a shared bounded channel, crawls it to the end and
//! only then pulls again, so at most `workers` keywords are in progress at any time. Each crawl
//! runs in its own task: a panic inside it, or a crawl that outlives its deadline, is turned into
//! a `Failed` outcome for that keyword alone and the worker carries on. Exactly one
//! `KeywordReport` is sent per keyword received.

use crate::crawler::keyword_task::KeywordCrawler;
use crate::keyword::Keyword;
use crate::report::{KeywordOutcome, KeywordReport};
use crate::spider::Spider;
use crate::state::CrawlerState;
use crate::stats::StatCollector;
use kanal::{AsyncReceiver, AsyncSender};
use log::{debug, error, info, trace};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[allow(clippy::too_many_arguments)]
pub(crate) fn spawn_keyword_workers<S>(
    crawler: KeywordCrawler<S>,
    destination: Arc<PathBuf>,
    keyword_rx: AsyncReceiver<Keyword>,
    outcome_tx: AsyncSender<KeywordReport>,
    workers: usize,
    per_keyword_timeout: Duration,
    state: Arc<CrawlerState>,
    stats: Arc<StatCollector>,
) -> Vec<JoinHandle<()>>
where
    S: Spider,
{
    trace!("Spawning {} keyword workers", workers);

    (0..workers)
        .map(|worker_id| {
            let crawler = crawler.clone();
            let destination = Arc::clone(&destination);
            let keyword_rx = keyword_rx.clone();
            let outcome_tx = outcome_tx.clone();
            let state = Arc::clone(&state);
            let stats = Arc::clone(&stats);

            tokio::spawn(async move {
                while let Ok(keyword) = keyword_rx.recv().await {
                    state.pending_keywords.fetch_sub(1, Ordering::SeqCst);
                    debug!("Worker {} picked up keyword '{}'", worker_id, keyword.raw);

                    let started = Instant::now();
                    let outcome = crawl_with_deadline(
                        crawler.clone(),
                        keyword.clone(),
                        Arc::clone(&destination),
                        started + per_keyword_timeout,
                    )
                    .await;
                    let elapsed = started.elapsed();

                    match &outcome {
                        KeywordOutcome::Completed { saved } => {
                            info!(
                                "Scraping completed for query: '{}' ({} images in {:?})",
                                keyword.term, saved, elapsed
                            );
                            stats.increment_keywords_completed();
                        }
                        KeywordOutcome::Failed { reason } => {
                            error!("Error processing topic '{}': {}", keyword.raw, reason);
                            stats.increment_keywords_failed(outcome.is_timeout());
                        }
                    }
                    stats.record_keyword_time(&keyword.term, elapsed);

                    let report = KeywordReport::new(&keyword, outcome, elapsed);
                    if outcome_tx.send(report).await.is_err() {
                        error!("Outcome channel closed, dropping report for '{}'", keyword.raw);
                    }
                }
                trace!("Worker {} finished, keyword channel drained", worker_id);
            })
        })
        .collect()
}

async fn crawl_with_deadline<S: Spider>(
    crawler: KeywordCrawler<S>,
    keyword: Keyword,
    destination: Arc<PathBuf>,
    deadline: Instant,
) -> KeywordOutcome {
    let mut task =
        tokio::spawn(async move { crawler.run(&keyword, &destination, deadline).await });

    match tokio::time::timeout_at(deadline, &mut task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => {
            error!("Crawl task failed: {}", join_error);
            KeywordOutcome::failed(format!("crawl task panicked: {}", join_error))
        }
        Err(_) => {
            task.abort();
            KeywordOutcome::timeout()
        }
    }
}
