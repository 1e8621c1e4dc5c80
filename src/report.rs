//! Per-keyword outcomes and the batch report returned to the caller.

use crate::keyword::Keyword;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Reason recorded when a keyword runs past its deadline.
pub const TIMEOUT_REASON: &str = "timeout";

/// Result of crawling one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum KeywordOutcome {
    /// Every candidate was attempted; `saved` of them were written to disk.
    Completed { saved: usize },
    /// The keyword could not be processed at all.
    Failed { reason: String },
}

impl KeywordOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        KeywordOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::failed(TIMEOUT_REASON)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, KeywordOutcome::Completed { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, KeywordOutcome::Failed { reason } if reason == TIMEOUT_REASON)
    }

    /// Images saved, zero for failures.
    pub fn saved(&self) -> usize {
        match self {
            KeywordOutcome::Completed { saved } => *saved,
            KeywordOutcome::Failed { .. } => 0,
        }
    }
}

impl fmt::Display for KeywordOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordOutcome::Completed { saved } => write!(f, "completed ({} saved)", saved),
            KeywordOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Outcome of one keyword, attributed to the keyword that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordReport {
    pub keyword: String,
    pub term: String,
    pub outcome: KeywordOutcome,
    #[serde(serialize_with = "serialize_millis", rename = "elapsed_ms")]
    pub elapsed: Duration,
}

impl KeywordReport {
    pub fn new(keyword: &Keyword, outcome: KeywordOutcome, elapsed: Duration) -> Self {
        Self {
            keyword: keyword.raw.clone(),
            term: keyword.term.clone(),
            outcome,
            elapsed,
        }
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Completed,
    Error,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Completed => f.write_str("completed"),
            BatchStatus::Error => f.write_str("error"),
        }
    }
}

/// Aggregate result of one batch. Outcomes are listed in completion order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    status: BatchStatus,
    message: String,
    outcomes: Vec<KeywordReport>,
}

impl BatchReport {
    pub(crate) fn completed(outcomes: Vec<KeywordReport>) -> Self {
        let finished = outcomes.iter().filter(|r| r.outcome.is_completed()).count();
        let saved: usize = outcomes.iter().map(|r| r.outcome.saved()).sum();
        let message = format!(
            "Image search processed successfully: {} of {} keywords completed, {} images saved",
            finished,
            outcomes.len(),
            saved
        );
        Self {
            status: BatchStatus::Completed,
            message,
            outcomes,
        }
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self {
            status: BatchStatus::Error,
            message: message.into(),
            outcomes: Vec::new(),
        }
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == BatchStatus::Completed
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn outcomes(&self) -> &[KeywordReport] {
        &self.outcomes
    }

    /// Looks up the outcome recorded for a raw keyword. With duplicate keywords the first
    /// finished one is returned.
    pub fn outcome_for(&self, keyword: &str) -> Option<&KeywordOutcome> {
        self.outcomes
            .iter()
            .find(|r| r.keyword == keyword)
            .map(|r| &r.outcome)
    }

    pub fn images_saved(&self) -> usize {
        self.outcomes.iter().map(|r| r.outcome.saved()).sum()
    }
}
