//! Error types shared across the crate.
//!
//! `SpiderError` covers everything that can stop a crawler from being built or a batch from
//! being started. `FetchError` is what a `Downloader` reports for a single URL; it is always
//! recoverable from the batch's point of view and never escalates past the keyword that
//! produced it.

use std::fmt;
use thiserror::Error;

/// Crate-level error.
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("keyword source unavailable: {0}")]
    InputUnavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    GeneralError(String),
}

/// Why a single fetch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorCause {
    /// The URL could not be parsed or has a scheme the client cannot speak.
    InvalidUrl(String),
    /// Connection, TLS, redirect or body read failure.
    Network(String),
    /// The final response after redirects was not 2xx.
    Status(u16),
    /// The request did not finish within its deadline.
    Timeout,
}

impl fmt::Display for FetchErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorCause::InvalidUrl(msg) => write!(f, "invalid url: {}", msg),
            FetchErrorCause::Network(msg) => write!(f, "network error: {}", msg),
            FetchErrorCause::Status(code) => write!(f, "unexpected status {}", code),
            FetchErrorCause::Timeout => write!(f, "timed out"),
        }
    }
}

/// A failed fetch of one URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchErrorCause,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: FetchErrorCause) -> Self {
        Self {
            url: url.into(),
            cause,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, FetchErrorCause::Timeout)
    }

    /// Builds a `FetchError` from a reqwest failure, classifying timeouts and bad statuses.
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let cause = if err.is_timeout() {
            FetchErrorCause::Timeout
        } else if let Some(status) = err.status() {
            FetchErrorCause::Status(status.as_u16())
        } else if err.is_builder() {
            FetchErrorCause::InvalidUrl(err.to_string())
        } else {
            FetchErrorCause::Network(err.to_string())
        };
        Self::new(url, cause)
    }
}
