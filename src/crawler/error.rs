//! Errors that change the course of a crawl

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// The landing page could not be loaded; nothing can be downloaded
    #[error("session bootstrap failed: {0}")]
    SessionBootstrap(String),

    /// The portal reported that today's download allowance is used up.
    /// Ends the run without counting as a failure.
    #[error("daily download quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CrawlError {
    pub fn is_quota(&self) -> bool {
        matches!(self, CrawlError::QuotaExceeded { .. })
    }
}
