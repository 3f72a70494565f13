//! Fetch functions - download one monthly spreadsheet and classify the answer

use crate::crawler::config::PortalConfig;
use crate::crawler::error::CrawlError;
use crate::crawler::retry::{FailureKind, RetryStep};
use crate::crawler::session::PortalSession;
use crate::crawler::types::{DownloadOutcome, PlanEntry};
use crate::crawler::utils::{content_type, format_size, is_spreadsheet};
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{info, warn};

/// Form fields for the download endpoint. Only type, kind, dates and the
/// rental marker vary; the rest select "nationwide, no filters".
pub fn build_form(entry: &PlanEntry) -> Vec<(&'static str, String)> {
    let date = |d: chrono::NaiveDate| d.format("%Y-%m-%d").to_string();

    vec![
        ("srhThingNo", entry.property_type.code().to_string()),
        ("srhDelngSecd", entry.kind.code().to_string()),
        ("srhAddrGbn", "1".to_string()),
        ("srhLfstsSecd", "1".to_string()),
        ("srhFromDt", date(entry.window.from)),
        ("srhToDt", date(entry.window.to)),
        ("srhSidoCd", String::new()),
        ("srhSggCd", String::new()),
        ("srhEmdCd", String::new()),
        ("srhHsmpCd", String::new()),
        ("srhArea", String::new()),
        ("srhLrArea", String::new()),
        ("srhFromAmount", String::new()),
        ("srhToAmount", String::new()),
        ("srhNewRonSecd", entry.kind.new_report_marker().to_string()),
        ("srhRoadNm", String::new()),
        ("srhLoadCd", String::new()),
        ("mobileAt", String::new()),
        ("sidoNm", "전체".to_string()),
        ("sggNm", "전체".to_string()),
        ("emdNm", "전체".to_string()),
        ("loadNm", "전체".to_string()),
        ("areaNm", "전체".to_string()),
        ("hsmpNm", "전체".to_string()),
    ]
}

/// What a single HTTP answer means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Spreadsheet(Bytes),
    NoData,
    QuotaExceeded(String),
    Retryable(FailureKind),
}

/// Classify one portal response.
///
/// Checked in order: status, spreadsheet headers (tiny payloads are "no
/// data"), then the JSON error envelope `{"error": ..., "cnt": ...}`.
pub fn classify_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: Bytes,
    config: &PortalConfig,
) -> Classified {
    if !status.is_success() {
        return Classified::Retryable(FailureKind::Http(status.as_u16()));
    }

    if is_spreadsheet(headers) {
        // Same threshold the scanner uses, so a saved file is never fetched again
        if (body.len() as u64) <= config.min_file_bytes {
            return Classified::NoData;
        }
        return Classified::Spreadsheet(body);
    }

    let envelope: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => {
            return Classified::Retryable(FailureKind::Unrecognized(format!(
                "content-type {:?}",
                content_type(headers)
            )))
        }
    };

    let error = envelope
        .get("error")
        .and_then(|e| e.as_str())
        .unwrap_or_default();

    if !config.quota_marker.is_empty() && error.contains(config.quota_marker.as_str()) {
        return Classified::QuotaExceeded(error.to_string());
    }

    if is_zero_count(envelope.get("cnt")) {
        return Classified::NoData;
    }

    Classified::Retryable(FailureKind::Unrecognized(if error.is_empty() {
        envelope.to_string()
    } else {
        error.to_string()
    }))
}

/// `cnt` arrives as a number or as a numeric string
fn is_zero_count(cnt: Option<&serde_json::Value>) -> bool {
    match cnt {
        Some(serde_json::Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(serde_json::Value::String(s)) => s.trim() == "0",
        _ => false,
    }
}

enum Attempt {
    Done(DownloadOutcome),
    Failed(FailureKind),
}

/// Issues download requests over a shared session, retrying transient failures
pub struct Downloader<'a> {
    session: &'a PortalSession,
    config: &'a PortalConfig,
    /// Upper bound on download POSTs, retries included
    request_cap: Option<u32>,
    issued: AtomicU32,
}

impl<'a> Downloader<'a> {
    pub fn new(session: &'a PortalSession, config: &'a PortalConfig) -> Self {
        Downloader {
            session,
            config,
            request_cap: None,
            issued: AtomicU32::new(0),
        }
    }

    pub fn with_request_cap(mut self, cap: Option<u32>) -> Self {
        self.request_cap = cap;
        self
    }

    /// Download POSTs sent so far
    pub fn requests_issued(&self) -> u32 {
        self.issued.load(Ordering::Relaxed)
    }

    /// Download one plan entry.
    ///
    /// Transient failures are retried and end as `Failed`. A quota response,
    /// or reaching the request cap, is returned as `QuotaExceeded`.
    pub async fn download(&self, entry: &PlanEntry) -> Result<DownloadOutcome, CrawlError> {
        let form = build_form(entry);
        let policy = &self.config.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let failure = match self.attempt(entry, &form).await? {
                Attempt::Done(outcome) => return Ok(outcome),
                Attempt::Failed(failure) => failure,
            };

            match policy.next_step(attempt, &failure) {
                RetryStep::GiveUp => {
                    warn!("    {} - giving up after {} attempts", failure, attempt);
                    return Ok(DownloadOutcome::Failed(failure.to_string()));
                }
                RetryStep::Retry { delay, refresh_session } => {
                    warn!("    {} (retry {}/{})", failure, attempt, policy.max_attempts);
                    if refresh_session {
                        self.session.refresh().await;
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt(
        &self,
        entry: &PlanEntry,
        form: &[(&'static str, String)],
    ) -> Result<Attempt, CrawlError> {
        if let Some(cap) = self.request_cap {
            if self.requests_issued() >= cap {
                return Err(CrawlError::QuotaExceeded {
                    message: format!("configured daily request cap of {} reached", cap),
                });
            }
        }
        self.issued.fetch_add(1, Ordering::Relaxed);

        let response = match self.session.post_download(form).await {
            Ok(r) => r,
            Err(e) => return Ok(Attempt::Failed(transport_failure(&e))),
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => return Ok(Attempt::Failed(transport_failure(&e))),
        };

        match classify_response(status, &headers, body, self.config) {
            Classified::Spreadsheet(bytes) => match persist(&entry.destination, &bytes).await {
                Ok(()) => {
                    info!("    saved ({})", format_size(bytes.len() as u64));
                    Ok(Attempt::Done(DownloadOutcome::Success(bytes.len() as u64)))
                }
                Err(e) => Ok(Attempt::Failed(FailureKind::Io(e.to_string()))),
            },
            Classified::NoData => {
                info!("    no data");
                Ok(Attempt::Done(DownloadOutcome::NoData))
            }
            Classified::QuotaExceeded(message) => Err(CrawlError::QuotaExceeded { message }),
            Classified::Retryable(failure) => Ok(Attempt::Failed(failure)),
        }
    }
}

fn transport_failure(e: &reqwest::Error) -> FailureKind {
    if e.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Transport(e.to_string())
    }
}

/// Write via a `.part` file and rename so a file is either complete or absent
async fn persist(path: &Path, bytes: &[u8]) -> Result<(), CrawlError> {
    let io_err = |source| CrawlError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let mut part = path.as_os_str().to_owned();
    part.push(".part");

    let written = match tokio::fs::write(&part, bytes).await {
        Ok(()) => tokio::fs::rename(&part, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        // Best effort; a leftover `.part` is ignored by the scanner anyway
        let _ = tokio::fs::remove_file(&part).await;
        return Err(io_err(e));
    }
    Ok(())
}
