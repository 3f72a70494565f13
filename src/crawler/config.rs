//! Crawler configuration loaded from environment variables

use crate::crawler::retry::RetryPolicy;
use crate::crawler::types::TransactionKind;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://rt.molit.go.kr";
pub const LANDING_PATH: &str = "/pt/xls/xls.do?mobileAt=";
pub const DOWNLOAD_PATH: &str = "/pt/xls/ptXlsExcelDown.do";

pub const SALE_DIR_NAME: &str = "실거래가_매매";
pub const RENTAL_DIR_NAME: &str = "실거래가_전월세";

/// Substring of the portal's error message when the daily allowance is spent
pub const DEFAULT_QUOTA_MARKER: &str = "다운로드 횟수";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Where downloaded files go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLayout {
    /// Separate trees for sales and rentals
    Split { sale: PathBuf, rental: PathBuf },
    /// Everything in one override directory
    Single(PathBuf),
}

impl OutputLayout {
    pub fn under(base: &Path) -> Self {
        OutputLayout::Split {
            sale: base.join(SALE_DIR_NAME),
            rental: base.join(RENTAL_DIR_NAME),
        }
    }

    pub fn dir_for(&self, kind: TransactionKind) -> &Path {
        match (self, kind) {
            (OutputLayout::Single(dir), _) => dir,
            (OutputLayout::Split { sale, .. }, TransactionKind::Sale) => sale,
            (OutputLayout::Split { rental, .. }, TransactionKind::Rental) => rental,
        }
    }

    /// Directories to scan for finished files
    pub fn dirs(&self) -> Vec<&Path> {
        match self {
            OutputLayout::Single(dir) => vec![dir.as_path()],
            OutputLayout::Split { sale, rental } => vec![sale.as_path(), rental.as_path()],
        }
    }
}

/// Everything the session and downloader need to talk to the portal
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Payloads at or below this size are treated as "no data"
    pub min_file_bytes: u64,
    pub quota_marker: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        PortalConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            // Nationwide exports can take well over a minute
            request_timeout: Duration::from_secs(180),
            retry: RetryPolicy::default(),
            min_file_bytes: 100,
            quota_marker: DEFAULT_QUOTA_MARKER.to_string(),
        }
    }
}

impl PortalConfig {
    pub fn landing_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), LANDING_PATH)
    }

    pub fn download_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), DOWNLOAD_PATH)
    }
}

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub portal: PortalConfig,
    pub output: OutputLayout,
    /// Pause between two downloads
    pub delay: Duration,
    /// Stop after this many download requests in one run, retries included.
    /// The portal's real cap and its reset time are not published, so this
    /// is opt-in.
    pub daily_request_cap: Option<u32>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        CrawlerConfig {
            portal: PortalConfig::default(),
            output: OutputLayout::under(Path::new("public_data")),
            delay: Duration::from_secs(3),
            daily_request_cap: None,
        }
    }
}

impl CrawlerConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = CrawlerConfig::default();
        let mut portal = defaults.portal;

        if let Ok(url) = env::var("PORTAL_BASE_URL") {
            portal.base_url = url;
        }
        if let Some(secs) = parse_var::<u64>("REQUEST_TIMEOUT_SECS")? {
            portal.request_timeout = Duration::from_secs(secs);
        }
        if let Some(max) = parse_var::<u32>("MAX_RETRIES")? {
            portal.retry.max_attempts = max.max(1);
        }
        if let Some(bytes) = parse_var::<u64>("MIN_FILE_BYTES")? {
            portal.min_file_bytes = bytes;
        }
        if let Ok(marker) = env::var("QUOTA_MARKER") {
            portal.quota_marker = marker;
        }

        let output = match env::var("PUBLIC_DATA_DIR") {
            Ok(dir) => OutputLayout::under(Path::new(&dir)),
            Err(_) => defaults.output,
        };

        let delay = match parse_var::<f64>("CRAWL_DELAY_SECS")? {
            Some(secs) => delay_from_secs(secs)?,
            None => defaults.delay,
        };

        Ok(CrawlerConfig {
            portal,
            output,
            delay,
            daily_request_cap: parse_var::<u32>("DAILY_REQUEST_CAP")?,
        })
    }
}

/// Convert a user-supplied delay in seconds
pub fn delay_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("delay must be a non-negative number of seconds, got {}", secs))
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a valid number", name)),
        Err(_) => Ok(None),
    }
}
