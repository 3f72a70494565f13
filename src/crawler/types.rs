//! Core data types for the transaction crawler
//! Pure data structures with little behavior

use crate::crawler::error::CrawlError;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Extension of every file the portal hands out
pub const FILE_EXTENSION: &str = "xlsx";

/// Inclusive date range, start <= end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CrawlError> {
        if start > end {
            return Err(CrawlError::InvalidRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ~ {}", self.start, self.end)
    }
}

/// A date range that lies inside a single calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl MonthWindow {
    /// `yyyymm` of the month this window belongs to
    pub fn year_month(&self) -> String {
        self.from.format("%Y%m").to_string()
    }
}

impl std::fmt::Display for MonthWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ~ {}", self.from, self.to)
    }
}

/// Property types offered by the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyType {
    Apartment,
    RowHouse,
    DetachedHouse,
    Officetel,
    Land,
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        PropertyType::Apartment,
        PropertyType::RowHouse,
        PropertyType::DetachedHouse,
        PropertyType::Officetel,
        PropertyType::Land,
    ];

    /// Code sent as `srhThingNo`
    pub fn code(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "A",
            PropertyType::RowHouse => "B",
            PropertyType::DetachedHouse => "C",
            PropertyType::Officetel => "D",
            PropertyType::Land => "G",
        }
    }

    /// Name used in file names; downstream ingestion matches on it
    pub fn display_name(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "아파트",
            PropertyType::RowHouse => "연립다세대",
            PropertyType::DetachedHouse => "단독다가구",
            PropertyType::Officetel => "오피스텔",
            PropertyType::Land => "토지",
        }
    }

    pub fn supports_rentals(&self) -> bool {
        !matches!(self, PropertyType::Land)
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Sale or rental transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Sale,
    Rental,
}

impl TransactionKind {
    /// Code sent as `srhDelngSecd`
    pub fn code(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "1",
            TransactionKind::Rental => "2",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "매매",
            TransactionKind::Rental => "전월세",
        }
    }

    /// `srhNewRonSecd`: rentals are requested in the new reporting format only
    pub fn new_report_marker(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "",
            TransactionKind::Rental => "1",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Deterministic file name, e.g. `아파트_매매_202503.xlsx`.
///
/// This is both the idempotency key and the ingestion contract.
pub fn file_name(
    property_type: PropertyType,
    kind: TransactionKind,
    window: &MonthWindow,
) -> String {
    format!(
        "{}_{}_{}.{}",
        property_type.display_name(),
        kind.display_name(),
        window.year_month(),
        FILE_EXTENSION
    )
}

/// One schedulable download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub property_type: PropertyType,
    pub kind: TransactionKind,
    pub window: MonthWindow,
    pub destination: PathBuf,
}

impl PlanEntry {
    pub fn file_name(&self) -> String {
        file_name(self.property_type, self.kind, &self.window)
    }
}

/// Result of downloading one plan entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success(u64),
    NoData,
    Failed(String),
}

/// Per-run counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStats {
    pub success: usize,
    pub no_data: usize,
    pub failed: usize,
}

impl CrawlStats {
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Success(_) => self.success += 1,
            DownloadOutcome::NoData => self.no_data += 1,
            DownloadOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.success + self.no_data + self.failed
    }
}

impl std::fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "success: {}, no_data: {}, failed: {}",
            self.success, self.no_data, self.failed
        )
    }
}

/// Orchestrator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Initializing,
    Running,
    Completed,
    QuotaHalted,
}

/// What a finished run reports besides the files it wrote
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub state: CrawlState,
    pub stats: CrawlStats,
    pub already_done: usize,
    /// Entries never attempted because of a quota halt
    pub remaining: usize,
    pub quota_message: Option<String>,
}

impl CrawlReport {
    pub fn quota_halted(&self) -> bool {
        self.state == CrawlState::QuotaHalted
    }

    /// Process exit status: failures make the run degraded, a quota halt alone does not
    pub fn exit_code(&self) -> i32 {
        if self.stats.failed > 0 {
            1
        } else {
            0
        }
    }
}
