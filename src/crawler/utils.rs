//! Utility functions for common operations

use chrono::{Datelike, Months, NaiveDate};
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};

fn header_str<'a>(headers: &'a HeaderMap, name: reqwest::header::HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Whether the response headers announce a spreadsheet download
pub fn is_spreadsheet(headers: &HeaderMap) -> bool {
    let content_type = header_str(headers, CONTENT_TYPE).to_lowercase();
    let disposition = header_str(headers, CONTENT_DISPOSITION).to_lowercase();

    content_type.contains("spreadsheet")
        || content_type.contains("ms-excel")
        || content_type.contains("octet-stream")
        || content_type.contains("application/vnd")
        || content_type.contains("application/x-")
        || disposition.contains(".xls")
}

/// Content type for log messages
pub fn content_type(headers: &HeaderMap) -> &str {
    header_str(headers, CONTENT_TYPE)
}

/// Human readable size, KB below one megabyte
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    if kb > 1024.0 {
        format!("{:.1} MB", kb / 1024.0)
    } else {
        format!("{:.0} KB", kb)
    }
}

/// Default crawl period: the year ending at `end`, e.g. 2026-02-15 → 2025-02-16
pub fn one_year_before(end: NaiveDate) -> NaiveDate {
    let start = end.checked_sub_months(Months::new(12)).unwrap_or(end);
    start.succ_opt().unwrap_or(start)
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
