//! Split a date range into calendar-month windows.
//!
//! Nationwide downloads are limited to roughly one month per request, so
//! every request covers at most one calendar month.

use crate::crawler::types::{DateRange, MonthWindow};
use chrono::{Datelike, NaiveDate};

/// First day of the month after `date`
fn next_month_start(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    // Day 1 exists in every month
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
}

/// Partition `range` into contiguous month windows.
///
/// e.g. 2025-02-16 ~ 2025-04-10 →
/// [(02-16, 02-28), (03-01, 03-31), (04-01, 04-10)]
pub fn monthly_windows(range: &DateRange) -> Vec<MonthWindow> {
    let mut windows = Vec::new();
    let mut current = range.start();

    loop {
        let next = next_month_start(current);
        let month_end = next.pred_opt().unwrap_or(next);
        let to = month_end.min(range.end());

        windows.push(MonthWindow { from: current, to });

        if to == range.end() {
            break;
        }
        current = next;
    }

    windows
}
