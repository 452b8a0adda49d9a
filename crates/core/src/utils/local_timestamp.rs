//! Local wall-clock timestamps as stored on queued punches.
//!
//! Format: `YYYY-MM-DD HH:MM:SS`, every component zero-padded, no timezone.
//!
//! Example: "2026-10-16 08:03:09"

use chrono::{Datelike, NaiveDateTime};

/// `strftime` pattern for punch timestamps.
pub const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors that can occur when reading the calendar month out of a timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// No `YYYY-MM` prefix could be found
    MissingDate(String),
    /// Year is not a number
    InvalidYear(String),
    /// Month is not a number in 1..=12
    InvalidMonth(String),
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimestampError::MissingDate(s) => write!(f, "Timestamp has no date part: '{}'", s),
            TimestampError::InvalidYear(s) => write!(f, "Invalid year in timestamp: '{}'", s),
            TimestampError::InvalidMonth(s) => write!(f, "Invalid month in timestamp: '{}'", s),
        }
    }
}

impl std::error::Error for TimestampError {}

/// Format a local date-time the way queued punches store it.
pub fn format_local_timestamp(at: &NaiveDateTime) -> String {
    at.format(LOCAL_TIMESTAMP_FORMAT).to_string()
}

/// Extract `(year, month)` from the date part of a stored timestamp.
///
/// Only the leading `YYYY-MM` is inspected, so a timestamp with a malformed
/// time part still yields its month.
pub fn parse_year_month(timestamp: &str) -> Result<(i32, u32), TimestampError> {
    let trimmed = timestamp.trim();
    let date_part = trimmed
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .filter(|part| !part.is_empty())
        .ok_or_else(|| TimestampError::MissingDate(timestamp.to_string()))?;

    let mut fields = date_part.split('-');
    let year_str = fields.next().unwrap_or_default();
    let month_str = fields
        .next()
        .ok_or_else(|| TimestampError::MissingDate(timestamp.to_string()))?;

    let year = year_str
        .parse::<i32>()
        .map_err(|_| TimestampError::InvalidYear(year_str.to_string()))?;
    let month = month_str
        .parse::<u32>()
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| TimestampError::InvalidMonth(month_str.to_string()))?;

    Ok((year, month))
}

/// True when `timestamp` falls in the same calendar month as `now`.
///
/// Timestamps that cannot be read count as matching.
pub fn in_same_month(timestamp: &str, now: &NaiveDateTime) -> bool {
    match parse_year_month(timestamp) {
        Ok((year, month)) => year == now.year() && month == now.month(),
        Err(_) => true,
    }
}
