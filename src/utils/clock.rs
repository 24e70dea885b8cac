use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use std::ops::RangeInclusive;

/// Wall-clock formats accepted in addition to RFC 3339.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Years a MySQL `DATETIME` column can hold.
const SUPPORTED_YEARS: RangeInclusive<i32> = 1000..=9999;

/// Parse a scan timestamp into wall-clock time at `offset`.
///
/// Timestamps carrying their own offset (RFC 3339) are converted; naive
/// timestamps are taken to already be in `offset`.
pub fn parse_scan_timestamp(raw: &str, offset: &FixedOffset) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(offset).naive_local());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Whether shift arithmetic around `at` stays within storable dates.
pub fn in_supported_range(at: &NaiveDateTime) -> bool {
    SUPPORTED_YEARS.contains(&at.year())
}

/// Current calendar date at `offset`.
pub fn today(offset: &FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(offset).date_naive()
}
