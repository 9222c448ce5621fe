//! Time helpers
//!
//! All persisted timestamps are Unix milliseconds (UTC).

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

/// Current Unix timestamp in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}

/// First instant of the month containing `at_millis`
pub fn month_start_millis(at_millis: i64) -> i64 {
    let at = to_datetime(at_millis);
    Utc.with_ymd_and_hms(at.year(), at.month(), 1, 0, 0, 0)
        .single()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// First instant of the month `offset` months before the one containing
/// `at_millis`; `offset = 0` is the current month.
pub fn month_start_offset_millis(at_millis: i64, offset: u32) -> i64 {
    let at = to_datetime(at_millis);
    let mut year = at.year();
    let mut month = at.month() as i32 - offset as i32;
    while month < 1 {
        month += 12;
        year -= 1;
    }
    Utc.with_ymd_and_hms(year, month as u32, 1, 0, 0, 0)
        .single()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// Short label for the month containing `millis`, e.g. "Jan 2026"
pub fn month_label(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%b %Y").to_string())
        .unwrap_or_default()
}

/// Millisecond length of an analytics range keyword (`7d`, `30d`, `90d`, `1y`)
///
/// Unknown keywords fall back to 30 days, matching the admin dashboard default.
pub fn range_millis(range: &str) -> i64 {
    let duration = match range {
        "7d" => Duration::days(7),
        "90d" => Duration::days(90),
        "1y" => Duration::days(365),
        _ => Duration::days(30),
    };
    duration.num_milliseconds()
}
