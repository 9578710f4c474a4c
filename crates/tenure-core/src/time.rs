//! Wall-clock helpers. All timestamps are Unix milliseconds.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// One hour in milliseconds.
pub const HOUR_MS: i64 = 60 * 60 * 1000;

/// One day in milliseconds.
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Current wall-clock time in milliseconds.
///
/// A clock set before the epoch reads as zero.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(duration_to_millis)
        .unwrap_or(0)
}

/// Convert a day count to milliseconds, saturating at the `i64` bounds.
pub fn days_to_millis(days: i64) -> i64 {
    days.saturating_mul(DAY_MS)
}

/// Convert a `Duration` to milliseconds, saturating at `i64::MAX`.
pub fn duration_to_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}
