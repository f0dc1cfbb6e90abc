//! Datetime index derivation shared by every encoder.
//!
//! The millisecond timestamp becomes a UTC datetime that serves as the row
//! index. Its text form is `YYYY-MM-DD HH:MM:SS`, followed by `.fff` only when
//! the millisecond part is non-zero.

use super::FormatError;
use chrono::{DateTime, NaiveDateTime};

/// Column / key name of the derived index.
pub const INDEX_COLUMN: &str = "datetime";

const LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// UTC datetime for an epoch-millisecond timestamp.
pub fn datetime(timestamp_ms: i64, format: &'static str) -> Result<NaiveDateTime, FormatError> {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| {
            FormatError::serialization(format, format!("timestamp {timestamp_ms} out of range"))
        })
}

/// Text form of the index for a timestamp.
pub fn label(timestamp_ms: i64, format: &'static str) -> Result<String, FormatError> {
    Ok(datetime(timestamp_ms, format)?
        .format(LABEL_FORMAT)
        .to_string())
}

/// Index as epoch nanoseconds, the resolution binary containers store.
pub fn nanos(timestamp_ms: i64, format: &'static str) -> Result<i64, FormatError> {
    timestamp_ms.checked_mul(1_000_000).ok_or_else(|| {
        FormatError::serialization(
            format,
            format!("timestamp {timestamp_ms} does not fit a nanosecond index"),
        )
    })
}
