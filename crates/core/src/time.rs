//! Timestamp conversions between the storage representation (epoch
//! milliseconds) and the domain/wire representation (RFC 3339 strings).
//!
//! Conversions are lossless to millisecond precision.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Current wall-clock time as an RFC 3339 string with millisecond precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert epoch milliseconds to an RFC 3339 string.
pub fn epoch_millis_to_rfc3339(millis: i64) -> Option<String> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parse an RFC 3339 string into epoch milliseconds.
pub fn rfc3339_to_epoch_millis(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}
