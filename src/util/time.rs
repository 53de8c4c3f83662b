//! Time and date parsing utilities.

use crate::error::{Result, TrackerError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parse a client-supplied timestamp into a `DateTime<Utc>`.
///
/// Supports:
/// - RFC3339: `2025-01-15T12:00:00Z`, `2025-01-15T12:00:00+02:00`
/// - Simple date: `2025-01-15` (midnight UTC, as date pickers send it)
///
/// # Errors
///
/// Returns a validation error naming `field_name` if the format is not recognized.
pub fn parse_timestamp(s: &str, field_name: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
    }

    Err(TrackerError::validation(
        field_name,
        "invalid date format (use RFC 3339 or YYYY-MM-DD)",
    ))
}

/// Parse a timestamp read back from the database.
///
/// Values are written as RFC3339; SQLite's `datetime()` form is accepted for
/// rows edited by hand.
///
/// # Errors
///
/// Returns a conversion error so the failing column surfaces in the row mapper.
pub fn parse_stored_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(rfc_err) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(|_| rfc_err),
    }
}

/// Format a timestamp for storage.
///
/// Fixed-width nanoseconds keep full precision and make text order match time order.
#[must_use]
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
}
