//! Timestamp parsing and canonical formatting.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::validation::ValidationError;

/// Fixed-width UTC format; lexical order equals chronological order.
const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Naive layouts accepted as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one interpreted as UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidTimestamp(input.to_string()))
}

/// Render a timestamp in the stored canonical form.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(CANONICAL_FORMAT).to_string()
}

/// Canonicalize a caller-supplied timestamp, or stamp the current time.
pub fn canonical_timestamp(input: Option<&str>) -> Result<String, ValidationError> {
    match input {
        Some(raw) => parse_timestamp(raw).map(|dt| format_timestamp(&dt)),
        None => Ok(format_timestamp(&Utc::now())),
    }
}
