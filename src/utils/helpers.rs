//! Helper functions and utilities
//!
//! Date formatting and parsing shared by the HTTP layer and the stats client.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use crate::utils::errors::{EventHubError, Result};

/// Wire format for all timestamps
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp in wire format
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(DATE_TIME_FORMAT).to_string()
}

/// Parse a timestamp given as `yyyy-MM-dd HH:mm:ss` or ISO-8601.
///
/// Values without an offset are interpreted as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FORMAT) {
        return Ok(naive.and_utc());
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }

    Err(EventHubError::validation(format!(
        "Invalid date format. Expected: yyyy-MM-dd HH:mm:ss or ISO format. Value: {}",
        value
    )))
}

/// Parse an optional timestamp, treating blank strings as absent
pub fn parse_optional_timestamp(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) if !raw.trim().is_empty() => parse_timestamp(raw).map(Some),
        _ => Ok(None),
    }
}

/// Current instant truncated to whole seconds
pub fn now_seconds() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Serde adapter for `DateTime<Utc>` in wire format
pub mod date_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<DateTime<Utc>>` in wire format
pub mod optional_date_format {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(timestamp) => serializer.serialize_str(&super::format_timestamp(*timestamp)),
            None => serializer.serialize_none(),
        }
    }
}
