//! Timestamp encoding for TEXT columns.
//!
//! Every timestamp is written as RFC 3339 UTC with a fixed microsecond
//! precision and a `Z` suffix, so lexicographic comparison in SQL matches
//! chronological order.

use chrono::{DateTime, SecondsFormat, Utc};

use super::DatabaseError;

pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(
    table: &'static str,
    column: &'static str,
    s: &str,
) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DatabaseError::InvalidColumn {
            table,
            column,
            value: s.to_string(),
        })
}

pub fn parse_optional_timestamp(
    table: &'static str,
    column: &'static str,
    s: Option<&str>,
) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    s.map(|s| parse_timestamp(table, column, s)).transpose()
}
