//! Replication value handling
//!
//! Replication keys are timestamps in practice, but the API does not promise
//! a single format, so values that are not RFC 3339 compare as plain strings.

use crate::types::{JsonValue, Record};
use chrono::{DateTime, SecondsFormat, Utc};
use std::cmp::Ordering;

/// Replication value of a record as a string
///
/// Missing, null and structured values yield `None`.
pub fn replication_value(record: &Record, key: &str) -> Option<String> {
    match record.get(key)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Order two replication values
pub fn compare_values(a: &str, b: &str) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

/// The later of a bookmark and the configured start date
pub fn starting_point(bookmark: Option<&str>, start_date: Option<DateTime<Utc>>) -> Option<String> {
    let start_date = start_date.map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true));
    match (bookmark, start_date) {
        (Some(bookmark), Some(start)) => {
            if compare_values(bookmark, &start) == Ordering::Less {
                Some(start)
            } else {
                Some(bookmark.to_string())
            }
        }
        (Some(bookmark), None) => Some(bookmark.to_string()),
        (None, start) => start,
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
