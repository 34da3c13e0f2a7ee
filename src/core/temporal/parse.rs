//! Date value parsing and normalization.

use super::Normalization;
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};
use serde_json::Value;

const WITH_OFFSET: [&str; 2] = ["%Y:%m:%d %H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
const WITHOUT_OFFSET: [&str; 2] = ["%Y:%m:%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A parsed value, before normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    Naive(NaiveDateTime),
    Offset(DateTime<FixedOffset>),
}

/// Parse one tag value.
///
/// Accepts `:` or `-` date separators, an optional fraction and an
/// optional numeric offset. A trailing `Z` means UTC. Date-only values and
/// anything else return `None`.
pub fn parse_date_value(value: &str) -> Option<ParsedDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let value = match value.strip_suffix('Z') {
        Some(rest) => format!("{}+00:00", rest),
        None => value.to_string(),
    };

    for pattern in WITH_OFFSET {
        if let Ok(dt) = DateTime::parse_from_str(&value, pattern) {
            return Some(ParsedDate::Offset(dt));
        }
    }
    for pattern in WITHOUT_OFFSET {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&value, pattern) {
            return Some(ParsedDate::Naive(dt));
        }
    }
    None
}

/// Wall-clock datetime under `mode`. Naive values are never adjusted.
pub fn normalize(parsed: ParsedDate, mode: Normalization) -> NaiveDateTime {
    match parsed {
        ParsedDate::Naive(dt) => dt,
        ParsedDate::Offset(dt) => match mode {
            Normalization::None => dt.naive_local(),
            Normalization::Local => dt.with_timezone(&Local).naive_local(),
            Normalization::Utc => dt.naive_utc(),
        },
    }
}

/// String forms of a tag value; lists are flattened one level
pub(crate) fn string_values(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        other => vec![other.to_string()],
    }
}
