//! Conversion of untyped habit API payloads into [`RawHabit`] values.
//!
//! Field presence is never trusted: unknown enum values fall back to their
//! defaults, malformed progress entries are dropped, and records without an
//! id are rejected because nothing could address them afterwards.

use crate::errors::ApiError;
use crate::models::{Category, Frequency, RawHabit, RawProgressEntry};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::warn;

/// Strips the `{ "data": ... }` envelope some endpoints wrap responses in.
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// A body that is not a list is an error, never an empty collection.
pub fn parse_habit_list(value: Value) -> Result<Vec<RawHabit>, ApiError> {
    match unwrap_data(value) {
        Value::Array(items) => Ok(items.iter().filter_map(parse_habit).collect()),
        other => {
            let kind = value_kind(&other);
            warn!(kind, "habit list payload is not an array");
            Err(ApiError::Decode(format!("expected a habit list, got {kind}")))
        }
    }
}

pub fn parse_habit(value: &Value) -> Option<RawHabit> {
    let object = value.as_object()?;
    let id = ["_id", "id"]
        .iter()
        .find_map(|key| object.get(*key).and_then(id_string));
    let Some(id) = id else {
        warn!("skipping habit record without an id");
        return None;
    };

    let progress = object
        .get("progress")
        .or_else(|| object.get("progressEntries"));
    let progress_entries = match progress {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let entry = parse_entry(item);
                if entry.is_none() {
                    warn!(habit_id = %id, "skipping malformed progress entry");
                }
                entry
            })
            .collect(),
        _ => Vec::new(),
    };

    Some(RawHabit {
        name: string_field(value, "name"),
        description: string_field(value, "description"),
        goal_count: object
            .get("goal")
            .or_else(|| object.get("meta"))
            .and_then(positive_count),
        category: object
            .get("category")
            .and_then(Value::as_str)
            .map(Category::parse_lenient)
            .unwrap_or_default(),
        frequency: object
            .get("frequency")
            .and_then(Value::as_str)
            .map(Frequency::parse_lenient)
            .unwrap_or_default(),
        progress_entries,
        created_at: object
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(parse_timestamp),
        id,
    })
}

/// Entries without a `completed` flag count as completions; the service only
/// appends entries when a habit is marked done.
fn parse_entry(value: &Value) -> Option<RawProgressEntry> {
    match value {
        Value::String(date) => Some(RawProgressEntry {
            date: parse_timestamp(date)?,
            completed: true,
        }),
        Value::Object(object) => Some(RawProgressEntry {
            date: parse_timestamp(object.get("date")?.as_str()?)?,
            completed: object
                .get("completed")
                .and_then(Value::as_bool)
                .unwrap_or(true),
        }),
        _ => None,
    }
}

/// Accepts RFC 3339 instants, naive date-times (read as UTC) and bare
/// `YYYY-MM-DD` dates (UTC midnight).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn positive_count(value: &Value) -> Option<u32> {
    let count = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    u32::try_from(count).ok().filter(|count| *count > 0)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
