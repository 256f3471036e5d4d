//! Channel analytics snapshots and history-period filtering.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Field of a channel entry holding its analytics history.
pub const ANALYTICS_FIELD: &str = "analytics";

/// One point-in-time reading of a channel's public statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub name: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub subscribers: u64,
    pub timestamp: Timestamp,
}

/// Longest accepted history window, in days.
pub const MAX_WINDOW_DAYS: i64 = 100 * 365;

/// History window requested by `GET /api/analytics/{userId}?period=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    All,
    Window(Duration),
}

impl Period {
    /// Parse `all`, `<n>h`, `<n>d` or `<n>w` (n >= 1, at most [`MAX_WINDOW_DAYS`]).
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("all") {
            return Ok(Period::All);
        }

        let invalid = || CoreError::Validation(format!("Invalid period: {raw}"));

        let unit = raw.chars().last().ok_or_else(invalid)?;
        let amount: i64 = raw[..raw.len() - unit.len_utf8()]
            .parse()
            .map_err(|_| invalid())?;
        if amount < 1 {
            return Err(invalid());
        }

        let window = match unit {
            'h' => Duration::try_hours(amount),
            'd' => Duration::try_days(amount),
            'w' => Duration::try_weeks(amount),
            _ => None,
        }
        .filter(|window| window.num_days() <= MAX_WINDOW_DAYS)
        .ok_or_else(invalid)?;

        Ok(Period::Window(window))
    }

    /// Earliest timestamp kept by this period, or `None` for [`Period::All`].
    pub fn cutoff(self, now: Timestamp) -> Option<Timestamp> {
        match self {
            Period::All => None,
            Period::Window(window) => Some(
                now.checked_sub_signed(window)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
            ),
        }
    }
}

/// Read a stored snapshot timestamp.
///
/// Accepts RFC3339 strings and MongoDB extended-JSON dates, both the relaxed
/// `{"$date": "<rfc3339>"}` and canonical `{"$date": {"$numberLong": "<ms>"}}`
/// forms, plus bare epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<Timestamp> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(millis_to_timestamp),
        Value::Object(map) => match map.get("$date")? {
            Value::Object(inner) => inner
                .get("$numberLong")
                .and_then(Value::as_str)
                .and_then(|ms| ms.parse().ok())
                .and_then(millis_to_timestamp),
            other => parse_timestamp(other),
        },
        _ => None,
    }
}

fn millis_to_timestamp(ms: i64) -> Option<Timestamp> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Normalize a stored `analytics` field into a list of entries.
///
/// Older documents hold a single snapshot object instead of an array; it is
/// read as a one-entry history.
pub fn history_entries(stored: Option<&Value>) -> Vec<Value> {
    match stored {
        Some(Value::Array(items)) => items.clone(),
        Some(obj @ Value::Object(_)) => vec![obj.clone()],
        _ => Vec::new(),
    }
}

/// Keep the entries that fall inside `period`, relative to `now`.
///
/// With [`Period::All`] every entry is returned. With a window, entries
/// without a readable timestamp are dropped.
pub fn filter_history(entries: Vec<Value>, period: Period, now: Timestamp) -> Vec<Value> {
    let Some(cutoff) = period.cutoff(now) else {
        return entries;
    };

    entries
        .into_iter()
        .filter(|entry| {
            entry
                .get("timestamp")
                .and_then(parse_timestamp)
                .is_some_and(|ts| ts >= cutoff)
        })
        .collect()
}
