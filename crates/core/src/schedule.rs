//! Upload schedule: next upload date derived from a channel's `upload-time`.

use chrono::{DateTime, Days, NaiveTime, Utc};
use serde_json::Value;

use crate::types::Timestamp;

/// `channel-settings.upload-time` of a channel entry, if present.
pub fn upload_time(channel: &Value) -> Option<&str> {
    channel
        .get("channel-settings")
        .and_then(|s| s.get("upload-time"))
        .and_then(Value::as_str)
}

/// Next upload instant (UTC) for `upload_time`, relative to `now`.
///
/// A daily time of day (`HH:MM` or `HH:MM:SS`) yields today's slot if it is
/// still ahead, otherwise tomorrow's. A full RFC3339 timestamp is returned
/// as-is when it lies in the future. Anything else yields `None`.
pub fn next_upload(upload_time: &str, now: Timestamp) -> Option<Timestamp> {
    let raw = upload_time.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        let at = at.with_timezone(&Utc);
        return (at >= now).then_some(at);
    }

    let time = NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()?;

    let today = now.date_naive().and_time(time).and_utc();
    if today > now {
        Some(today)
    } else {
        now.date_naive()
            .checked_add_days(Days::new(1))
            .map(|d| d.and_time(time).and_utc())
    }
}
