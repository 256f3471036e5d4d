//! Parsing of user-supplied YouTube channel URLs.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

static CHANNEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^UC[A-Za-z0-9_-]{22}$").expect("valid channel id regex"));

static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.|m\.)?youtube\.com/([^?#]+)").expect("valid url regex")
});

/// How a channel is referenced before it is resolved to a channel id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// A canonical `UC...` channel id.
    Id(String),
    /// A handle, stored without the leading `@`.
    Handle(String),
    /// A legacy `/user/<name>` username.
    Username(String),
    /// A `/c/<name>` or bare `/<name>` custom URL; needs a search to resolve.
    Custom(String),
}

impl ChannelRef {
    /// Parse a channel URL, a bare `@handle`, or a bare `UC...` id.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let input = input.trim();
        let invalid = || CoreError::Validation(format!("Invalid YouTube channel URL: {input}"));

        if let Some(handle) = input.strip_prefix('@') {
            return non_empty(handle).map(ChannelRef::Handle).ok_or_else(invalid);
        }
        if CHANNEL_ID.is_match(input) {
            return Ok(ChannelRef::Id(input.to_string()));
        }

        let path = YOUTUBE_URL
            .captures(input)
            .and_then(|caps| caps.get(1))
            .ok_or_else(invalid)?
            .as_str();

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next().ok_or_else(invalid)?;

        let parsed = match first {
            "channel" => segments
                .next()
                .filter(|id| CHANNEL_ID.is_match(id))
                .map(|id| ChannelRef::Id(id.to_string())),
            "user" => segments.next().and_then(non_empty).map(ChannelRef::Username),
            "c" => segments.next().and_then(non_empty).map(ChannelRef::Custom),
            handle if handle.starts_with('@') => non_empty(&handle[1..]).map(ChannelRef::Handle),
            "watch" | "playlist" | "results" | "shorts" | "feed" => None,
            custom => non_empty(custom).map(ChannelRef::Custom),
        };

        parsed.ok_or_else(invalid)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
