//! A user's settings sub-document and the field-name rules it must obey.

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::types::UserId;

/// Sub-object holding the user's channel map.
pub const CHANNELS_FIELD: &str = "channels";
/// Sub-object holding free-form credentials (API keys).
pub const USER_SETTINGS_FIELD: &str = "user-settings";
/// Key inside `user-settings` holding the YouTube Data API key.
pub const YOUTUBE_API_KEY_FIELD: &str = "youtube";
/// Channel entry field holding the resolved YouTube channel id.
pub const CHANNEL_ID_FIELD: &str = "youtube_channel_id";
/// Channel entry field holding the URL the channel was added from.
pub const CHANNEL_URL_FIELD: &str = "channel_url";

/// The settings stored under a user's id.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDocument {
    pub user_id: UserId,
    pub data: Map<String, Value>,
}

impl UserDocument {
    pub fn new(user_id: impl Into<UserId>, data: Map<String, Value>) -> Self {
        Self {
            user_id: user_id.into(),
            data,
        }
    }

    pub fn channels(&self) -> Option<&Map<String, Value>> {
        self.data.get(CHANNELS_FIELD).and_then(Value::as_object)
    }

    pub fn channel(&self, key: &str) -> Option<&Value> {
        self.channels().and_then(|channels| channels.get(key))
    }

    pub fn user_settings(&self) -> Option<&Value> {
        self.data.get(USER_SETTINGS_FIELD)
    }

    /// The user's YouTube Data API key, if configured and non-empty.
    pub fn youtube_api_key(&self) -> Option<&str> {
        self.user_settings()
            .and_then(|s| s.get(YOUTUBE_API_KEY_FIELD))
            .and_then(Value::as_str)
            .filter(|key| !key.trim().is_empty())
    }

    /// Key of an existing channel entry whose resolved id is `channel_id`.
    pub fn channel_key_by_youtube_id(&self, channel_id: &str) -> Option<&str> {
        self.channels()?.iter().find_map(|(key, entry)| {
            (entry.get(CHANNEL_ID_FIELD).and_then(Value::as_str) == Some(channel_id))
                .then_some(key.as_str())
        })
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }
}

/// Check that `name` can be used as one segment of a MongoDB field path.
pub fn validate_field_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Field name must not be empty".into()));
    }
    if name.contains('.') || name.starts_with('$') || name.contains('\0') {
        return Err(CoreError::Validation(format!(
            "Invalid field name '{name}': must not contain '.' or start with '$'"
        )));
    }
    Ok(())
}

/// Derive a channel key from a YouTube channel title.
///
/// Titles are used as keys so the dashboard shows readable names; characters
/// that would break a field path are replaced with `_`.
pub fn channel_key_from_title(title: &str) -> String {
    let key: String = title
        .trim()
        .chars()
        .map(|c| if c == '.' || c == '\0' { '_' } else { c })
        .collect();

    match key.strip_prefix('$') {
        Some(rest) => format!("_{rest}"),
        None => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> UserDocument {
        let data = json!({
            "channels": {
                "Night Tales": {"youtube_channel_id": "UC111"},
                "Love Notes": {"youtube_channel_id": "UC222"}
            },
            "user-settings": {"youtube": "key-123"}
        });
        UserDocument::new("u1", data.as_object().unwrap().clone())
    }

    #[test]
    fn accessors() {
        let doc = doc();
        assert_eq!(doc.channels().unwrap().len(), 2);
        assert!(doc.channel("Night Tales").is_some());
        assert!(doc.channel("Missing").is_none());
        assert_eq!(doc.youtube_api_key(), Some("key-123"));
        assert_eq!(doc.channel_key_by_youtube_id("UC222"), Some("Love Notes"));
        assert_eq!(doc.channel_key_by_youtube_id("UC999"), None);
    }

    #[test]
    fn blank_api_key_is_missing() {
        let data = json!({"user-settings": {"youtube": "  "}});
        let doc = UserDocument::new("u1", data.as_object().unwrap().clone());
        assert_eq!(doc.youtube_api_key(), None);
    }

    #[test]
    fn field_names() {
        assert!(validate_field_name("Night Tales").is_ok());
        assert!(validate_field_name("").is_err());
        assert!(validate_field_name("a.b").is_err());
        assert!(validate_field_name("$set").is_err());
    }

    #[test]
    fn keys_from_titles() {
        assert_eq!(channel_key_from_title("Mr. Beast"), "Mr_ Beast");
        assert_eq!(channel_key_from_title("$Money"), "_Money");
        assert_eq!(channel_key_from_title("  Night Tales "), "Night Tales");
        assert!(validate_field_name(&channel_key_from_title("a.b.c")).is_ok());
    }
}
