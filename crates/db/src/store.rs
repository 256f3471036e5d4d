use async_trait::async_trait;
use serde_json::{Map, Value};
use tubedeck_core::settings::UserDocument;
use tubedeck_core::types::UserId;

use crate::DbError;

/// Settings documents are keyed by this field (unique index).
pub const USER_ID_FIELD: &str = "user_id";
/// Login records are keyed by this field (unique index).
pub const USERNAME_FIELD: &str = "username";
pub const PASSCODE_FIELD: &str = "passcode";
/// Top-level field of the document holding stored presets.
pub const PRESETS_FIELD: &str = "presets";

const OBJECT_ID_FIELD: &str = "_id";

/// Result of a single-document write, mirroring MongoDB's matched/modified
/// counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No document (or no target entry) matched the filter.
    NotMatched,
    /// The target matched but already held the written value.
    Unchanged,
    Modified,
}

/// Login record for one username.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub user_id: UserId,
    /// Argon2 PHC string, or a legacy plaintext passcode.
    pub passcode: String,
}

/// Access to per-user settings documents and login records.
///
/// Every write is a single-document operation; callers that read and then
/// write get no isolation between the two steps.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Verify the backing store is reachable.
    async fn ping(&self) -> Result<(), DbError>;

    /// Every raw document of the settings collection.
    async fn list_documents(&self) -> Result<Vec<Value>, DbError>;

    async fn find_user(&self, user_id: &str) -> Result<Option<UserDocument>, DbError>;

    /// Replace (or create) `channels.<channel_key>`.
    async fn set_channel(
        &self,
        user_id: &str,
        channel_key: &str,
        settings: &Value,
    ) -> Result<UpdateOutcome, DbError>;

    /// Remove `channels.<channel_key>`. `Unchanged` when the channel is absent.
    async fn remove_channel(&self, user_id: &str, channel_key: &str)
        -> Result<UpdateOutcome, DbError>;

    /// Replace the user's `user-settings` object.
    async fn set_user_settings(&self, user_id: &str, settings: &Value)
        -> Result<UpdateOutcome, DbError>;

    /// Append one snapshot to `channels.<channel_key>.analytics`.
    ///
    /// `NotMatched` when the user or the channel does not exist.
    async fn append_analytics(
        &self,
        user_id: &str,
        channel_key: &str,
        snapshot: &Value,
    ) -> Result<UpdateOutcome, DbError>;

    async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, DbError>;

    /// Preset templates stored in the collection, if any.
    async fn default_presets(&self) -> Result<Option<Map<String, Value>>, DbError>;
}

/// Split a stored settings document into its [`UserDocument`].
pub(crate) fn user_document(mut doc: Map<String, Value>) -> Result<UserDocument, DbError> {
    doc.remove(OBJECT_ID_FIELD);
    let user_id = match doc.remove(USER_ID_FIELD) {
        Some(Value::String(id)) => id,
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(DbError::Malformed("settings document has no user_id".into())),
    };
    Ok(UserDocument::new(user_id, doc))
}

/// Read a login record into [`Credentials`].
///
/// Accepts both the `user_id` field and the legacy `id` field, holding a
/// string, a number, or an extended-JSON number.
pub(crate) fn credentials_from_json(
    username: &str,
    entry: &Value,
) -> Result<Credentials, DbError> {
    let passcode = entry
        .get(PASSCODE_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| DbError::Malformed(format!("user '{username}' has no passcode")))?;

    let raw_id = entry.get(USER_ID_FIELD).or_else(|| entry.get("id"));
    let user_id = match raw_id {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        Some(Value::Object(obj)) => obj
            .get("$numberLong")
            .or_else(|| obj.get("$numberInt"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DbError::Malformed(format!("user '{username}' has an invalid id")))?,
        _ => return Err(DbError::Malformed(format!("user '{username}' has no id"))),
    };

    Ok(Credentials {
        username: username.to_string(),
        user_id,
        passcode: passcode.to_string(),
    })
}

/// Convert a legacy `{ "<userId>": { ... } }` settings document into the
/// keyed layout `{ "user_id": "<userId>", ... }`.
///
/// Returns `None` for documents that are already keyed, hold presets, or do
/// not have exactly one object-valued field.
pub fn normalize_legacy_settings(doc: &Map<String, Value>) -> Option<Map<String, Value>> {
    if doc.contains_key(USER_ID_FIELD) || doc.contains_key(PRESETS_FIELD) {
        return None;
    }

    let mut fields = doc.iter().filter(|(key, _)| *key != OBJECT_ID_FIELD);
    let (user_id, data) = fields.next()?;
    if fields.next().is_some() {
        return None;
    }

    let mut normalized = data.as_object()?.clone();
    normalized.insert(USER_ID_FIELD.to_string(), Value::String(user_id.clone()));
    Some(normalized)
}

/// Convert a legacy `{ "<username>": { passcode, id }, ... }` login document
/// into one keyed record per username.
///
/// Returns an empty list for documents that are already keyed.
pub fn normalize_legacy_credentials(
    doc: &Map<String, Value>,
) -> Result<Vec<Map<String, Value>>, DbError> {
    if doc.contains_key(USERNAME_FIELD) {
        return Ok(Vec::new());
    }

    doc.iter()
        .filter(|(key, _)| *key != OBJECT_ID_FIELD)
        .map(|(username, entry)| {
            let creds = credentials_from_json(username, entry)?;
            Ok(credentials_record(&creds))
        })
        .collect()
}

/// The stored shape of a login record.
pub(crate) fn credentials_record(creds: &Credentials) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert(USERNAME_FIELD.into(), Value::String(creds.username.clone()));
    record.insert(PASSCODE_FIELD.into(), Value::String(creds.passcode.clone()));
    record.insert(USER_ID_FIELD.into(), Value::String(creds.user_id.clone()));
    record
}
