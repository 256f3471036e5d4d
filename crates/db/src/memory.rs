//! In-process [`SettingsStore`] holding JSON documents behind an async lock.
//!
//! Mirrors the MongoDB store's matched/modified semantics so HTTP behaviour
//! is the same against either backend. Used by the integration tests and by
//! seed-file development runs.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tubedeck_core::analytics::ANALYTICS_FIELD;
use tubedeck_core::settings::{UserDocument, CHANNELS_FIELD, USER_SETTINGS_FIELD};

use crate::store::{
    credentials_from_json, normalize_legacy_credentials, normalize_legacy_settings,
    user_document, Credentials, SettingsStore, UpdateOutcome, PRESETS_FIELD, USERNAME_FIELD,
    USER_ID_FIELD,
};
use crate::DbError;

#[derive(Debug, Default)]
struct State {
    documents: Vec<Map<String, Value>>,
    credentials: Vec<Credentials>,
}

impl State {
    fn user(&self, user_id: &str) -> Option<&Map<String, Value>> {
        self.documents
            .iter()
            .find(|doc| doc.get(USER_ID_FIELD).and_then(Value::as_str) == Some(user_id))
    }

    fn user_mut(&mut self, user_id: &str) -> Option<&mut Map<String, Value>> {
        self.documents
            .iter_mut()
            .find(|doc| doc.get(USER_ID_FIELD).and_then(Value::as_str) == Some(user_id))
    }
}

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    state: RwLock<State>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a settings document for `user_id`. `data` must be a JSON object.
    pub fn with_document(mut self, user_id: &str, data: Value) -> Self {
        let mut doc = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        doc.insert(USER_ID_FIELD.to_string(), Value::String(user_id.to_string()));
        self.state.get_mut().documents.push(doc);
        self
    }

    /// Add a login record.
    pub fn with_credentials(mut self, username: &str, user_id: &str, passcode: &str) -> Self {
        self.state.get_mut().credentials.push(Credentials {
            username: username.to_string(),
            user_id: user_id.to_string(),
            passcode: passcode.to_string(),
        });
        self
    }

    /// Add a `presets` document overriding the built-in presets.
    pub fn with_presets(mut self, presets: Map<String, Value>) -> Self {
        let mut doc = Map::new();
        doc.insert(PRESETS_FIELD.to_string(), Value::Object(presets));
        self.state.get_mut().documents.push(doc);
        self
    }

    /// Build a store from seed data:
    ///
    /// ```json
    /// { "settings": [ { "user_id": "u1", "channels": {} } ],
    ///   "users": [ { "username": "alice", "passcode": "...", "user_id": "u1" } ] }
    /// ```
    ///
    /// Legacy layouts (`{ "<userId>": {...} }` settings entries and a
    /// `{ "<username>": { passcode, id } }` users object) are accepted too.
    pub fn from_seed(seed: Value) -> Result<Self, DbError> {
        let Value::Object(mut seed) = seed else {
            return Err(DbError::Seed("seed must be a JSON object".into()));
        };

        let mut documents = Vec::new();
        match seed.remove("settings") {
            Some(Value::Array(items)) => {
                for item in items {
                    let Value::Object(doc) = item else {
                        return Err(DbError::Seed("settings entries must be objects".into()));
                    };
                    documents.push(normalize_legacy_settings(&doc).unwrap_or(doc));
                }
            }
            None => {}
            Some(_) => return Err(DbError::Seed("'settings' must be an array".into())),
        }

        let credentials = match seed.remove("users") {
            Some(Value::Array(records)) => records
                .iter()
                .map(|record| {
                    let username = record
                        .get(USERNAME_FIELD)
                        .and_then(Value::as_str)
                        .ok_or_else(|| DbError::Seed("user record has no username".into()))?;
                    credentials_from_json(username, record)
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(Value::Object(legacy)) => normalize_legacy_credentials(&legacy)?
                .into_iter()
                .map(|record| {
                    let username = record[USERNAME_FIELD].as_str().unwrap_or_default().to_string();
                    credentials_from_json(&username, &Value::Object(record))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
            Some(_) => return Err(DbError::Seed("'users' must be an array".into())),
        };

        Ok(Self {
            state: RwLock::new(State {
                documents,
                credentials,
            }),
        })
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<Value>, DbError> {
        let state = self.state.read().await;
        Ok(state.documents.iter().cloned().map(Value::Object).collect())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<UserDocument>, DbError> {
        let state = self.state.read().await;
        state.user(user_id).cloned().map(user_document).transpose()
    }

    async fn set_channel(
        &self,
        user_id: &str,
        channel_key: &str,
        settings: &Value,
    ) -> Result<UpdateOutcome, DbError> {
        let mut state = self.state.write().await;
        let Some(user) = state.user_mut(user_id) else {
            return Ok(UpdateOutcome::NotMatched);
        };

        let channels = object_entry(user, CHANNELS_FIELD);
        if channels.get(channel_key) == Some(settings) {
            return Ok(UpdateOutcome::Unchanged);
        }
        channels.insert(channel_key.to_string(), settings.clone());
        Ok(UpdateOutcome::Modified)
    }

    async fn remove_channel(
        &self,
        user_id: &str,
        channel_key: &str,
    ) -> Result<UpdateOutcome, DbError> {
        let mut state = self.state.write().await;
        let Some(user) = state.user_mut(user_id) else {
            return Ok(UpdateOutcome::NotMatched);
        };

        let removed = user
            .get_mut(CHANNELS_FIELD)
            .and_then(Value::as_object_mut)
            .and_then(|channels| channels.remove(channel_key));
        Ok(match removed {
            Some(_) => UpdateOutcome::Modified,
            None => UpdateOutcome::Unchanged,
        })
    }

    async fn set_user_settings(
        &self,
        user_id: &str,
        settings: &Value,
    ) -> Result<UpdateOutcome, DbError> {
        let mut state = self.state.write().await;
        let Some(user) = state.user_mut(user_id) else {
            return Ok(UpdateOutcome::NotMatched);
        };

        if user.get(USER_SETTINGS_FIELD) == Some(settings) {
            return Ok(UpdateOutcome::Unchanged);
        }
        user.insert(USER_SETTINGS_FIELD.to_string(), settings.clone());
        Ok(UpdateOutcome::Modified)
    }

    async fn append_analytics(
        &self,
        user_id: &str,
        channel_key: &str,
        snapshot: &Value,
    ) -> Result<UpdateOutcome, DbError> {
        let mut state = self.state.write().await;
        let channel = state
            .user_mut(user_id)
            .and_then(|user| user.get_mut(CHANNELS_FIELD))
            .and_then(Value::as_object_mut)
            .and_then(|channels| channels.get_mut(channel_key))
            .and_then(Value::as_object_mut);
        let Some(channel) = channel else {
            return Ok(UpdateOutcome::NotMatched);
        };

        let history = match channel.remove(ANALYTICS_FIELD) {
            Some(Value::Array(mut entries)) => {
                entries.push(snapshot.clone());
                entries
            }
            Some(legacy @ Value::Object(_)) => vec![legacy, snapshot.clone()],
            _ => vec![snapshot.clone()],
        };
        channel.insert(ANALYTICS_FIELD.to_string(), Value::Array(history));
        Ok(UpdateOutcome::Modified)
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, DbError> {
        let state = self.state.read().await;
        Ok(state
            .credentials
            .iter()
            .find(|c| c.username == username)
            .cloned())
    }

    async fn default_presets(&self) -> Result<Option<Map<String, Value>>, DbError> {
        let state = self.state.read().await;
        match state.documents.iter().find_map(|doc| doc.get(PRESETS_FIELD)) {
            Some(Value::Object(presets)) => Ok(Some(presets.clone())),
            Some(_) => Err(DbError::Malformed("presets document is not an object".into())),
            None => Ok(None),
        }
    }
}

/// Sub-object at `key`, created (or replaced if not an object) on demand.
fn object_entry<'a>(parent: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    match entry {
        Value::Object(map) => map,
        _ => unreachable!("entry was just made an object"),
    }
}
