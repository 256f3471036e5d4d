//! MongoDB-backed [`SettingsStore`].
//!
//! Settings documents are keyed by `user_id` and login records by
//! `username`, both behind unique indexes. [`MongoSettingsStore::migrate_legacy`]
//! rewrites documents from the older layout where the user id (or username)
//! was itself the top-level field name.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::IndexOptions;
use mongodb::results::UpdateResult;
use mongodb::{Collection, Database, IndexModel};
use serde_json::{Map, Value};
use tubedeck_core::analytics::ANALYTICS_FIELD;
use tubedeck_core::settings::{UserDocument, CHANNELS_FIELD, USER_SETTINGS_FIELD};

use crate::store::{
    credentials_from_json, normalize_legacy_credentials, normalize_legacy_settings,
    user_document, Credentials, SettingsStore, UpdateOutcome, PRESETS_FIELD, USERNAME_FIELD,
    USER_ID_FIELD,
};
use crate::DbError;

/// Documents rewritten by [`MongoSettingsStore::migrate_legacy`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub settings: usize,
    pub users: usize,
}

#[derive(Clone)]
pub struct MongoSettingsStore {
    db: Database,
    settings: Collection<Document>,
    users: Collection<Document>,
}

impl MongoSettingsStore {
    pub fn new(db: Database, settings_collection: &str, users_collection: &str) -> Self {
        Self {
            settings: db.collection(settings_collection),
            users: db.collection(users_collection),
            db,
        }
    }

    /// Create the unique `user_id` and `username` indexes if missing.
    ///
    /// The `user_id` index is partial so the presets document (which has no
    /// `user_id`) can live in the same collection.
    pub async fn ensure_indexes(&self) -> Result<(), DbError> {
        let by_user = IndexModel::builder()
            .keys(doc! { USER_ID_FIELD: 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! { USER_ID_FIELD: { "$exists": true } })
                    .build(),
            )
            .build();
        self.settings.create_index(by_user).await?;

        let by_username = IndexModel::builder()
            .keys(doc! { USERNAME_FIELD: 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! { USERNAME_FIELD: { "$exists": true } })
                    .build(),
            )
            .build();
        self.users.create_index(by_username).await?;
        Ok(())
    }

    /// Rewrite legacy dynamically-keyed documents into the keyed layout.
    ///
    /// Each legacy document is replaced by its keyed counterpart(s); already
    /// keyed documents are untouched, so running this repeatedly is harmless.
    pub async fn migrate_legacy(&self) -> Result<MigrationReport, DbError> {
        let mut report = MigrationReport::default();

        let documents: Vec<Document> = self.settings.find(doc! {}).await?.try_collect().await?;
        for document in documents {
            let Some(normalized) = normalize_legacy_settings(&canonical_json(&document)) else {
                continue;
            };
            self.settings.insert_one(from_json_map(normalized)?).await?;
            if let Some(id) = document.get("_id") {
                self.settings.delete_one(doc! { "_id": id.clone() }).await?;
            }
            report.settings += 1;
        }

        let documents: Vec<Document> = self.users.find(doc! {}).await?.try_collect().await?;
        for document in documents {
            let records = normalize_legacy_credentials(&canonical_json(&document))?;
            if records.is_empty() {
                continue;
            }
            report.users += records.len();
            let records = records
                .into_iter()
                .map(from_json_map)
                .collect::<Result<Vec<_>, _>>()?;
            self.users.insert_many(records).await?;
            if let Some(id) = document.get("_id") {
                self.users.delete_one(doc! { "_id": id.clone() }).await?;
            }
        }

        if report != MigrationReport::default() {
            tracing::info!(
                settings = report.settings,
                users = report.users,
                "Migrated legacy settings documents"
            );
        }
        Ok(report)
    }

    async fn update_user(&self, filter: Document, update: Document) -> Result<UpdateOutcome, DbError> {
        let result = self.settings.update_one(filter, update).await?;
        Ok(outcome(&result))
    }
}

#[async_trait]
impl SettingsStore for MongoSettingsStore {
    async fn ping(&self) -> Result<(), DbError> {
        crate::health_check(&self.db).await
    }

    async fn list_documents(&self) -> Result<Vec<Value>, DbError> {
        let documents: Vec<Document> = self.settings.find(doc! {}).await?.try_collect().await?;
        Ok(documents
            .into_iter()
            .map(|d| Bson::Document(d).into_relaxed_extjson())
            .collect())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<UserDocument>, DbError> {
        let Some(found) = self.settings.find_one(user_filter(user_id)).await? else {
            return Ok(None);
        };
        match Bson::Document(found).into_relaxed_extjson() {
            Value::Object(map) => user_document(map).map(Some),
            _ => Err(DbError::Malformed(format!("settings for user '{user_id}' are not an object"))),
        }
    }

    async fn set_channel(
        &self,
        user_id: &str,
        channel_key: &str,
        settings: &Value,
    ) -> Result<UpdateOutcome, DbError> {
        let path = field_path(&[CHANNELS_FIELD, channel_key]);
        let value = to_bson(settings)?;
        self.update_user(user_filter(user_id), doc! { "$set": { path: value } })
            .await
    }

    async fn remove_channel(
        &self,
        user_id: &str,
        channel_key: &str,
    ) -> Result<UpdateOutcome, DbError> {
        // $unset of an absent path matches the user but modifies nothing.
        let path = field_path(&[CHANNELS_FIELD, channel_key]);
        self.update_user(user_filter(user_id), doc! { "$unset": { path: "" } })
            .await
    }

    async fn set_user_settings(
        &self,
        user_id: &str,
        settings: &Value,
    ) -> Result<UpdateOutcome, DbError> {
        let value = to_bson(settings)?;
        self.update_user(
            user_filter(user_id),
            doc! { "$set": { USER_SETTINGS_FIELD: value } },
        )
        .await
    }

    async fn append_analytics(
        &self,
        user_id: &str,
        channel_key: &str,
        snapshot: &Value,
    ) -> Result<UpdateOutcome, DbError> {
        let Some(user) = self.find_user(user_id).await? else {
            return Ok(UpdateOutcome::NotMatched);
        };
        let Some(channel) = user.channel(channel_key) else {
            return Ok(UpdateOutcome::NotMatched);
        };

        let channel_path = field_path(&[CHANNELS_FIELD, channel_key]);
        let path = field_path(&[CHANNELS_FIELD, channel_key, ANALYTICS_FIELD]);
        let entry = to_bson(snapshot)?;
        let update = match channel.get(ANALYTICS_FIELD) {
            Some(Value::Array(_)) => doc! { "$push": { path: entry } },
            Some(legacy @ Value::Object(_)) => {
                let legacy = to_bson(legacy)?;
                doc! { "$set": { path: [legacy, entry] } }
            }
            _ => doc! { "$set": { path: [entry] } },
        };

        // The channel is re-checked in the filter so a concurrent delete is
        // not undone by this write.
        let mut filter = user_filter(user_id);
        filter.insert(channel_path, doc! { "$exists": true });
        self.update_user(filter, update).await
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, DbError> {
        let Some(found) = self.users.find_one(doc! { USERNAME_FIELD: username }).await? else {
            return Ok(None);
        };
        let entry = Bson::Document(found).into_relaxed_extjson();
        credentials_from_json(username, &entry).map(Some)
    }

    async fn default_presets(&self) -> Result<Option<Map<String, Value>>, DbError> {
        let filter = doc! { PRESETS_FIELD: { "$exists": true } };
        let Some(mut found) = self.settings.find_one(filter).await? else {
            return Ok(None);
        };
        match found.remove(PRESETS_FIELD).map(Bson::into_relaxed_extjson) {
            Some(Value::Object(presets)) => Ok(Some(presets)),
            _ => Err(DbError::Malformed("presets document is not an object".into())),
        }
    }
}

fn user_filter(user_id: &str) -> Document {
    doc! { USER_ID_FIELD: user_id }
}

fn field_path(segments: &[&str]) -> String {
    segments.join(".")
}

fn outcome(result: &UpdateResult) -> UpdateOutcome {
    if result.matched_count == 0 {
        UpdateOutcome::NotMatched
    } else if result.modified_count == 0 {
        UpdateOutcome::Unchanged
    } else {
        UpdateOutcome::Modified
    }
}

/// Convert request JSON to BSON, reading extended-JSON values such as
/// `{"$date": ...}` back into their BSON types.
fn to_bson(value: &Value) -> Result<Bson, DbError> {
    Ok(Bson::try_from(value.clone())?)
}

/// Lossless JSON view of a document, used only for rewriting.
fn canonical_json(document: &Document) -> Map<String, Value> {
    match Bson::Document(document.clone()).into_canonical_extjson() {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn from_json_map(map: Map<String, Value>) -> Result<Document, DbError> {
    match Bson::try_from(Value::Object(map))? {
        Bson::Document(document) => Ok(document),
        _ => Err(DbError::Malformed("expected a document".into())),
    }
}
