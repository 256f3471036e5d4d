use assert_matches::assert_matches;
use serde_json::json;
use tubedeck_db::{DbError, MemorySettingsStore, SettingsStore, UpdateOutcome};

fn store() -> MemorySettingsStore {
    MemorySettingsStore::new()
        .with_document(
            "u1",
            json!({
                "channels": {
                    "Night Tales": {
                        "channel-settings": {"upload-time": "18:00"},
                        "analytics": {"name": "Night Tales", "views": 1, "likes": 0,
                                      "comments": 0, "subscribers": 2,
                                      "timestamp": "2024-10-01T00:00:00Z"}
                    }
                },
                "user-settings": {"youtube": "key"}
            }),
        )
        .with_credentials("alice", "u1", "secret")
}

// ---------------------------------------------------------------------------
// Channel writes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn set_channel_reports_outcomes() {
    let store = store();
    let settings = json!({"channel-settings": {"upload-time": "20:00"}});

    let first = store.set_channel("u1", "Night Tales", &settings).await.unwrap();
    assert_eq!(first, UpdateOutcome::Modified);

    let again = store.set_channel("u1", "Night Tales", &settings).await.unwrap();
    assert_eq!(again, UpdateOutcome::Unchanged);

    let missing = store.set_channel("nobody", "Night Tales", &settings).await.unwrap();
    assert_eq!(missing, UpdateOutcome::NotMatched);

    let user = store.find_user("u1").await.unwrap().unwrap();
    assert_eq!(user.channel("Night Tales"), Some(&settings));
}

#[tokio::test]
async fn remove_channel_twice() {
    let store = store();
    assert_eq!(
        store.remove_channel("u1", "Night Tales").await.unwrap(),
        UpdateOutcome::Modified
    );
    assert_eq!(
        store.remove_channel("u1", "Night Tales").await.unwrap(),
        UpdateOutcome::Unchanged
    );
    assert_eq!(
        store.remove_channel("nobody", "Night Tales").await.unwrap(),
        UpdateOutcome::NotMatched
    );
}

#[tokio::test]
async fn user_settings_replace() {
    let store = store();
    let same = json!({"youtube": "key"});
    assert_eq!(store.set_user_settings("u1", &same).await.unwrap(), UpdateOutcome::Unchanged);

    let next = json!({"youtube": "other"});
    assert_eq!(store.set_user_settings("u1", &next).await.unwrap(), UpdateOutcome::Modified);
    let user = store.find_user("u1").await.unwrap().unwrap();
    assert_eq!(user.youtube_api_key(), Some("other"));
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn append_analytics_converts_legacy_object() {
    let store = store();
    let snapshot = json!({"name": "Night Tales", "views": 5, "likes": 1, "comments": 0,
                          "subscribers": 3, "timestamp": "2024-10-02T00:00:00Z"});

    let outcome = store.append_analytics("u1", "Night Tales", &snapshot).await.unwrap();
    assert_eq!(outcome, UpdateOutcome::Modified);
    store.append_analytics("u1", "Night Tales", &snapshot).await.unwrap();

    let user = store.find_user("u1").await.unwrap().unwrap();
    let history = user.channel("Night Tales").unwrap()["analytics"].as_array().unwrap().clone();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0]["views"], 1);
    assert_eq!(history[2]["views"], 5);
}

#[tokio::test]
async fn append_analytics_to_missing_channel() {
    let store = store();
    let outcome = store.append_analytics("u1", "Ghost", &json!({})).await.unwrap();
    assert_eq!(outcome, UpdateOutcome::NotMatched);
}

// ---------------------------------------------------------------------------
// Credentials, presets and seeding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn credentials_lookup() {
    let store = store();
    let creds = store.find_credentials("alice").await.unwrap().unwrap();
    assert_eq!(creds.user_id, "u1");
    assert_eq!(creds.passcode, "secret");
    assert!(store.find_credentials("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn presets_only_when_stored() {
    assert!(store().default_presets().await.unwrap().is_none());

    let presets = json!({"Calm": {"channel-settings": {"upload-time": "07:00"}}});
    let store = store().with_presets(presets.as_object().unwrap().clone());
    let found = store.default_presets().await.unwrap().unwrap();
    assert!(found.contains_key("Calm"));
}

#[tokio::test]
async fn seed_file_shape() {
    let store = MemorySettingsStore::from_seed(json!({
        "settings": [
            {"user_id": "u1", "channels": {}},
            {"presets": {"Calm": {}}}
        ],
        "users": [{"username": "alice", "passcode": "pw", "user_id": "u1"}]
    }))
    .unwrap();

    assert!(store.find_user("u1").await.unwrap().is_some());
    assert_eq!(store.find_credentials("alice").await.unwrap().unwrap().user_id, "u1");
    assert!(store.default_presets().await.unwrap().unwrap().contains_key("Calm"));

    let documents = store.list_documents().await.unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0]["user_id"], "u1");
}

#[tokio::test]
async fn legacy_seed_layout_is_normalized() {
    let store = MemorySettingsStore::from_seed(json!({
        "settings": [{"229202": {"channels": {"A": {}}}}],
        "users": {"alice": {"passcode": "pw", "id": 229202}}
    }))
    .unwrap();

    let user = store.find_user("229202").await.unwrap().unwrap();
    assert!(user.channel("A").is_some());
    let creds = store.find_credentials("alice").await.unwrap().unwrap();
    assert_eq!(creds.user_id, "229202");
}

#[test]
fn invalid_seed_is_rejected() {
    assert_matches!(MemorySettingsStore::from_seed(json!([])), Err(DbError::Seed(_)));
    assert_matches!(
        MemorySettingsStore::from_seed(json!({"settings": {}})),
        Err(DbError::Seed(_))
    );
    assert_matches!(
        MemorySettingsStore::from_seed(json!({"users": [{"passcode": "pw"}]})),
        Err(DbError::Seed(_))
    );
    assert_matches!(
        MemorySettingsStore::from_seed(json!({"users": {"alice": {"id": 1}}})),
        Err(DbError::Malformed(_))
    );
}
