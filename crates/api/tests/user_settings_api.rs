//! HTTP-level integration tests for `/api/user-settings`.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get_auth, put_json_auth, seeded_store, token_for};
use serde_json::json;
use tubedeck_db::MemorySettingsStore;

#[tokio::test]
async fn test_get_user_settings() {
    let app = build_test_app(seeded_store());

    let response = get_auth(app, "/api/user-settings/u1", &token_for("u1")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["settings"]["youtube"], "test-api-key");
}

#[tokio::test]
async fn test_get_missing_user_or_settings() {
    let store = seeded_store().with_document("u2", json!({ "channels": {} }));
    let app = build_test_app(store);
    let token = token_for("u1");

    let response = get_auth(app.clone(), "/api/user-settings/nobody", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "User not found");

    let response = get_auth(app, "/api/user-settings/u2", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "User settings not found");
}

#[tokio::test]
async fn test_update_then_repeat_is_not_modified() {
    let app = build_test_app(seeded_store());
    let token = token_for("u1");
    let body = json!({ "settings": { "youtube": "rotated-key", "elevenlabs": "el-key" } });

    let response = put_json_auth(app.clone(), "/api/user-settings/u1", body.clone(), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "User settings updated successfully"
    );

    let response = put_json_auth(app.clone(), "/api/user-settings/u1", body, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

    let json = body_json(get_auth(app, "/api/user-settings/u1", &token).await).await;
    assert_eq!(json["settings"]["youtube"], "rotated-key");
}

#[tokio::test]
async fn test_update_unknown_user_is_404() {
    let app = build_test_app(MemorySettingsStore::new());

    let response = put_json_auth(
        app,
        "/api/user-settings/nobody",
        json!({ "settings": { "youtube": "k" } }),
        &token_for("nobody"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_requires_settings_object() {
    let app = build_test_app(seeded_store());
    let token = token_for("u1");

    for body in [json!({}), json!({ "settings": "plain" })] {
        let response = put_json_auth(app.clone(), "/api/user-settings/u1", body, &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
