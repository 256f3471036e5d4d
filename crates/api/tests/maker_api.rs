//! HTTP-level integration tests for `/api/maker`.
//!
//! The video maker is a `/bin/sh -c` script configured per test.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use common::{
    body_json, build_test_app_with, get_auth, post_json_auth, seeded_store, test_config,
    token_for, FakeDirectory,
};
use serde_json::{json, Value};

fn app_with_maker(script: &str) -> Router {
    let mut config = test_config();
    config.maker.args = vec!["-c".into(), script.into(), "maker".into()];
    build_test_app_with(seeded_store(), FakeDirectory::default(), config)
}

fn create_body() -> Value {
    json!({ "userId": "u1", "channelNames": ["Night Tales", "Drafts"], "videoCount": 3 })
}

/// Poll the job until it reaches a terminal status.
async fn wait_for_terminal(app: &Router, job_id: &str, token: &str) -> Value {
    for _ in 0..100 {
        let response =
            get_auth(app.clone(), &format!("/api/maker/job-status/{job_id}"), token).await;
        assert_eq!(response.status(), StatusCode::OK);
        let status = body_json(response).await;
        if status["status"] == "completed" || status["status"] == "error" {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job {job_id} did not finish");
}

#[tokio::test]
async fn test_create_videos_starts_job() {
    let app = app_with_maker(r#"cat > /dev/null; echo '{"progress": 50, "message": "Rendering"}'"#);
    let token = token_for("u1");

    let response = post_json_auth(app.clone(), "/api/maker/create-videos", create_body(), &token).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = body_json(response).await;
    assert_eq!(json["status"], "started");
    let job_id = json["jobId"].as_str().unwrap().to_string();
    assert!(job_id.starts_with("u1-"));
    assert!(json["message"].as_str().unwrap().contains("3 videos"));

    let status = wait_for_terminal(&app, &job_id, &token).await;
    assert_eq!(status["status"], "completed");
    assert_eq!(status["progress"], 100.0);
    assert_eq!(status["jobId"], job_id.as_str());
}

#[tokio::test]
async fn test_second_submission_conflicts_with_active_job() {
    let app = app_with_maker("sleep 2");
    let token = token_for("u1");

    let first = post_json_auth(app.clone(), "/api/maker/create-videos", create_body(), &token).await;
    assert_eq!(first.status(), StatusCode::ACCEPTED);
    let job_id = body_json(first).await["jobId"].clone();

    let second = post_json_auth(app, "/api/maker/create-videos", create_body(), &token).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["jobId"], job_id);
}

#[tokio::test]
async fn test_failed_maker_reports_error() {
    let app = app_with_maker("echo 'voice model missing' >&2; exit 4");
    let token = token_for("u1");

    let response = post_json_auth(app.clone(), "/api/maker/create-videos", create_body(), &token).await;
    let job_id = body_json(response).await["jobId"].as_str().unwrap().to_string();

    let status = wait_for_terminal(&app, &job_id, &token).await;
    assert_eq!(status["status"], "error");
    let error = status["error"].as_str().unwrap();
    assert!(error.contains("exited with code 4"), "{error}");
    assert!(error.contains("voice model missing"), "{error}");
}

#[tokio::test]
async fn test_create_videos_validation() {
    let app = app_with_maker("exit 0");
    let token = token_for("u1");

    for body in [
        json!({ "userId": "u1", "channelNames": [], "videoCount": 3 }),
        json!({ "userId": "u1", "channelNames": ["Night Tales"], "videoCount": 0 }),
        json!({ "userId": "u1", "channelNames": ["Night Tales"] }),
        json!({ "userId": "u1", "channelNames": ["Unknown"], "videoCount": 1 }),
    ] {
        let response = post_json_auth(app.clone(), "/api/maker/create-videos", body, &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_create_videos_for_unknown_user_is_404() {
    let app = app_with_maker("exit 0");

    let response = post_json_auth(
        app,
        "/api/maker/create-videos",
        json!({ "userId": "nobody", "channelNames": ["Night Tales"], "videoCount": 1 }),
        &token_for("u1"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "User not found");
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let app = app_with_maker("exit 0");

    let response = get_auth(app, "/api/maker/job-status/u1-0", &token_for("u1")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Job not found");
}
