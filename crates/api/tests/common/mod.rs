#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use tubedeck_api::auth::jwt::{generate_token, JwtConfig};
use tubedeck_api::config::{LogFormat, MakerConfig, ServerConfig, StoreConfig};
use tubedeck_api::router::build_app_router;
use tubedeck_api::state::AppState;
use tubedeck_core::channel_url::ChannelRef;
use tubedeck_db::MemorySettingsStore;
use tubedeck_maker::{JobRegistry, JobRunner, DEFAULT_RETENTION};
use tubedeck_youtube::{ChannelDirectory, ChannelInfo, ChannelStatistics, YouTubeError};

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
///
/// The maker is a shell that exits immediately unless a test overrides it.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            expiry_mins: 60,
        },
        store: StoreConfig::Seed {
            path: "unused.json".into(),
        },
        maker: MakerConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 0".to_string(), "maker".to_string()],
            working_directory: None,
            retention_secs: DEFAULT_RETENTION.as_secs(),
        },
        youtube_api_base_url: "http://127.0.0.1:9".to_string(),
        log_format: LogFormat::Text,
    }
}

/// Build the full application router over an in-memory store and an empty
/// fake channel directory.
pub fn build_test_app(store: MemorySettingsStore) -> Router {
    build_test_app_with(store, FakeDirectory::default(), test_config())
}

/// Build the full application router, using the same middleware stack
/// production uses.
pub fn build_test_app_with(
    store: MemorySettingsStore,
    directory: FakeDirectory,
    config: ServerConfig,
) -> Router {
    let runner = JobRunner::new(
        JobRegistry::new(std::time::Duration::from_secs(config.maker.retention_secs)),
        config.maker.command(),
    );
    let state = AppState {
        store: Arc::new(store),
        directory: Arc::new(directory),
        runner,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// A token for `user_id`, signed with the test secret.
pub fn token_for(user_id: &str) -> String {
    generate_token(user_id, &test_config().jwt).expect("token generation should succeed")
}

/// Settings document of the standard test user `u1`: an API key and one
/// resolved channel with a single legacy analytics object.
pub fn seeded_user() -> Value {
    json!({
        "user-settings": { "youtube": "test-api-key" },
        "channels": {
            "Night Tales": {
                "channel-settings": { "upload-time": "18:30" },
                "video-settings": { "text": { "length": 60 } },
                "youtube_channel_id": "UCnighttales00000000000a",
                "channel_url": "https://www.youtube.com/@nighttales"
            },
            "Drafts": {
                "channel-settings": { "upload-time": "09:00" }
            }
        }
    })
}

pub fn seeded_store() -> MemorySettingsStore {
    MemorySettingsStore::new()
        .with_document("u1", seeded_user())
        .with_credentials("alice", "u1", "1234")
}

// ---------------------------------------------------------------------------
// Fake YouTube directory
// ---------------------------------------------------------------------------

/// In-process stand-in for the YouTube Data API.
#[derive(Debug, Default, Clone)]
pub struct FakeDirectory {
    channels: Vec<(ChannelRef, ChannelInfo)>,
    statistics: HashMap<String, ChannelStatistics>,
}

impl FakeDirectory {
    pub fn with_channel(mut self, channel: ChannelRef, id: &str, title: &str) -> Self {
        self.channels.push((
            channel,
            ChannelInfo {
                id: id.to_string(),
                title: title.to_string(),
            },
        ));
        self
    }

    pub fn with_statistics(mut self, channel_id: &str, statistics: ChannelStatistics) -> Self {
        self.statistics.insert(channel_id.to_string(), statistics);
        self
    }
}

#[async_trait]
impl ChannelDirectory for FakeDirectory {
    async fn resolve_channel(
        &self,
        channel: &ChannelRef,
        _api_key: &str,
    ) -> Result<ChannelInfo, YouTubeError> {
        self.channels
            .iter()
            .find(|(known, _)| known == channel)
            .map(|(_, info)| info.clone())
            .ok_or(YouTubeError::ChannelNotFound)
    }

    async fn channel_statistics(
        &self,
        channel_id: &str,
        _api_key: &str,
    ) -> Result<ChannelStatistics, YouTubeError> {
        self.statistics
            .get(channel_id)
            .cloned()
            .ok_or(YouTubeError::ChannelNotFound)
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
