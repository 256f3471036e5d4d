use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the settings store cannot be reached.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
}

/// GET /health
///
/// Answers 200 even when degraded.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = state
        .store
        .ping()
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Settings store ping failed"))
        .is_ok();

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

/// Mounted at the root, outside `/api` and its token gate.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
