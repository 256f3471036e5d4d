//! Handlers for the `/auth` resource.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tubedeck_core::error::CoreError;
use tubedeck_core::types::UserId;

use crate::auth::jwt::generate_token;
use crate::auth::password::verify_passcode;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    #[serde(alias = "passcode")]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: UserId,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/login
///
/// Exchange a username and passcode for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    AppJson(input): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let invalid =
        || AppError::Core(CoreError::Unauthorized("Invalid username or password".into()));

    let credentials = state
        .store
        .find_credentials(&input.username)
        .await?
        .ok_or_else(invalid)?;

    let matches = verify_passcode(&input.password, &credentials.passcode)
        .map_err(|e| AppError::InternalError(format!("Passcode verification failed: {e}")))?;
    if !matches {
        tracing::info!(username = %input.username, "Rejected login attempt");
        return Err(invalid());
    }

    let token = generate_token(&credentials.user_id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    tracing::info!(user_id = %credentials.user_id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user_id: credentials.user_id,
    }))
}
