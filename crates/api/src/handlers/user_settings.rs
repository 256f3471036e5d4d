//! Handlers for the `/user-settings` resource (free-form credentials such as
//! the YouTube Data API key).

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tubedeck_core::error::CoreError;
use tubedeck_core::types::UserId;
use tubedeck_db::UpdateOutcome;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::handlers::channel_settings::find_user;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserSettingsResponse {
    pub settings: Value,
}

/// Request body for `PUT /user-settings/{user_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateUserSettingsRequest {
    pub settings: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET /api/user-settings/{user_id}
pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<UserSettingsResponse>> {
    let user = find_user(&state, &user_id).await?;
    let settings = user
        .user_settings()
        .filter(|settings| !settings.is_null())
        .cloned()
        .ok_or_else(|| AppError::Core(CoreError::NotFound("User settings not found".into())))?;

    Ok(Json(UserSettingsResponse { settings }))
}

/// PUT /api/user-settings/{user_id}
///
/// Replace the whole `user-settings` object.
pub async fn update(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<UserId>,
    AppJson(input): AppJson<UpdateUserSettingsRequest>,
) -> AppResult<Json<MessageResponse>> {
    let settings = match input.settings {
        Some(settings @ Value::Object(_)) => settings,
        Some(_) => return Err(AppError::BadRequest("settings must be an object".into())),
        None => return Err(AppError::BadRequest("settings is required".into())),
    };

    match state.store.set_user_settings(&user_id, &settings).await? {
        UpdateOutcome::NotMatched => Err(AppError::Core(CoreError::NotFound(
            "User not found".into(),
        ))),
        UpdateOutcome::Unchanged => Err(AppError::NotModified("Settings not modified".into())),
        UpdateOutcome::Modified => {
            tracing::info!(user_id = %user_id, "User settings updated");
            Ok(Json(MessageResponse {
                message: "User settings updated successfully",
            }))
        }
    }
}
