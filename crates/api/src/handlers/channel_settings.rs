//! Handlers for the `/channel-settings` resource.
//!
//! A user's channels live under `channels.<channelKey>` of their settings
//! document. Keys are display names, so every key taken from a request or
//! derived from a YouTube title is checked with
//! [`validate_field_name`] before it reaches the store.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tubedeck_core::analytics::ANALYTICS_FIELD;
use tubedeck_core::channel_url::ChannelRef;
use tubedeck_core::error::CoreError;
use tubedeck_core::presets::{builtin_presets, DEFAULT_PRESET};
use tubedeck_core::schedule::{next_upload, upload_time};
use tubedeck_core::settings::{
    channel_key_from_title, validate_field_name, UserDocument, CHANNEL_ID_FIELD,
    CHANNEL_URL_FIELD,
};
use tubedeck_core::types::{Timestamp, UserId};
use tubedeck_db::UpdateOutcome;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Channel fields maintained by the server. A replacement that omits them
/// keeps the stored values.
const SERVER_MANAGED_FIELDS: [&str; 3] = [CHANNEL_ID_FIELD, CHANNEL_URL_FIELD, ANALYTICS_FIELD];

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `PUT /channel-settings/{user_id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChannelRequest {
    pub channel_key: Option<String>,
    pub new_settings: Option<Value>,
}

/// Request body for `POST /channel-settings/{user_id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChannelRequest {
    pub channel_url: Option<String>,
    /// Initial settings; the `Default` preset when omitted.
    pub new_settings: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelUpdated {
    pub message: &'static str,
    pub channel_key: String,
    pub settings: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedChannel {
    pub key: String,
    pub channel_id: String,
    pub title: String,
    pub settings: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAdded {
    pub message: &'static str,
    pub added_channel: AddedChannel,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDeleted {
    pub message: &'static str,
    pub channel_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetsResponse {
    pub presets: Map<String, Value>,
    pub user_channels: Map<String, Value>,
}

/// One row of `GET /channel-settings/names-and-dates/{user_id}`.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSchedule {
    pub name: String,
    pub upload_time: Option<String>,
    pub next_upload: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct SchedulesResponse {
    pub channels: Vec<ChannelSchedule>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/channel-settings
///
/// Every settings document, as stored.
pub async fn list(State(state): State<AppState>, _auth: AuthUser) -> AppResult<Json<Vec<Value>>> {
    let documents = state.store.list_documents().await?;
    Ok(Json(documents))
}

/// GET /api/channel-settings/{user_id}
pub async fn get_by_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<Value>> {
    let user = find_user(&state, &user_id).await?;
    Ok(Json(user.into_value()))
}

/// PUT /api/channel-settings/{user_id}
///
/// Replace one existing channel's settings.
pub async fn update(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<UserId>,
    AppJson(input): AppJson<UpdateChannelRequest>,
) -> AppResult<Json<ChannelUpdated>> {
    let (Some(channel_key), Some(new_settings)) = (input.channel_key, input.new_settings) else {
        return Err(AppError::BadRequest(
            "channelKey and newSettings are required".into(),
        ));
    };
    validate_field_name(&channel_key)?;
    let Value::Object(mut new_settings) = new_settings else {
        return Err(AppError::BadRequest("newSettings must be an object".into()));
    };

    let not_found = || AppError::Core(CoreError::NotFound("User or channel not found".into()));

    let user = state.store.find_user(&user_id).await?.ok_or_else(not_found)?;
    let existing = user.channel(&channel_key).ok_or_else(not_found)?;

    for field in SERVER_MANAGED_FIELDS {
        if let Some(value) = existing.get(field) {
            new_settings
                .entry(field.to_string())
                .or_insert_with(|| value.clone());
        }
    }
    let settings = Value::Object(new_settings);

    match state
        .store
        .set_channel(&user_id, &channel_key, &settings)
        .await?
    {
        UpdateOutcome::NotMatched => Err(not_found()),
        UpdateOutcome::Unchanged => Err(AppError::NotModified("not_modified".into())),
        UpdateOutcome::Modified => {
            tracing::info!(user_id = %user_id, channel_key = %channel_key, "Channel settings updated");
            Ok(Json(ChannelUpdated {
                message: "Channel settings updated successfully",
                channel_key,
                settings,
            }))
        }
    }
}

/// POST /api/channel-settings/{user_id}
///
/// Resolve a YouTube channel URL and add the channel under its title.
pub async fn add(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<UserId>,
    AppJson(input): AppJson<AddChannelRequest>,
) -> AppResult<(StatusCode, Json<ChannelAdded>)> {
    let channel_url = input
        .channel_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("channelUrl is required".into()))?;
    let channel_ref = ChannelRef::parse(&channel_url)?;

    let user = find_user(&state, &user_id).await?;
    let api_key = user.youtube_api_key().ok_or_else(|| {
        AppError::BadRequest("YouTube API key not found in user settings".into())
    })?;

    let info = state.directory.resolve_channel(&channel_ref, api_key).await?;
    let channel_key = channel_key_from_title(&info.title);
    validate_field_name(&channel_key)?;

    if user.channel(&channel_key).is_some() || user.channel_key_by_youtube_id(&info.id).is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "Channel already exists".into(),
        )));
    }

    let mut settings = match input.new_settings {
        Some(Value::Object(settings)) => settings,
        Some(_) => return Err(AppError::BadRequest("newSettings must be an object".into())),
        None => default_channel_settings(&state).await?,
    };
    settings.insert(CHANNEL_ID_FIELD.to_string(), Value::String(info.id.clone()));
    settings.insert(CHANNEL_URL_FIELD.to_string(), Value::String(channel_url));
    let settings = Value::Object(settings);

    match state
        .store
        .set_channel(&user_id, &channel_key, &settings)
        .await?
    {
        UpdateOutcome::NotMatched => Err(user_not_found()),
        UpdateOutcome::Unchanged | UpdateOutcome::Modified => {
            tracing::info!(
                user_id = %user_id,
                channel_key = %channel_key,
                channel_id = %info.id,
                "Channel added",
            );
            Ok((
                StatusCode::CREATED,
                Json(ChannelAdded {
                    message: "Channel added successfully",
                    added_channel: AddedChannel {
                        key: channel_key,
                        channel_id: info.id,
                        title: info.title,
                        settings,
                    },
                }),
            ))
        }
    }
}

/// DELETE /api/channel-settings/{user_id}/{channel_key}
pub async fn delete(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((user_id, channel_key)): Path<(UserId, String)>,
) -> AppResult<Json<ChannelDeleted>> {
    validate_field_name(&channel_key)?;

    match state.store.remove_channel(&user_id, &channel_key).await? {
        UpdateOutcome::NotMatched => Err(user_not_found()),
        UpdateOutcome::Unchanged => Err(AppError::NotModified(
            "Channel not found or already deleted".into(),
        )),
        UpdateOutcome::Modified => {
            tracing::info!(user_id = %user_id, channel_key = %channel_key, "Channel deleted");
            Ok(Json(ChannelDeleted {
                message: "Channel deleted successfully",
                channel_key,
            }))
        }
    }
}

/// GET /api/channel-settings/presets/{user_id}
///
/// Preset templates plus the user's own channels, both usable as the
/// starting point for a new channel.
pub async fn presets(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<PresetsResponse>> {
    let user = find_user(&state, &user_id).await?;
    let presets = state
        .store
        .default_presets()
        .await?
        .unwrap_or_else(builtin_presets);

    Ok(Json(PresetsResponse {
        presets,
        user_channels: user.channels().cloned().unwrap_or_default(),
    }))
}

/// GET /api/channel-settings/names-and-dates/{user_id}
pub async fn names_and_dates(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<SchedulesResponse>> {
    let user = find_user(&state, &user_id).await?;
    Ok(Json(SchedulesResponse {
        channels: channel_schedules(&user, Utc::now()),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn user_not_found() -> AppError {
    AppError::Core(CoreError::NotFound("User not found".into()))
}

/// Load a user's settings document or fail with 404 `User not found`.
pub(crate) async fn find_user(state: &AppState, user_id: &str) -> AppResult<UserDocument> {
    state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(user_not_found)
}

/// Settings of the `Default` preset (stored presets first, then built-ins).
async fn default_channel_settings(state: &AppState) -> AppResult<Map<String, Value>> {
    let presets = state
        .store
        .default_presets()
        .await?
        .unwrap_or_else(builtin_presets);

    Ok(match presets.get(DEFAULT_PRESET) {
        Some(Value::Object(settings)) => settings.clone(),
        _ => Map::new(),
    })
}

fn channel_schedules(user: &UserDocument, now: Timestamp) -> Vec<ChannelSchedule> {
    user.channels()
        .map(|channels| {
            channels
                .iter()
                .map(|(name, entry)| {
                    let upload_time = upload_time(entry);
                    ChannelSchedule {
                        name: name.clone(),
                        upload_time: upload_time.map(str::to_string),
                        next_upload: upload_time.and_then(|t| next_upload(t, now)),
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn schedules_cover_every_channel() {
        let data = json!({
            "channels": {
                "Daily": { "channel-settings": { "upload-time": "18:30" } },
                "Unscheduled": { "video-settings": {} }
            }
        });
        let Value::Object(data) = data else { unreachable!() };
        let user = UserDocument::new("u1", data);
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let schedules = channel_schedules(&user, now);
        assert_eq!(
            schedules,
            vec![
                ChannelSchedule {
                    name: "Daily".into(),
                    upload_time: Some("18:30".into()),
                    next_upload: Some(Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap()),
                },
                ChannelSchedule {
                    name: "Unscheduled".into(),
                    upload_time: None,
                    next_upload: None,
                },
            ]
        );
    }

    #[test]
    fn schedules_without_channels() {
        let user = UserDocument::new("u1", Map::new());
        assert!(channel_schedules(&user, Utc::now()).is_empty());
    }
}
