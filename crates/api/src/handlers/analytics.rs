//! Handlers for the `/analytics` resource: per-channel statistics history.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tubedeck_core::analytics::{
    filter_history, history_entries, AnalyticsSnapshot, Period, ANALYTICS_FIELD,
};
use tubedeck_core::error::CoreError;
use tubedeck_core::settings::CHANNEL_ID_FIELD;
use tubedeck_core::types::UserId;
use tubedeck_db::UpdateOutcome;

use crate::error::{AppError, AppResult};
use crate::handlers::channel_settings::find_user;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Period used when the query string has none.
const DEFAULT_PERIOD: &str = "all";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub period: String,
    /// Filtered history keyed by channel.
    pub analytics: Map<String, Value>,
}

/// A channel whose statistics could not be refreshed.
#[derive(Debug, Serialize, PartialEq)]
pub struct ChannelError {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub analytics: Vec<AnalyticsSnapshot>,
    pub errors: Vec<ChannelError>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/analytics/{user_id}?period=all|<n>h|<n>d|<n>w
pub async fn history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<UserId>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<HistoryResponse>> {
    let raw_period = query.period.unwrap_or_else(|| DEFAULT_PERIOD.to_string());
    let period = Period::parse(&raw_period)?;

    let user = find_user(&state, &user_id).await?;
    let now = Utc::now();

    let analytics = user
        .channels()
        .map(|channels| {
            channels
                .iter()
                .map(|(key, entry)| {
                    let entries = history_entries(entry.get(ANALYTICS_FIELD));
                    (key.clone(), Value::Array(filter_history(entries, period, now)))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Json(HistoryResponse {
        period: raw_period,
        analytics,
    }))
}

/// POST /api/analytics/{user_id}
///
/// Fetch current statistics for every channel of the user, append one
/// snapshot per channel to its history, and report per-channel failures
/// alongside the successes.
pub async fn refresh(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<RefreshResponse>> {
    let user = find_user(&state, &user_id).await?;

    let api_key = user.youtube_api_key().ok_or_else(|| {
        AppError::BadRequest("YouTube API key not found in user settings".into())
    })?;
    let channels = user.channels().ok_or_else(|| {
        AppError::Core(CoreError::NotFound("No channels found for user".into()))
    })?;

    let results = join_all(channels.iter().map(|(key, entry)| {
        let state = &state;
        let user_id = &user_id;
        async move {
            refresh_channel(state, user_id, key, entry, api_key)
                .await
                .map_err(|error| ChannelError {
                    name: key.clone(),
                    error,
                })
        }
    }))
    .await;

    let mut analytics = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(snapshot) => analytics.push(snapshot),
            Err(error) => errors.push(error),
        }
    }

    tracing::info!(
        user_id = %user_id,
        refreshed = analytics.len(),
        failed = errors.len(),
        "Channel analytics refreshed",
    );

    Ok(Json(RefreshResponse { analytics, errors }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch and store one channel's snapshot. Errors are reported per channel
/// rather than failing the whole request.
async fn refresh_channel(
    state: &AppState,
    user_id: &str,
    channel_key: &str,
    entry: &Value,
    api_key: &str,
) -> Result<AnalyticsSnapshot, String> {
    let channel_id = entry
        .get(CHANNEL_ID_FIELD)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| "No YouTube channel ID found".to_string())?;

    let stats = state
        .directory
        .channel_statistics(channel_id, api_key)
        .await
        .map_err(|e| {
            tracing::warn!(user_id, channel_key, error = %e, "Failed to fetch channel statistics");
            e.to_string()
        })?;

    let snapshot = AnalyticsSnapshot {
        name: stats.title,
        views: stats.views,
        likes: stats.likes,
        comments: stats.comments,
        subscribers: stats.subscribers,
        timestamp: Utc::now(),
    };

    let stored = serde_json::to_value(&snapshot).map_err(|e| e.to_string())?;
    match state
        .store
        .append_analytics(user_id, channel_key, &stored)
        .await
    {
        Ok(UpdateOutcome::NotMatched) => Err("Channel no longer exists".to_string()),
        Ok(_) => Ok(snapshot),
        Err(e) => {
            tracing::error!(user_id, channel_key, error = %e, "Failed to store analytics snapshot");
            Err("Failed to store analytics".to_string())
        }
    }
}
