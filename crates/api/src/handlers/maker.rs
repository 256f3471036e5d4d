//! Handlers for the `/maker` resource: admitting video generation jobs and
//! polling their status.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use tubedeck_core::error::CoreError;
use tubedeck_core::job::JobStatus;
use tubedeck_core::types::{JobId, UserId};
use tubedeck_maker::MakerPayload;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::handlers::channel_settings::find_user;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /maker/create-videos`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideosRequest {
    #[validate(length(min = 1, message = "userId must not be empty"))]
    pub user_id: UserId,
    #[validate(length(min = 1, message = "channelNames must not be empty"))]
    pub channel_names: Vec<String>,
    #[validate(range(min = 1, message = "videoCount must be at least 1"))]
    pub video_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStarted {
    pub job_id: JobId,
    pub status: &'static str,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/maker/create-videos
///
/// Admit a generation job for the selected channels and start the video
/// maker in the background. A user with a job still in progress gets 409
/// carrying that job's id.
pub async fn create_videos(
    State(state): State<AppState>,
    _auth: AuthUser,
    AppJson(input): AppJson<CreateVideosRequest>,
) -> AppResult<(StatusCode, Json<JobStarted>)> {
    input.validate()?;

    let user = find_user(&state, &input.user_id).await?;

    let mut channels = Map::new();
    for name in &input.channel_names {
        match user.channel(name) {
            Some(entry) => {
                channels.insert(name.clone(), entry.clone());
            }
            None => tracing::debug!(user_id = %input.user_id, channel_key = %name, "Skipping unknown channel"),
        }
    }
    if channels.is_empty() {
        return Err(AppError::BadRequest(
            "None of the requested channels exist".into(),
        ));
    }

    let job_id = state.jobs().submit(&input.user_id).await?;

    let message = format!(
        "Queued {} videos for channels: {}",
        input.video_count,
        channels.keys().cloned().collect::<Vec<_>>().join(", "),
    );

    tracing::info!(
        job_id = %job_id,
        user_id = %input.user_id,
        video_count = input.video_count,
        channels = channels.len(),
        "Video job admitted",
    );

    state.runner.start(MakerPayload::new(
        job_id.clone(),
        input.user_id,
        input.video_count,
        channels,
    ));

    Ok((
        StatusCode::ACCEPTED,
        Json(JobStarted {
            job_id,
            status: "started",
            message,
        }),
    ))
}

/// GET /api/maker/job-status/{job_id}
pub async fn job_status(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(job_id): Path<JobId>,
) -> AppResult<Json<JobStatus>> {
    state
        .jobs()
        .get(&job_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::Core(CoreError::NotFound("Job not found".into())))
}
