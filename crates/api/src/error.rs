use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tubedeck_core::error::CoreError;
use tubedeck_db::DbError;
use tubedeck_youtube::YouTubeError;

/// Everything a handler can fail with.
///
/// Rendered as `{ "error", "code" }` JSON; 304 answers carry `message`
/// instead of `error`, and an active-job conflict adds `jobId`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("YouTube API error: {0}")]
    YouTube(#[from] YouTubeError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The write matched but changed nothing (304).
    ///
    /// HTTP servers drop the body of a 304, so over the wire clients only
    /// see the status; the `message` body reaches in-process callers only.
    #[error("Not modified: {0}")]
    NotModified(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::Validation(errors.to_string()))
    }
}

const INTERNAL_MESSAGE: &str = "An internal error occurred";

type ErrorParts = (StatusCode, &'static str, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Core(CoreError::ActiveJob { job_id }) => {
                let body = json!({
                    "error": "A job is already running for this user",
                    "code": "JOB_ACTIVE",
                    "jobId": job_id,
                });
                return (StatusCode::CONFLICT, Json(body)).into_response();
            }
            AppError::NotModified(message) => {
                let body = json!({ "message": message, "code": "NOT_MODIFIED" });
                return (StatusCode::NOT_MODIFIED, Json(body)).into_response();
            }
            AppError::Core(err) => classify_core_error(err),
            AppError::Database(err) => internal(&err),
            AppError::YouTube(err) => classify_youtube_error(&err),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", message),
            AppError::InternalError(message) => internal(&message),
        };

        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}

fn classify_core_error(err: CoreError) -> ErrorParts {
    match err {
        CoreError::NotFound(message) => (StatusCode::NOT_FOUND, "NOT_FOUND", message),
        CoreError::Validation(message) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message),
        CoreError::Conflict(message) => (StatusCode::CONFLICT, "CONFLICT", message),
        CoreError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message),
        CoreError::Upstream(message) => {
            tracing::warn!(error = %message, "Upstream failure");
            (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message)
        }
        CoreError::ActiveJob { job_id } => (
            StatusCode::CONFLICT,
            "JOB_ACTIVE",
            format!("Job {job_id} is still active"),
        ),
        CoreError::Internal(message) => internal(&message),
    }
}

/// An unknown channel is the caller's problem (404); anything else is an
/// upstream failure (502) whose details stay in the server log.
fn classify_youtube_error(err: &YouTubeError) -> ErrorParts {
    match err {
        YouTubeError::ChannelNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "YouTube channel not found".to_string(),
        ),
        other => {
            tracing::warn!(error = %other, "YouTube API failure");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Failed to reach the YouTube API".to_string(),
            )
        }
    }
}

/// Log the detail; the client only sees a generic 500.
fn internal(detail: &dyn std::fmt::Display) -> ErrorParts {
    tracing::error!(error = %detail, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}
