use axum::routing::{get, post};
use axum::Router;

use crate::handlers::maker;
use crate::state::AppState;

/// Routes mounted at `/maker`.
///
/// ```text
/// POST   /create-videos           admit a video job (409 if one is active)
/// GET    /job-status/{job_id}     poll a job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-videos", post(maker::create_videos))
        .route("/job-status/{job_id}", get(maker::job_status))
}
