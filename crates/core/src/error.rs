#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The user already owns a job that has not reached a terminal status.
    #[error("Job {job_id} is still active")]
    ActiveJob { job_id: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A third-party service (YouTube, the video maker) failed.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
