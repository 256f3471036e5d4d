/// User identifier. Also used as the dynamic top-level field name of the
/// user's settings document.
pub type UserId = String;

/// Job identifier, `"<userId>-<unix millis>"`.
pub type JobId = String;

/// Timestamp type used across the workspace.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
