//! Video maker job model and the progress-line contract of the maker process.
//!
//! The maker writes newline-delimited JSON to stdout. Every line that parses
//! as a [`ProgressEvent`] advances the job; anything else is ignored by the
//! runner.

use serde::{Deserialize, Serialize};

use crate::types::JobId;

/// Lifecycle label of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Starting,
    Running,
    Completed,
    Error,
}

impl JobState {
    /// `completed` and `error` are terminal: no further updates are expected.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Starting => "starting",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Error => "error",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest known status of a job, as returned by the job-status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub job_id: JobId,
    pub status: JobState,
    /// Nominally 0-100. Stored exactly as reported, never clamped.
    pub progress: f64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatus {
    pub fn starting(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobState::Starting,
            progress: 0.0,
            message: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One progress record emitted by the maker on stdout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressEvent {
    pub progress: f64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Parse a single stdout line into a [`ProgressEvent`].
pub fn parse_progress_line(line: &str) -> Result<ProgressEvent, serde_json::Error> {
    serde_json::from_str(line.trim())
}

/// Build a job id from the owning user and a millisecond timestamp.
pub fn make_job_id(user_id: &str, millis: i64) -> JobId {
    format!("{user_id}-{millis}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!JobState::Starting.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Error.is_terminal());
    }

    #[test]
    fn status_serializes_with_camel_case_and_lowercase_state() {
        let status = JobStatus::starting("u1-1".into());
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["jobId"], "u1-1");
        assert_eq!(json["status"], "starting");
        assert_eq!(json["progress"], 0.0);
        assert!(json["message"].is_null());
    }

    #[test]
    fn parses_progress_with_message() {
        let event = parse_progress_line(r#"{"progress": 42.5, "message": "Rendering"}"#).unwrap();
        assert_eq!(event.progress, 42.5);
        assert_eq!(event.message.as_deref(), Some("Rendering"));
    }

    #[test]
    fn parses_progress_without_message_and_extra_fields() {
        let event = parse_progress_line(r#"  {"progress": 10, "stage": "tts"}  "#).unwrap();
        assert_eq!(event.progress, 10.0);
        assert!(event.message.is_none());
    }

    #[test]
    fn rejects_plain_text_and_missing_progress() {
        assert!(parse_progress_line("Downloading assets...").is_err());
        assert!(parse_progress_line(r#"{"message": "no progress"}"#).is_err());
        assert!(parse_progress_line(r#"{"progress": "50"}"#).is_err());
    }

    #[test]
    fn out_of_range_progress_is_kept() {
        let event = parse_progress_line(r#"{"progress": 150}"#).unwrap();
        assert_eq!(event.progress, 150.0);
    }

    #[test]
    fn job_id_format() {
        assert_eq!(make_job_id("u1", 1_729_350_000_000), "u1-1729350000000");
    }
}
