//! In-memory registry of video maker jobs.
//!
//! Holds the latest [`JobStatus`] of every job, enforces one active job per
//! user, and forgets terminal jobs after a retention window. State is
//! process-local and lost on restart.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tubedeck_core::error::CoreError;
use tubedeck_core::job::{make_job_id, JobState, JobStatus};
use tubedeck_core::types::{JobId, UserId};

/// How long a terminal job stays queryable.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
struct Entry {
    owner: UserId,
    status: JobStatus,
}

/// Shared handle to the job table. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, Entry>>>,
    retention: Duration,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl JobRegistry {
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    /// Admit a new job for `user_id`.
    ///
    /// Fails with [`CoreError::ActiveJob`] carrying the existing id when the
    /// user already owns a job that is not terminal.
    pub async fn submit(&self, user_id: &str) -> Result<JobId, CoreError> {
        let mut jobs = self.jobs.write().await;

        let active = jobs
            .iter()
            .find(|(_, entry)| entry.owner == user_id && !entry.status.is_terminal());
        if let Some((job_id, _)) = active {
            return Err(CoreError::ActiveJob {
                job_id: job_id.clone(),
            });
        }

        let mut millis = Utc::now().timestamp_millis();
        let mut job_id = make_job_id(user_id, millis);
        while jobs.contains_key(&job_id) {
            millis += 1;
            job_id = make_job_id(user_id, millis);
        }

        jobs.insert(
            job_id.clone(),
            Entry {
                owner: user_id.to_string(),
                status: JobStatus::starting(job_id.clone()),
            },
        );
        tracing::debug!(job_id = %job_id, user_id = %user_id, "Job admitted");
        Ok(job_id)
    }

    /// Overwrite the status of a job. Returns `false` if the job is unknown.
    pub async fn update(
        &self,
        job_id: &str,
        state: JobState,
        progress: f64,
        message: Option<String>,
    ) -> bool {
        self.modify(job_id, |status| {
            status.status = state;
            status.progress = progress;
            status.message = message;
            status.error = None;
        })
        .await
    }

    /// Mark a job completed at 100%.
    pub async fn complete(&self, job_id: &str, message: impl Into<String>) -> bool {
        let message = message.into();
        self.modify(job_id, |status| {
            status.status = JobState::Completed;
            status.progress = 100.0;
            status.message = Some(message);
            status.error = None;
        })
        .await
    }

    /// Mark a job failed. The last reported progress is kept.
    pub async fn fail(&self, job_id: &str, error: impl Into<String>) -> bool {
        let error = error.into();
        self.modify(job_id, |status| {
            status.status = JobState::Error;
            status.error = Some(error);
        })
        .await
    }

    pub async fn get(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .map(|entry| entry.status.clone())
    }

    async fn modify(&self, job_id: &str, apply: impl FnOnce(&mut JobStatus)) -> bool {
        let became_terminal = {
            let mut jobs = self.jobs.write().await;
            let Some(entry) = jobs.get_mut(job_id) else {
                return false;
            };
            let was_terminal = entry.status.is_terminal();
            apply(&mut entry.status);
            !was_terminal && entry.status.is_terminal()
        };

        if became_terminal {
            self.schedule_removal(job_id.to_string());
        }
        true
    }

    /// Forget `job_id` once the retention window has passed, unless it has
    /// been moved back to a non-terminal state in the meantime.
    fn schedule_removal(&self, job_id: JobId) {
        let jobs = Arc::clone(&self.jobs);
        let retention = self.retention;
        tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            let mut jobs = jobs.write().await;
            if jobs.get(&job_id).is_some_and(|e| e.status.is_terminal()) {
                jobs.remove(&job_id);
                tracing::debug!(job_id = %job_id, "Expired job removed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn second_submit_conflicts_while_active() {
        let registry = JobRegistry::default();
        let first = registry.submit("u1").await.unwrap();

        let err = registry.submit("u1").await.unwrap_err();
        assert_matches!(err, CoreError::ActiveJob { ref job_id } if *job_id == first);

        // Other users are unaffected.
        assert!(registry.submit("u2").await.is_ok());
    }

    #[tokio::test]
    async fn running_job_still_blocks() {
        let registry = JobRegistry::default();
        let job_id = registry.submit("u1").await.unwrap();
        registry
            .update(&job_id, JobState::Running, 10.0, Some("tts".into()))
            .await;
        assert_matches!(registry.submit("u1").await, Err(CoreError::ActiveJob { .. }));
    }

    #[tokio::test]
    async fn terminal_job_allows_resubmit_with_fresh_id() {
        let registry = JobRegistry::default();
        let first = registry.submit("u1").await.unwrap();
        registry.fail(&first, "boom").await;

        let second = registry.submit("u1").await.unwrap();
        assert_ne!(first, second);
        assert!(second.starts_with("u1-"));
        // The failed job is still queryable.
        assert_eq!(registry.get(&first).await.unwrap().status, JobState::Error);
    }

    #[tokio::test]
    async fn progress_is_stored_unclamped() {
        let registry = JobRegistry::default();
        let job_id = registry.submit("u1").await.unwrap();
        assert!(registry.update(&job_id, JobState::Running, 150.0, None).await);
        assert_eq!(registry.get(&job_id).await.unwrap().progress, 150.0);
    }

    #[tokio::test]
    async fn unknown_job() {
        let registry = JobRegistry::default();
        assert!(!registry.update("nope", JobState::Running, 1.0, None).await);
        assert!(!registry.complete("nope", "done").await);
        assert!(registry.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn failure_keeps_last_progress() {
        let registry = JobRegistry::default();
        let job_id = registry.submit("u1").await.unwrap();
        registry.update(&job_id, JobState::Running, 40.0, None).await;
        registry.fail(&job_id, "crashed").await;

        let status = registry.get(&job_id).await.unwrap();
        assert_eq!(status.status, JobState::Error);
        assert_eq!(status.progress, 40.0);
        assert_eq!(status.error.as_deref(), Some("crashed"));
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_jobs_expire_after_retention() {
        let registry = JobRegistry::new(Duration::from_secs(60));
        let job_id = registry.submit("u1").await.unwrap();
        registry.complete(&job_id, "done").await;

        tokio::time::sleep(Duration::from_secs(59)).await;
        let status = registry.get(&job_id).await.unwrap();
        assert_eq!(status.status, JobState::Completed);
        assert_eq!(status.progress, 100.0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(registry.get(&job_id).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn active_jobs_never_expire() {
        let registry = JobRegistry::new(Duration::from_secs(60));
        let job_id = registry.submit("u1").await.unwrap();

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(registry.get(&job_id).await.is_some());
    }
}
