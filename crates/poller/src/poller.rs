//! Job status polling.
//!
//! ```text
//! Idle --track/resume--> Polling(job_id) --terminal status--> Completed | Error
//!                                        --job unknown------> Error
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tubedeck_core::job::{JobState, JobStatus};
use tubedeck_core::types::JobId;

use crate::cache::JobCache;
use crate::client::ClientError;

/// Delay between two status requests for a job that is still running.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Where job statuses come from.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ClientError>;
}

#[async_trait]
impl<T: JobStatusSource + ?Sized> JobStatusSource for Arc<T> {
    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ClientError> {
        (**self).job_status(job_id).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Idle,
    Polling(JobId),
    Completed(JobStatus),
    Error(String),
}

impl PollState {
    pub fn is_finished(&self) -> bool {
        matches!(self, PollState::Completed(_) | PollState::Error(_))
    }
}

/// Follows one job at a time until it reaches a terminal status.
///
/// Dropping the poller abandons polling; the job keeps running server-side.
pub struct JobPoller<S> {
    source: S,
    cache: Option<JobCache>,
    interval: Duration,
    state: PollState,
}

impl<S: JobStatusSource> JobPoller<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: None,
            interval: POLL_INTERVAL,
            state: PollState::Idle,
        }
    }

    /// Remember the followed job id in `cache` across runs.
    pub fn with_cache(mut self, cache: JobCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Start following `job_id`.
    pub async fn track(&mut self, job_id: impl Into<JobId>) {
        let job_id = job_id.into();
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&job_id).await {
                tracing::warn!(job_id = %job_id, path = %cache.path().display(), error = %e, "Failed to cache job id");
            }
        }
        self.state = PollState::Polling(job_id);
    }

    /// Pick up a job id left in the cache by an earlier run.
    ///
    /// Returns the id when one was found; the poller is then `Polling`.
    pub async fn resume(&mut self) -> Option<JobId> {
        let cache = self.cache.as_ref()?;
        match cache.load().await {
            Ok(Some(job_id)) => {
                tracing::info!(job_id = %job_id, "Resuming cached job");
                self.state = PollState::Polling(job_id.clone());
                Some(job_id)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(path = %cache.path().display(), error = %e, "Failed to read job cache");
                None
            }
        }
    }

    /// Poll until the followed job finishes, passing every status received
    /// to `on_progress`. Returns the final state; an `Idle` poller returns
    /// immediately.
    pub async fn run(&mut self, mut on_progress: impl FnMut(&JobStatus)) -> &PollState {
        while let PollState::Polling(job_id) = &self.state {
            let job_id = job_id.clone();

            match self.source.job_status(&job_id).await {
                Ok(status) => {
                    on_progress(&status);
                    if !status.is_terminal() {
                        tokio::time::sleep(self.interval).await;
                        continue;
                    }

                    self.clear_cache().await;
                    self.state = match status.status {
                        JobState::Completed => PollState::Completed(status),
                        _ => PollState::Error(
                            status
                                .error
                                .or(status.message)
                                .unwrap_or_else(|| "Video generation failed".into()),
                        ),
                    };
                }
                Err(ClientError::JobNotFound(_)) => {
                    tracing::warn!(job_id = %job_id, "Job no longer known to the server");
                    self.clear_cache().await;
                    self.state = PollState::Error(format!("Job {job_id} not found"));
                }
                Err(e) => {
                    // The cached id is kept so a later run can resume.
                    tracing::warn!(job_id = %job_id, error = %e, "Polling failed");
                    self.state = PollState::Error(e.to_string());
                }
            }
        }

        &self.state
    }

    async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear().await {
                tracing::warn!(path = %cache.path().display(), error = %e, "Failed to clear job cache");
            }
        }
    }
}
