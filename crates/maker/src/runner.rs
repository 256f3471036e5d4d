//! Runs the external video maker for an admitted job.
//!
//! The maker is invoked as `<program> <args...> <job_id>` with the job
//! payload as JSON on stdin. Each stdout line of the form
//! `{"progress": <number>, "message": "<text>"}` updates the job; other
//! lines are logged and skipped. The exit status decides the final state.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tubedeck_core::analytics::ANALYTICS_FIELD;
use tubedeck_core::job::{parse_progress_line, JobState};
use tubedeck_core::types::{JobId, UserId};

use crate::registry::JobRegistry;

/// Maximum stderr retained per job (64 KiB). Older output is dropped first.
const MAX_STDERR_BYTES: usize = 64 * 1024;

/// Characters of stderr quoted in a failure message.
const STDERR_TAIL_CHARS: usize = 2048;

pub const COMPLETED_MESSAGE: &str = "Video generation completed";

/// How to launch the maker process.
#[derive(Debug, Clone)]
pub struct MakerCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: Option<PathBuf>,
}

/// JSON document written to the maker's stdin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MakerPayload {
    pub job_id: JobId,
    pub user_id: UserId,
    pub video_count: u32,
    /// Selected channel entries keyed by channel name.
    pub channels: Map<String, Value>,
}

impl MakerPayload {
    /// Build the payload for the selected channel entries. Analytics
    /// history is left out; the maker only needs the settings.
    pub fn new(
        job_id: JobId,
        user_id: UserId,
        video_count: u32,
        channels: Map<String, Value>,
    ) -> Self {
        let channels = channels
            .into_iter()
            .map(|(name, mut entry)| {
                if let Value::Object(fields) = &mut entry {
                    fields.remove(ANALYTICS_FIELD);
                }
                (name, entry)
            })
            .collect();

        Self {
            job_id,
            user_id,
            video_count,
            channels,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("Failed to start video maker: {0}")]
    Spawn(std::io::Error),

    #[error("Failed to communicate with video maker: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode video maker input: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Spawns maker processes and reports their progress to a [`JobRegistry`].
#[derive(Debug, Clone)]
pub struct JobRunner {
    registry: JobRegistry,
    command: Arc<MakerCommand>,
}

impl JobRunner {
    pub fn new(registry: JobRegistry, command: MakerCommand) -> Self {
        Self {
            registry,
            command: Arc::new(command),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Run the job in the background. The returned handle is only useful to
    /// callers that want to await the outcome (tests); dropping it detaches.
    pub fn start(&self, payload: MakerPayload) -> JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move { runner.run(payload).await })
    }

    /// Run the job to completion, recording the outcome in the registry.
    pub async fn run(&self, payload: MakerPayload) {
        let job_id = payload.job_id.clone();

        match self.execute(&payload).await {
            Ok((status, _)) if status.success() => {
                tracing::info!(job_id = %job_id, "Video maker finished");
                self.registry.complete(&job_id, COMPLETED_MESSAGE).await;
            }
            Ok((status, stderr)) => {
                let code = status.code().unwrap_or(-1);
                let tail = stderr_tail(&stderr);
                let error = if tail.is_empty() {
                    format!("Video maker exited with code {code}")
                } else {
                    format!("Video maker exited with code {code}: {tail}")
                };
                tracing::warn!(job_id = %job_id, exit_code = code, "Video maker failed");
                self.registry.fail(&job_id, error).await;
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Video maker could not run");
                self.registry.fail(&job_id, e.to_string()).await;
            }
        }
    }

    async fn execute(&self, payload: &MakerPayload) -> Result<(ExitStatus, String), RunError> {
        let input = serde_json::to_vec(payload)?;

        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args)
            .arg(&payload.job_id)
            .env("TUBEDECK_JOB_ID", &payload.job_id)
            .env("TUBEDECK_USER_ID", &payload.user_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.command.working_directory {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(RunError::Spawn)?;
        tracing::info!(
            job_id = %payload.job_id,
            user_id = %payload.user_id,
            pid = child.id(),
            "Video maker started"
        );

        // Written alongside the stdout reader so a maker that ignores its
        // input still reports progress.
        let stdin_task = child.stdin.take().map(|mut stdin| {
            let job_id = payload.job_id.clone();
            tokio::spawn(async move {
                // The maker may exit without reading its input.
                if let Err(e) = stdin.write_all(&input).await {
                    tracing::debug!(job_id = %job_id, error = %e, "Maker closed stdin early");
                }
            })
        });
        let stderr_task = tokio::spawn(read_tail(child.stderr.take()));

        if let Some(stdout) = child.stdout.take() {
            self.follow_progress(&payload.job_id, stdout).await;
        }

        let status = child.wait().await?;
        if let Some(task) = stdin_task {
            task.abort();
        }
        let stderr_bytes = stderr_task.await.unwrap_or_default();
        Ok((status, String::from_utf8_lossy(&stderr_bytes).into_owned()))
    }

    /// Apply every progress line on `stdout` until the stream closes.
    async fn follow_progress<R: AsyncRead + Unpin>(&self, job_id: &str, stdout: R) {
        let mut lines = BufReader::new(stdout).split(b'\n');
        loop {
            let raw = match lines.next_segment().await {
                Ok(Some(raw)) => raw,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(job_id = %job_id, error = %e, "Failed reading maker output");
                    break;
                }
            };

            let line = String::from_utf8_lossy(&raw);
            if line.trim().is_empty() {
                continue;
            }

            match parse_progress_line(&line) {
                Ok(event) => {
                    tracing::debug!(job_id = %job_id, progress = event.progress, "Maker progress");
                    self.registry
                        .update(job_id, JobState::Running, event.progress, event.message)
                        .await;
                }
                Err(e) => {
                    tracing::warn!(job_id = %job_id, line = %line.trim(), error = %e, "Ignoring maker output line");
                }
            }
        }
    }
}

/// Drain a stream, keeping at most the last [`MAX_STDERR_BYTES`].
async fn read_tail<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut kept = Vec::new();
    let Some(mut handle) = handle else {
        return kept;
    };

    let mut chunk = [0u8; 8192];
    loop {
        match handle.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                kept.extend_from_slice(&chunk[..n]);
                if kept.len() > MAX_STDERR_BYTES {
                    kept.drain(..kept.len() - MAX_STDERR_BYTES);
                }
            }
        }
    }
    kept
}

fn stderr_tail(stderr: &str) -> &str {
    let trimmed = stderr.trim();
    let start = trimmed
        .char_indices()
        .rev()
        .nth(STDERR_TAIL_CHARS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &trimmed[start..]
}
