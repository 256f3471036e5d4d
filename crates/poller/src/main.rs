//! `tubedeck-poller` -- submit a video job and follow it to the end.
//!
//! Logs in, resumes the job named in the cache file if there is one,
//! otherwise submits a new job for `TUBEDECK_CHANNELS`, then prints one
//! progress line per status update. See [`PollerConfig::from_lookup`] for
//! the environment variables.

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubedeck_poller::config::PollerConfig;
use tubedeck_poller::{ApiClient, JobCache, JobPoller, PollState, Submission};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tubedeck_poller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PollerConfig::from_env().context("Invalid poller configuration")?;

    let mut client = ApiClient::new(config.api_url.clone());
    let user_id = client
        .login(&config.username, &config.passcode)
        .await
        .context("Login failed")?;
    tracing::info!(user_id = %user_id, api_url = %config.api_url, "Logged in");

    let mut poller = JobPoller::new(client.clone()).with_cache(JobCache::new(&config.job_cache));

    if poller.resume().await.is_none() {
        if config.channels.is_empty() {
            bail!("TUBEDECK_CHANNELS must name at least one channel");
        }

        let submission = client
            .create_videos(&user_id, &config.channels, config.video_count)
            .await
            .context("Failed to submit video job")?;
        match &submission {
            Submission::Started(job_id) => tracing::info!(job_id = %job_id, "Job started"),
            Submission::AlreadyRunning(job_id) => {
                tracing::info!(job_id = %job_id, "Following the job already in progress")
            }
        }
        poller.track(submission.job_id()).await;
    }

    let outcome = poller
        .run(|status| {
            println!(
                "{:>6.1}%  {:<9}  {}",
                status.progress,
                status.status.as_str(),
                status.message.as_deref().unwrap_or(""),
            );
        })
        .await;

    match outcome {
        PollState::Completed(status) => {
            println!("{}", status.message.as_deref().unwrap_or("Done"));
            Ok(())
        }
        PollState::Error(message) => bail!("Job failed: {message}"),
        PollState::Idle | PollState::Polling(_) => Ok(()),
    }
}
