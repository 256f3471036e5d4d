//! Client side of video jobs: submit a job to the API server, then follow
//! its status until it finishes.
//!
//! The job id being followed is kept in a small cache file so an
//! interrupted client picks the same job up again on its next run.

pub mod cache;
pub mod client;
pub mod config;
pub mod poller;

pub use cache::JobCache;
pub use client::{ApiClient, ClientError, Submission};
pub use poller::{JobPoller, JobStatusSource, PollState, POLL_INTERVAL};
