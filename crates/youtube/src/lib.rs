//! YouTube Data API v3 client.
//!
//! The HTTP layer depends on the [`ChannelDirectory`] trait only, so tests
//! can substitute a fake directory for the network client.

pub mod client;

pub use client::{YouTubeClient, DEFAULT_API_BASE_URL};

use async_trait::async_trait;
use serde::Serialize;
use tubedeck_core::channel_url::ChannelRef;

/// A resolved channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    pub id: String,
    pub title: String,
}

/// Public counters of a channel. Counts the API omits or hides read as 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelStatistics {
    pub title: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub subscribers: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum YouTubeError {
    #[error("Channel not found")]
    ChannelNotFound,

    /// The request itself failed (network, DNS, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("YouTube API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected YouTube API response: {0}")]
    Decode(String),
}

/// Lookup of channels and their statistics.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    async fn resolve_channel(
        &self,
        channel: &ChannelRef,
        api_key: &str,
    ) -> Result<ChannelInfo, YouTubeError>;

    async fn channel_statistics(
        &self,
        channel_id: &str,
        api_key: &str,
    ) -> Result<ChannelStatistics, YouTubeError>;
}
