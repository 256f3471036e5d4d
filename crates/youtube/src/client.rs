//! REST client for the `channels` and `search` endpoints.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tubedeck_core::channel_url::ChannelRef;

use crate::{ChannelDirectory, ChannelInfo, ChannelStatistics, YouTubeError};

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// HTTP client for the YouTube Data API.
#[derive(Clone)]
pub struct YouTubeClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
    subscriber_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    snippet: Option<Snippet>,
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl YouTubeClient {
    /// * `base_url` - API root, e.g. [`DEFAULT_API_BASE_URL`].
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `GET /channels` with a single selector (`id`, `forHandle`, `forUsername`).
    async fn list_channels(
        &self,
        part: &str,
        selector: (&str, &str),
        api_key: &str,
    ) -> Result<Vec<ChannelItem>, YouTubeError> {
        let response = self
            .client
            .get(format!("{}/channels", self.base_url))
            .query(&[("part", part), selector, ("key", api_key)])
            .send()
            .await?;

        let list: ListResponse<ChannelItem> = Self::parse_response(response).await?;
        Ok(list.items)
    }

    /// `GET /search?type=channel`, returning the best match.
    async fn search_channel(&self, query: &str, api_key: &str) -> Result<ChannelInfo, YouTubeError> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("type", "channel"),
                ("maxResults", "1"),
                ("q", query),
                ("key", api_key),
            ])
            .send()
            .await?;

        let list: ListResponse<SearchItem> = Self::parse_response(response).await?;
        list.items
            .into_iter()
            .find_map(|item| {
                let id = item.id.channel_id?;
                let title = item.snippet.map(|s| s.title).unwrap_or_default();
                Some(ChannelInfo { id, title })
            })
            .ok_or(YouTubeError::ChannelNotFound)
    }

    // ---- private helpers ----

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, YouTubeError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(YouTubeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| YouTubeError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChannelDirectory for YouTubeClient {
    async fn resolve_channel(
        &self,
        channel: &ChannelRef,
        api_key: &str,
    ) -> Result<ChannelInfo, YouTubeError> {
        let selector = match channel {
            ChannelRef::Id(id) => ("id", id.as_str()),
            ChannelRef::Handle(handle) => ("forHandle", handle.as_str()),
            ChannelRef::Username(name) => ("forUsername", name.as_str()),
            ChannelRef::Custom(name) => return self.search_channel(name, api_key).await,
        };

        let items = self.list_channels("snippet", selector, api_key).await?;
        let item = items.into_iter().next().ok_or(YouTubeError::ChannelNotFound)?;
        tracing::debug!(channel_id = %item.id, "Resolved YouTube channel");

        Ok(ChannelInfo {
            title: item.snippet.map(|s| s.title).unwrap_or_default(),
            id: item.id,
        })
    }

    async fn channel_statistics(
        &self,
        channel_id: &str,
        api_key: &str,
    ) -> Result<ChannelStatistics, YouTubeError> {
        let items = self
            .list_channels("statistics,snippet", ("id", channel_id), api_key)
            .await?;
        let item = items.into_iter().next().ok_or(YouTubeError::ChannelNotFound)?;

        let title = item.snippet.map(|s| s.title).unwrap_or_default();
        let stats = item
            .statistics
            .ok_or_else(|| YouTubeError::Decode("missing statistics".into()))?;

        Ok(ChannelStatistics {
            title,
            views: parse_count(stats.view_count.as_deref()),
            likes: parse_count(stats.like_count.as_deref()),
            comments: parse_count(stats.comment_count.as_deref()),
            subscribers: parse_count(stats.subscriber_count.as_deref()),
        })
    }
}

/// Counts arrive as decimal strings; anything unparseable is 0.
fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}
