//! REST client for the tubedeck API endpoints the poller needs: login, job
//! submission and job status.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tubedeck_core::job::JobStatus;
use tubedeck_core::types::{JobId, UserId};

use crate::poller::JobStatusSource;

/// HTTP client for a tubedeck API server.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Errors from the API client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server no longer knows the job (finished long ago, or restarted).
    #[error("Job {0} not found")]
    JobNotFound(JobId),

    /// The server answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected API response: {0}")]
    Decode(String),
}

/// Outcome of a job submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Started(JobId),
    /// The user already had a job in progress; this is its id.
    AlreadyRunning(JobId),
}

impl Submission {
    pub fn job_id(&self) -> &str {
        match self {
            Submission::Started(id) | Submission::AlreadyRunning(id) => id,
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    user_id: UserId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateVideosRequest<'a> {
    user_id: &'a str,
    channel_names: &'a [String],
    video_count: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStarted {
    job_id: JobId,
}

/// `{ error, code, jobId? }` returned by the server on failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: Option<String>,
    job_id: Option<JobId>,
}

impl ApiClient {
    /// * `base_url` - Server root, e.g. `http://localhost:3001`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Use an already issued bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// `POST /api/auth/login`. The returned token is used for every later
    /// request; the user id is returned.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<UserId, ClientError> {
        let response = self
            .client
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let login: LoginResponse = Self::parse_response(response).await?;
        self.token = Some(login.token);
        Ok(login.user_id)
    }

    /// `POST /api/maker/create-videos`.
    ///
    /// A 409 that names the user's active job is not an error: the caller
    /// follows that job instead.
    pub async fn create_videos(
        &self,
        user_id: &str,
        channel_names: &[String],
        video_count: u32,
    ) -> Result<Submission, ClientError> {
        let response = self
            .authorized(self.client.post(format!("{}/api/maker/create-videos", self.base_url)))
            .json(&CreateVideosRequest {
                user_id,
                channel_names,
                video_count,
            })
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            return match body.job_id {
                Some(job_id) => Ok(Submission::AlreadyRunning(job_id)),
                None => Err(ClientError::Api {
                    status: 409,
                    message: body.error.unwrap_or_else(|| "Conflict".into()),
                }),
            };
        }

        let started: JobStarted = Self::parse_response(response).await?;
        Ok(Submission::Started(started.job_id))
    }

    /// `GET /api/maker/job-status/{job_id}`.
    pub async fn job_status(&self, job_id: &str) -> Result<JobStatus, ClientError> {
        let response = self
            .authorized(
                self.client
                    .get(format!("{}/api/maker/job-status/{job_id}", self.base_url)),
            )
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::JobNotFound(job_id.to_string()));
        }

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or(body);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl JobStatusSource for ApiClient {
    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ClientError> {
        ApiClient::job_status(self, job_id).await
    }
}
