//! Environment configuration of the `tubedeck-poller` binary.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    pub api_url: String,
    pub username: String,
    pub passcode: String,
    /// Channels to generate for. May be empty when only resuming a cached job.
    pub channels: Vec<String>,
    pub video_count: u32,
    pub job_cache: PathBuf,
}

impl PollerConfig {
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `TUBEDECK_API_URL`     | `http://localhost:3001` |
    /// | `TUBEDECK_USERNAME`    | required                |
    /// | `TUBEDECK_PASSCODE`    | required                |
    /// | `TUBEDECK_CHANNELS`    | empty (comma separated) |
    /// | `TUBEDECK_VIDEO_COUNT` | `1`                     |
    /// | `TUBEDECK_JOB_CACHE`   | `.tubedeck-job`         |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let video_count = match lookup("TUBEDECK_VIDEO_COUNT") {
            None => 1,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "TUBEDECK_VIDEO_COUNT",
                        value: raw,
                        reason: "expected a positive integer".into(),
                    })
                }
            },
        };

        Ok(Self {
            api_url: lookup("TUBEDECK_API_URL").unwrap_or_else(|| "http://localhost:3001".into()),
            username: required("TUBEDECK_USERNAME")?,
            passcode: required("TUBEDECK_PASSCODE")?,
            channels: lookup("TUBEDECK_CHANNELS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            video_count,
            job_cache: lookup("TUBEDECK_JOB_CACHE")
                .unwrap_or_else(|| ".tubedeck-job".into())
                .into(),
        })
    }
}
