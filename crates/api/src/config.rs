use std::path::PathBuf;
use std::str::FromStr;

use axum::http::HeaderValue;

use tubedeck_maker::MakerCommand;
use tubedeck_youtube::DEFAULT_API_BASE_URL;

use crate::auth::jwt::JwtConfig;

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

/// Where user settings and login records live.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    Mongo {
        uri: String,
        database: String,
        settings_collection: String,
        users_collection: String,
    },
    /// In-memory store seeded from a JSON file (development only).
    Seed { path: PathBuf },
}

/// How the video maker is launched.
#[derive(Debug, Clone, PartialEq)]
pub struct MakerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: Option<PathBuf>,
    /// Seconds a finished job stays queryable.
    pub retention_secs: u64,
}

impl MakerConfig {
    pub fn command(&self) -> MakerCommand {
        MakerCommand {
            program: self.program.clone(),
            args: self.args.clone(),
            working_directory: self.working_directory.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3001`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub store: StoreConfig,
    pub maker: MakerConfig,
    pub youtube_api_base_url: String,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                | Default                                  |
    /// |------------------------|------------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                                |
    /// | `PORT`                 | `3001`                                   |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`                  |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                     |
    /// | `JWT_SECRET`           | required                                 |
    /// | `JWT_EXPIRY_MINS`      | `60`                                     |
    /// | `MONGODB_URI`          | required unless `SETTINGS_SEED_FILE` set |
    /// | `MONGODB_DATABASE`     | `YouTube-Dashboard`                      |
    /// | `SETTINGS_COLLECTION`  | `everything`                             |
    /// | `USERS_COLLECTION`     | `users`                                  |
    /// | `SETTINGS_SEED_FILE`   | unset                                    |
    /// | `MAKER_PROGRAM`        | `python3`                                |
    /// | `MAKER_ARGS`           | `main.py`                                |
    /// | `MAKER_WORKING_DIR`    | unset                                    |
    /// | `JOB_RETENTION_SECS`   | `1800`                                   |
    /// | `YOUTUBE_API_BASE_URL` | `https://www.googleapis.com/youtube/v3`  |
    /// | `LOG_FORMAT`           | `text` (`json` for JSON lines)           |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let cors_origins: Vec<String> = get("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(bad) = cors_origins
            .iter()
            .find(|origin| HeaderValue::from_str(origin).is_err())
        {
            return Err(ConfigError::Invalid {
                var: "CORS_ORIGINS",
                value: bad.clone(),
                reason: "not a valid header value".into(),
            });
        }

        let store = match (lookup("MONGODB_URI"), lookup("SETTINGS_SEED_FILE")) {
            (Some(uri), _) if !uri.is_empty() => StoreConfig::Mongo {
                uri,
                database: get("MONGODB_DATABASE", "YouTube-Dashboard"),
                settings_collection: get("SETTINGS_COLLECTION", "everything"),
                users_collection: get("USERS_COLLECTION", "users"),
            },
            (_, Some(path)) if !path.is_empty() => StoreConfig::Seed { path: path.into() },
            _ => return Err(ConfigError::Missing("MONGODB_URI")),
        };

        let maker = MakerConfig {
            program: get("MAKER_PROGRAM", "python3"),
            args: get("MAKER_ARGS", "main.py")
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            working_directory: lookup("MAKER_WORKING_DIR")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            retention_secs: parse_var(&lookup, "JOB_RETENTION_SECS", 1800)?,
        };

        let log_format = match get("LOG_FORMAT", "text").to_ascii_lowercase().as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    value: other.to_string(),
                    reason: "expected 'text' or 'json'".into(),
                })
            }
        };

        Ok(Self {
            host: get("HOST", "0.0.0.0"),
            port: parse_var(&lookup, "PORT", 3001)?,
            cors_origins,
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            jwt: JwtConfig::from_lookup(&lookup)?,
            store,
            maker,
            youtube_api_base_url: get("YOUTUBE_API_BASE_URL", DEFAULT_API_BASE_URL),
            log_format,
        })
    }
}

/// Parse `var` if set, otherwise return `default`.
pub(crate) fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[("JWT_SECRET", "s"), ("MONGODB_URI", "mongodb://localhost")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.jwt.expiry_mins, 60);
        assert_eq!(
            config.store,
            StoreConfig::Mongo {
                uri: "mongodb://localhost".into(),
                database: "YouTube-Dashboard".into(),
                settings_collection: "everything".into(),
                users_collection: "users".into(),
            }
        );
        assert_eq!(config.maker.program, "python3");
        assert_eq!(config.maker.args, vec!["main.py"]);
        assert_eq!(config.maker.retention_secs, 1800);
        assert_eq!(config.youtube_api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn seed_file_replaces_mongo() {
        let config = load(&[("JWT_SECRET", "s"), ("SETTINGS_SEED_FILE", "seed.json")]).unwrap();
        assert_eq!(config.store, StoreConfig::Seed { path: "seed.json".into() });
    }

    #[test]
    fn store_is_required() {
        assert_matches!(load(&[("JWT_SECRET", "s")]), Err(ConfigError::Missing("MONGODB_URI")));
    }

    #[test]
    fn maker_settings() {
        let config = load(&[
            ("JWT_SECRET", "s"),
            ("MONGODB_URI", "mongodb://db"),
            ("MAKER_PROGRAM", "/opt/maker/run"),
            ("MAKER_ARGS", "  --quiet   --fast "),
            ("MAKER_WORKING_DIR", "/opt/maker"),
            ("JOB_RETENTION_SECS", "60"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
        ])
        .unwrap();
        assert_eq!(config.maker.args, vec!["--quiet", "--fast"]);
        assert_eq!(config.maker.working_directory, Some(PathBuf::from("/opt/maker")));
        assert_eq!(config.maker.retention_secs, 60);
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn invalid_numbers_and_formats() {
        assert_matches!(
            load(&[("JWT_SECRET", "s"), ("MONGODB_URI", "m"), ("PORT", "eighty")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        );
        assert_matches!(
            load(&[("JWT_SECRET", "s"), ("MONGODB_URI", "m"), ("LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid { var: "LOG_FORMAT", .. })
        );
        assert_matches!(
            load(&[("JWT_SECRET", "s"), ("MONGODB_URI", "m"), ("CORS_ORIGINS", "http://a\nb")]),
            Err(ConfigError::Invalid { var: "CORS_ORIGINS", .. })
        );
    }
}
