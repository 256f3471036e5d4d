use std::sync::Arc;

use tubedeck_db::SettingsStore;
use tubedeck_maker::{JobRegistry, JobRunner};
use tubedeck_youtube::ChannelDirectory;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// User settings and login records.
    pub store: Arc<dyn SettingsStore>,
    /// YouTube channel lookup.
    pub directory: Arc<dyn ChannelDirectory>,
    /// Video maker launcher; owns the job registry.
    pub runner: JobRunner,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn jobs(&self) -> &JobRegistry {
        self.runner.registry()
    }
}
