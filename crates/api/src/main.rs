use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubedeck_api::config::{LogFormat, ServerConfig, StoreConfig};
use tubedeck_api::router::build_app_router;
use tubedeck_api::state::AppState;
use tubedeck_db::{MemorySettingsStore, MongoSettingsStore, SettingsStore};
use tubedeck_maker::{JobRegistry, JobRunner};
use tubedeck_youtube::YouTubeClient;

const DEFAULT_LOG_FILTER: &str = "tubedeck_api=debug,tubedeck_maker=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    init_tracing(config.log_format);
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let store = open_store(&config.store).await?;

    let directory = Arc::new(YouTubeClient::new(config.youtube_api_base_url.clone()));
    let registry = JobRegistry::new(Duration::from_secs(config.maker.retention_secs));
    let runner = JobRunner::new(registry, config.maker.command());
    tracing::info!(program = %config.maker.program, "Video maker configured");

    let state = AppState {
        store,
        directory,
        runner,
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config);

    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Running maker subprocesses are not tracked past this point.
    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Open the configured settings store.
///
/// MongoDB stores are migrated from the legacy layout and indexed before
/// the server starts taking requests.
async fn open_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn SettingsStore>> {
    match config {
        StoreConfig::Mongo {
            uri,
            database,
            settings_collection,
            users_collection,
        } => {
            let db = tubedeck_db::connect(uri, database)
                .await
                .context("Failed to connect to MongoDB")?;
            tubedeck_db::health_check(&db)
                .await
                .context("MongoDB health check failed")?;
            tracing::info!(database = %database, "MongoDB connection established");

            let store = MongoSettingsStore::new(db, settings_collection, users_collection);
            let report = store
                .migrate_legacy()
                .await
                .context("Failed to migrate legacy documents")?;
            if report.settings > 0 || report.users > 0 {
                tracing::info!(
                    settings = report.settings,
                    users = report.users,
                    "Migrated legacy documents",
                );
            }
            store
                .ensure_indexes()
                .await
                .context("Failed to create indexes")?;

            Ok(Arc::new(store))
        }
        StoreConfig::Seed { path } => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read seed file {}", path.display()))?;
            let seed = serde_json::from_str(&raw).context("Seed file is not valid JSON")?;
            let store = MemorySettingsStore::from_seed(seed).context("Invalid seed data")?;
            tracing::warn!(path = %path.display(), "Using in-memory settings store; changes are not persisted");

            Ok(Arc::new(store))
        }
    }
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
