//! CLI subcommands and the wiring they share

pub mod clear;
pub mod config;
pub mod status;
pub mod submit;
pub mod sync;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use leadq_cache::{DatabasePool, SqliteDeviceIdentity, SqliteQueueStore};
use leadq_core::config::Config;
use leadq_core::ports::IConnectivityProbe;
use leadq_endpoint::probe::HttpConnectivityProbe;
use leadq_endpoint::provider::HttpDeliveryEndpoint;
use leadq_sync::engine::{SyncEngine, SyncEngineConfig};
use leadq_sync::notifier::LogNotificationService;
use tracing::info;

/// Loads the configuration file; a missing file yields the defaults
pub(crate) fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        info!(config_path = %path.display(), "No configuration file, using defaults");
        return Ok(Config::default());
    }

    let config = Config::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    info!(config_path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Fails with every validation message joined into one error
pub(crate) fn ensure_valid(config: &Config) -> Result<()> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(());
    }

    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    anyhow::bail!("Invalid configuration: {}", messages.join("; "))
}

/// Builds an engine over the configured queue database and endpoint
///
/// Also returns the pool so callers can open more adapters on it.
pub(crate) async fn open_engine(config: &Config) -> Result<(DatabasePool, Arc<SyncEngine>)> {
    let db = DatabasePool::new(&config.queue.database)
        .await
        .with_context(|| {
            format!(
                "Failed to open queue database {}",
                config.queue.database.display()
            )
        })?;
    let store = Arc::new(SqliteQueueStore::new(db.pool().clone()));

    let endpoint = HttpDeliveryEndpoint::from_config(&config.endpoint)
        .context("Failed to create endpoint client")?;

    let engine = Arc::new(SyncEngine::new(
        store,
        Arc::new(endpoint),
        Arc::new(LogNotificationService::new()),
        SyncEngineConfig::from_config(config),
    ));
    Ok((db, engine))
}

/// Everything a sending command needs: engine, identity and probe
pub(crate) struct Session {
    pub engine: Arc<SyncEngine>,
    pub identity: Arc<SqliteDeviceIdentity>,
    probe: HttpConnectivityProbe,
}

impl Session {
    pub async fn open(config_path: &Path) -> Result<Self> {
        let config = load_config(config_path)?;
        ensure_valid(&config)?;

        let (db, engine) = open_engine(&config).await?;
        let identity = Arc::new(SqliteDeviceIdentity::new(db.pool().clone()));
        let probe = HttpConnectivityProbe::new(config.probe_url())
            .context("Failed to create connectivity probe")?;

        Ok(Self {
            engine,
            identity,
            probe,
        })
    }

    /// Probes the endpoint and records the result on the engine
    pub async fn refresh_reachability(&self) -> bool {
        let reachable = self.probe.is_reachable().await;
        self.engine.set_reachable(reachable).await;
        info!(url = %self.probe.url(), reachable, "Connectivity checked");
        reachable
    }
}
