//! LeadQ Daemon - Background queue draining service
//!
//! This binary runs next to the booth front end and handles:
//! - Periodic connectivity probing of the lead endpoint
//! - Draining the local queue on reconnect, on a timer and on request
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon wires the SQLite queue, the HTTP endpoint and the probe into a
//! `SyncEngine`, then hands it to a `DrainScheduler`. The scheduler loop is
//! controlled by a `CancellationToken` that is triggered on receipt of
//! SIGTERM or SIGINT. SIGUSR1 requests an immediate drain.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use leadq_cache::{DatabasePool, SqliteQueueStore};
use leadq_core::config::{Config, LoggingConfig};
use leadq_core::ports::ConnectivityEvent;
use leadq_endpoint::probe::HttpConnectivityProbe;
use leadq_endpoint::provider::HttpDeliveryEndpoint;
use leadq_sync::engine::{SyncEngine, SyncEngineConfig};
use leadq_sync::notifier::LogNotificationService;
use leadq_sync::scheduler::{DrainScheduler, SchedulerCommand, SchedulerConfig};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "leadqd", version, about = "LeadQ background sync service")]
struct Args {
    /// Use alternate config file
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// DaemonService
// ============================================================================

/// Owns the engine and everything needed to schedule its drains
struct DaemonService {
    config: Config,
    engine: Arc<SyncEngine>,
    probe: Option<Arc<HttpConnectivityProbe>>,
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Opens the queue database and builds the engine
    async fn new(config: Config, shutdown: CancellationToken) -> Result<Self> {
        let db_pool = DatabasePool::new(&config.queue.database)
            .await
            .context("Failed to open queue database")?;
        let store = Arc::new(SqliteQueueStore::new(db_pool.pool().clone()));

        let endpoint = HttpDeliveryEndpoint::from_config(&config.endpoint)
            .context("Failed to create endpoint client")?;

        let probe = if config.probing_enabled() {
            let probe = HttpConnectivityProbe::new(config.probe_url())
                .context("Failed to create connectivity probe")?;
            Some(Arc::new(probe))
        } else {
            None
        };

        let engine = Arc::new(SyncEngine::new(
            store,
            Arc::new(endpoint),
            Arc::new(LogNotificationService::new()),
            SyncEngineConfig::from_config(&config),
        ));

        info!(
            database = %config.queue.database.display(),
            endpoint = %config.endpoint.url,
            probing = config.probing_enabled(),
            "Daemon service initialized"
        );

        Ok(Self {
            config,
            engine,
            probe,
            shutdown,
        })
    }

    /// Runs the drain scheduler until shutdown
    async fn run(self) -> Result<()> {
        // Held for the lifetime of the loop so the scheduler does not see
        // the connectivity channel as closed.
        let (_connectivity_tx, connectivity_rx) = mpsc::channel::<ConnectivityEvent>(16);
        let (command_tx, command_rx) = mpsc::channel::<SchedulerCommand>(16);

        match self.engine.queue_count().await {
            Ok(queued) => info!(queued, "Queue opened"),
            Err(e) => warn!(error = %e, "Queue unreadable at startup"),
        }

        let mut scheduler = DrainScheduler::new(
            self.engine.clone(),
            connectivity_rx,
            command_rx,
            SchedulerConfig::from_config(&self.config),
        );
        match self.probe.clone() {
            Some(probe) => scheduler = scheduler.with_probe(probe),
            None => {
                // Without a probe nothing else would ever mark the engine
                // reachable; failed sends still fall back to the queue.
                self.engine.set_reachable(true).await;
            }
        }

        tokio::spawn(sync_now_signal(command_tx, self.shutdown.clone()));

        scheduler.run(self.shutdown.clone()).await;
        Ok(())
    }
}

// ============================================================================
// Signal handlers
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

/// Forwards SIGUSR1 to the scheduler as a "sync now" request
#[cfg(unix)]
async fn sync_now_signal(commands: mpsc::Sender<SchedulerCommand>, shutdown: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut usr1 = match signal(SignalKind::user_defined1()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "SIGUSR1 handler unavailable, manual sync disabled");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            received = usr1.recv() => {
                if received.is_none() {
                    break;
                }
                info!("Received SIGUSR1, requesting sync");
                if commands.send(SchedulerCommand::SyncNow).await.is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(not(unix))]
async fn sync_now_signal(commands: mpsc::Sender<SchedulerCommand>, shutdown: CancellationToken) {
    shutdown.cancelled().await;
    drop(commands);
}

// ============================================================================
// Logging
// ============================================================================

/// Initializes tracing; `RUST_LOG` overrides the configured level
fn init_tracing(logging: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

/// Loads and validates the configuration before logging is up
fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("Invalid configuration: {}", messages.join("; "));
    }

    Ok(config)
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let config = load_config(&config_path)?;

    init_tracing(&config.logging);
    info!(config_path = %config_path.display(), "LeadQ daemon starting (leadqd)");

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(config, shutdown_token.clone()).await?;
    let result = service.run().await;

    match &result {
        Ok(()) => info!("LeadQ daemon shut down gracefully"),
        Err(e) => error!(error = %e, "LeadQ daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
