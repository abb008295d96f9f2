//! Drain scheduler - decides when the engine drains its queue
//!
//! The [`DrainScheduler`] owns an `Arc<SyncEngine>` and turns outside
//! signals into drain passes.
//!
//! ## Flow
//!
//! ```text
//! ConnectivityEvent ──→ mpsc ──┐
//! SchedulerCommand  ──→ mpsc ──┤
//! drain timer       ───────────┼──→ DrainScheduler ──spawn──→ SyncEngine::drain()
//! probe timer       ───────────┤
//! startup delay     ───────────┘
//! ```
//!
//! Drains and probes run as spawned tasks so the loop keeps receiving
//! connectivity edges and shutdown while a request is in flight. The engine
//! itself suppresses overlapping drains.

use std::sync::Arc;
use std::time::Duration;

use leadq_core::config::Config;
use leadq_core::ports::{ConnectivityEvent, IConnectivityProbe};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::{DrainStatus, SyncEngine};

/// Requests sent to the scheduler by UI collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Re-check reachability and drain immediately
    SyncNow,
}

/// Timer settings of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Period of the background drain timer
    pub drain_interval: Duration,
    /// Delay before the first drain after startup
    pub startup_delay: Duration,
    /// Period of the connectivity probe; `None` disables probing
    pub probe_interval: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            drain_interval: Duration::from_secs(60),
            startup_delay: Duration::from_secs(3),
            probe_interval: Some(Duration::from_secs(30)),
        }
    }
}

impl SchedulerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            drain_interval: config.sync.drain_interval(),
            startup_delay: config.sync.startup_delay(),
            probe_interval: config
                .probing_enabled()
                .then(|| config.sync.probe_interval()),
        }
    }
}

/// Answer of a probe task
#[derive(Debug, Clone, Copy)]
struct ProbeOutcome {
    reachable: bool,
    /// Requested by "sync now", which drains whatever the answer
    manual: bool,
}

/// Event loop scheduling drain passes
pub struct DrainScheduler {
    engine: Arc<SyncEngine>,
    probe: Option<Arc<dyn IConnectivityProbe + Send + Sync>>,
    connectivity_rx: mpsc::Receiver<ConnectivityEvent>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
    config: SchedulerConfig,
    drains: JoinSet<()>,
    probes: JoinSet<ProbeOutcome>,
}

impl DrainScheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    /// * `engine` - The engine to drive
    /// * `connectivity_rx` - Online/offline edges from a signal source
    /// * `command_rx` - "Sync now" requests
    /// * `config` - Timer settings
    pub fn new(
        engine: Arc<SyncEngine>,
        connectivity_rx: mpsc::Receiver<ConnectivityEvent>,
        command_rx: mpsc::Receiver<SchedulerCommand>,
        config: SchedulerConfig,
    ) -> Self {
        info!(
            drain_interval_secs = config.drain_interval.as_secs(),
            startup_delay_secs = config.startup_delay.as_secs(),
            probe_interval_secs = config.probe_interval.map(|d| d.as_secs()),
            "Creating drain scheduler"
        );

        Self {
            engine,
            probe: None,
            connectivity_rx,
            command_rx,
            config,
            drains: JoinSet::new(),
            probes: JoinSet::new(),
        }
    }

    /// Attaches a connectivity probe used by the probe timer and "sync now"
    pub fn with_probe(mut self, probe: Arc<dyn IConnectivityProbe + Send + Sync>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Main event loop
    ///
    /// Runs until `shutdown` is cancelled or both channels are closed. On
    /// exit, a running drain is asked to stop after its current record and
    /// awaited so its progress is committed.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Drain scheduler starting");

        let startup = tokio::time::sleep(self.config.startup_delay);
        tokio::pin!(startup);
        let mut startup_pending = true;

        let mut drain_timer = tokio::time::interval_at(
            Instant::now() + self.config.drain_interval,
            self.config.drain_interval,
        );
        drain_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first probe tick fires immediately and establishes reachability.
        let mut probe_timer = match (&self.probe, self.config.probe_interval) {
            (Some(_), Some(period)) => {
                let mut timer = tokio::time::interval(period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                Some(timer)
            }
            _ => None,
        };

        let mut connectivity_open = true;
        let mut commands_open = true;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, scheduler stopping");
                    break;
                }

                _ = &mut startup, if startup_pending => {
                    startup_pending = false;
                    self.spawn_drain("startup");
                }

                event = self.connectivity_rx.recv(), if connectivity_open => {
                    match event {
                        Some(ConnectivityEvent::Online) => {
                            self.engine.set_reachable(true).await;
                            self.spawn_drain("reconnected");
                        }
                        Some(ConnectivityEvent::Offline) => {
                            self.engine.set_reachable(false).await;
                        }
                        None => {
                            debug!("Connectivity channel closed");
                            connectivity_open = false;
                        }
                    }
                }

                command = self.command_rx.recv(), if commands_open => {
                    match command {
                        Some(SchedulerCommand::SyncNow) => {
                            info!("Manual sync requested");
                            if !self.spawn_probe(true) {
                                self.engine.set_reachable(true).await;
                                self.spawn_drain("manual");
                            }
                        }
                        None => {
                            debug!("Command channel closed");
                            commands_open = false;
                        }
                    }
                }

                _ = drain_timer.tick() => {
                    self.spawn_drain("interval");
                }

                _ = tick(&mut probe_timer) => {
                    if self.probes.is_empty() {
                        self.spawn_probe(false);
                    } else {
                        debug!("Probe still running, tick skipped");
                    }
                }

                Some(joined) = self.probes.join_next(), if !self.probes.is_empty() => {
                    match joined {
                        Ok(outcome) => self.apply_probe(outcome).await,
                        Err(e) => error!(error = %e, "Probe task failed"),
                    }
                }

                Some(joined) = self.drains.join_next(), if !self.drains.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Drain task failed");
                    }
                }
            }

            if !connectivity_open && !commands_open {
                info!("All senders dropped, scheduler stopping");
                break;
            }
        }

        self.probes.abort_all();
        self.engine.interrupt_drain();
        while let Some(joined) = self.drains.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Drain task failed during shutdown");
            }
        }

        info!("Drain scheduler stopped");
    }

    /// Starts a probe task; returns `false` when no probe is attached
    fn spawn_probe(&mut self, manual: bool) -> bool {
        let Some(probe) = self.probe.clone() else {
            return false;
        };
        self.probes.spawn(async move {
            ProbeOutcome {
                reachable: probe.is_reachable().await,
                manual,
            }
        });
        true
    }

    async fn apply_probe(&mut self, outcome: ProbeOutcome) {
        let changed = self.engine.set_reachable(outcome.reachable).await;
        if outcome.manual {
            self.spawn_drain("manual");
        } else if changed && outcome.reachable {
            self.spawn_drain("probe");
        }
    }

    fn spawn_drain(&mut self, trigger: &'static str) {
        let engine = self.engine.clone();
        self.drains.spawn(async move {
            match engine.drain().await {
                Ok(DrainStatus::Completed(summary)) => {
                    debug!(trigger, synced = summary.synced, "Scheduled drain finished");
                }
                Ok(status) => debug!(trigger, status = ?status, "Scheduled drain skipped"),
                Err(e) => warn!(trigger, error = %e, "Scheduled drain failed"),
            }
        });
    }
}

/// Ticks an optional interval; pends forever when there is none
async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadq_core::config::ConfigBuilder;

    #[test]
    fn test_config_from_app_config() {
        let config = ConfigBuilder::new()
            .sync_drain_interval_secs(120)
            .sync_startup_delay_secs(5)
            .sync_probe_interval_secs(10)
            .build();

        let scheduler_config = SchedulerConfig::from_config(&config);
        assert_eq!(scheduler_config.drain_interval, Duration::from_secs(120));
        assert_eq!(scheduler_config.startup_delay, Duration::from_secs(5));
        assert_eq!(scheduler_config.probe_interval, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_zero_probe_interval_disables_probing() {
        let config = ConfigBuilder::new().sync_probe_interval_secs(0).build();
        assert_eq!(SchedulerConfig::from_config(&config).probe_interval, None);
    }

    #[test]
    fn test_default_matches_app_defaults() {
        assert_eq!(
            SchedulerConfig::default(),
            SchedulerConfig::from_config(&Config::default())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_without_timer_pends() {
        let mut none: Option<Interval> = None;
        let result = tokio::time::timeout(Duration::from_secs(1), tick(&mut none)).await;
        assert!(result.is_err());
    }
}
