//! Notification adapters
//!
//! - [`LogNotificationService`] writes every [`SyncEvent`] to `tracing`
//!   with structured fields; used by the daemon and the CLI.
//! - [`ChannelNotificationService`] forwards events into an mpsc channel
//!   for UI collaborators that render them (toasts, counters).

use leadq_core::ports::{INotificationService, SyncEvent};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Reports sync events as log lines
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationService;

impl LogNotificationService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl INotificationService for LogNotificationService {
    async fn notify(&self, event: &SyncEvent) -> anyhow::Result<()> {
        match event {
            SyncEvent::ReachabilityChanged { reachable } => {
                info!(reachable, "Connectivity changed");
            }
            SyncEvent::Delivered => info!("Lead sent"),
            SyncEvent::SavedLocally {
                record_id,
                online_attempt_failed: Some(reason),
            } => {
                warn!(record_id = %record_id, reason = %reason, "Send failed, lead saved locally");
            }
            SyncEvent::SavedLocally { record_id, .. } => {
                info!(record_id = %record_id, "Offline, lead saved locally");
            }
            SyncEvent::DrainStarted { pending } => info!(pending, "Syncing pending leads"),
            SyncEvent::RecordSynced { record_id } => {
                info!(record_id = %record_id, "Pending lead synced");
            }
            SyncEvent::RetryScheduled {
                record_id,
                attempts,
                reason,
            } => {
                warn!(record_id = %record_id, attempts, reason = %reason, "Sync failed, will retry");
            }
            SyncEvent::RetryBudgetExhausted {
                record_id,
                attempts,
                reason,
            } => {
                error!(
                    record_id = %record_id,
                    attempts,
                    reason = %reason,
                    "Giving up on lead, kept as failed"
                );
            }
            SyncEvent::DrainCompleted { summary } => {
                info!(
                    synced = summary.synced,
                    remaining = summary.remaining,
                    failed = summary.failed,
                    newly_failed = summary.newly_failed,
                    interrupted = summary.interrupted,
                    duration_ms = summary.duration_ms,
                    "Sync pass completed"
                );
            }
            SyncEvent::StorageFailed {
                operation, error, ..
            } => {
                error!(operation = %operation, error = %error, "Local storage failed");
            }
            SyncEvent::QueueCleared { removed } => info!(removed, "Pending leads cleared"),
        }
        Ok(())
    }
}

/// Forwards sync events into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelNotificationService {
    tx: mpsc::UnboundedSender<SyncEvent>,
}

impl ChannelNotificationService {
    /// Creates the service and the receiving end of its channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl INotificationService for ChannelNotificationService {
    async fn notify(&self, event: &SyncEvent) -> anyhow::Result<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| anyhow::anyhow!("event receiver dropped"))
    }
}
