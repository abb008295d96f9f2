//! Notification service port (driven/secondary port)
//!
//! This module defines the interface the sync engine uses to report what it
//! did to UI collaborators: toasts on the booth form, log lines in the
//! daemon, structured output in the CLI.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because delivery of notifications is
//!   adapter-specific.
//! - Notifications are fire-and-forget. The engine logs a failed
//!   notification and carries on; it never aborts an operation over one.
//! - Every outcome of `submit` and `drain` maps to a distinct event so a UI
//!   can tell "sent", "saved offline" and "gave up" apart.

use serde::{Deserialize, Serialize};

use crate::domain::{Payload, RecordId};

// ============================================================================
// Drain summary
// ============================================================================

/// Outcome counters of one completed drain pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainSummary {
    /// Records delivered and removed from the queue
    pub synced: usize,
    /// Pending records left in the queue after the pass
    pub remaining: usize,
    /// Failed records in the queue after the pass
    pub failed: usize,
    /// Records that reached the retry budget during this pass
    pub newly_failed: usize,
    /// True if the pass stopped early because reachability was lost
    pub interrupted: bool,
    /// Wall-clock duration of the pass in milliseconds
    pub duration_ms: u64,
}

impl DrainSummary {
    /// True if every pending record in the snapshot was delivered
    pub fn is_clean(&self) -> bool {
        self.remaining == 0 && self.newly_failed == 0 && !self.interrupted
    }
}

// ============================================================================
// SyncEvent
// ============================================================================

/// State transition reported by the sync engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    /// The engine's reachability belief flipped
    ReachabilityChanged { reachable: bool },

    /// A live submission was accepted by the endpoint
    Delivered,

    /// A submission was queued for later delivery
    SavedLocally {
        record_id: RecordId,
        /// Reason of the failed live attempt; `None` when the engine was
        /// offline and did not try
        online_attempt_failed: Option<String>,
    },

    /// A drain pass began with this many pending records
    DrainStarted { pending: usize },

    /// A queued record was delivered during a drain
    RecordSynced { record_id: RecordId },

    /// A queued record failed and stays pending
    RetryScheduled {
        record_id: RecordId,
        attempts: u32,
        reason: String,
    },

    /// A queued record failed for the last time and is now `Failed`
    RetryBudgetExhausted {
        record_id: RecordId,
        attempts: u32,
        reason: String,
    },

    /// A drain pass finished and its result was committed
    DrainCompleted { summary: DrainSummary },

    /// The queue store could not be read or written
    StorageFailed {
        operation: String,
        error: String,
        /// The submission that could not be persisted, if any
        payload: Option<Payload>,
    },

    /// The queue was cleared by the user
    QueueCleared { removed: usize },
}

impl SyncEvent {
    /// Short machine-readable name of the event
    pub fn name(&self) -> &'static str {
        match self {
            SyncEvent::ReachabilityChanged { .. } => "reachability_changed",
            SyncEvent::Delivered => "delivered",
            SyncEvent::SavedLocally { .. } => "saved_locally",
            SyncEvent::DrainStarted { .. } => "drain_started",
            SyncEvent::RecordSynced { .. } => "record_synced",
            SyncEvent::RetryScheduled { .. } => "retry_scheduled",
            SyncEvent::RetryBudgetExhausted { .. } => "retry_budget_exhausted",
            SyncEvent::DrainCompleted { .. } => "drain_completed",
            SyncEvent::StorageFailed { .. } => "storage_failed",
            SyncEvent::QueueCleared { .. } => "queue_cleared",
        }
    }

    /// True for events a UI should surface as an error
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            SyncEvent::StorageFailed { .. } | SyncEvent::RetryBudgetExhausted { .. }
        )
    }
}

// ============================================================================
// INotificationService trait
// ============================================================================

/// Port trait for reporting sync events to the user
///
/// ## Implementation Notes
///
/// - Called inline by the engine; implementations should return quickly
///   and hand slow work (desktop notifications, IPC) off to a task.
/// - Errors are logged by the caller and otherwise ignored.
#[async_trait::async_trait]
pub trait INotificationService: Send + Sync {
    /// Reports one sync event
    async fn notify(&self, event: &SyncEvent) -> anyhow::Result<()>;
}
