//! Deferred submission engine
//!
//! The [`SyncEngine`] decides, for every captured lead, whether it goes
//! straight to the remote endpoint or into the local queue, and later
//! drains that queue when the network is back.
//!
//! ## Submit
//!
//! ```text
//!  reachable? ──no──→ queue (Pending, attempts 0) ──→ SavedLocally
//!      │
//!     yes ──→ deliver ──ok──→ Delivered
//!                 │
//!               error ──→ queue (Pending, attempts 0) ──→ SavedLocally(reason)
//! ```
//!
//! ## Drain
//!
//! One pass takes a snapshot of the queue and sends each `Pending` record in
//! snapshot order, pausing between attempts. Delivered records are removed;
//! failures add one attempt and turn the record `Failed` once the retry
//! budget is spent. The result is merged by id into a fresh read of the
//! store, so records submitted or cleared during the pass are respected.
//!
//! ## Concurrency
//!
//! - An `AtomicBool` guard lets only one drain run at a time.
//! - A `tokio::sync::Mutex` serializes the store access of this process. It
//!   is never held across a network call.
//! - Every load/mutate/save sequence goes through `IQueueStore::update`, so
//!   another process sharing the store cannot interleave with it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use leadq_core::config::Config;
use leadq_core::domain::{Payload, Record, RecordId, RecordState, Submission};
use leadq_core::ports::{
    DeliveryError, DrainSummary, IDeliveryEndpoint, INotificationService, IQueueStore, SyncEvent,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::SyncError;

// ============================================================================
// Settings and outcomes
// ============================================================================

/// Tunables of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncEngineConfig {
    /// Failed drain attempts before a record becomes `Failed`
    pub retry_budget: u32,
    /// Pause between two attempts of one drain pass
    pub drain_delay: Duration,
    /// Upper bound for a single delivery attempt
    pub delivery_timeout: Duration,
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self {
            retry_budget: 3,
            drain_delay: Duration::from_millis(1000),
            delivery_timeout: Duration::from_secs(15),
        }
    }
}

impl SyncEngineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retry_budget: config.queue.retry_budget,
            drain_delay: config.queue.drain_delay(),
            delivery_timeout: config.endpoint.timeout(),
        }
    }
}

/// Result of [`SyncEngine::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The endpoint accepted the lead; nothing was stored
    Delivered,
    /// The lead was queued for a later drain
    SavedLocally {
        record_id: RecordId,
        /// Failure of the live attempt; `None` when the engine was offline
        online_attempt_failed: Option<DeliveryError>,
    },
}

impl SubmitOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SubmitOutcome::Delivered)
    }
}

/// Result of [`SyncEngine::drain`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainStatus {
    /// The engine believes the network is down; nothing was attempted
    Offline,
    /// Another drain pass is in progress
    AlreadyRunning,
    /// No `Pending` record exists; no request was made and nothing written
    Empty,
    /// A pass ran and its result was committed
    Completed(DrainSummary),
}

/// Coarse engine state for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Draining,
}

/// Clears the drain flag when a pass ends, including on cancellation
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Live delivery with a durable local fallback
///
/// ## Dependencies
///
/// - `store`: durable queue of undelivered records
/// - `endpoint`: remote lead endpoint
/// - `notifier`: receives one [`SyncEvent`] per state transition
pub struct SyncEngine {
    store: Arc<dyn IQueueStore + Send + Sync>,
    endpoint: Arc<dyn IDeliveryEndpoint + Send + Sync>,
    notifier: Arc<dyn INotificationService + Send + Sync>,
    config: SyncEngineConfig,
    reachable: AtomicBool,
    draining: AtomicBool,
    interrupt: AtomicBool,
    store_lock: Mutex<()>,
}

impl SyncEngine {
    /// Creates an engine that starts out unreachable
    ///
    /// Callers set reachability from a probe or a connectivity signal
    /// before the first submit.
    pub fn new(
        store: Arc<dyn IQueueStore + Send + Sync>,
        endpoint: Arc<dyn IDeliveryEndpoint + Send + Sync>,
        notifier: Arc<dyn INotificationService + Send + Sync>,
        config: SyncEngineConfig,
    ) -> Self {
        Self {
            store,
            endpoint,
            notifier,
            config,
            reachable: AtomicBool::new(false),
            draining: AtomicBool::new(false),
            interrupt: AtomicBool::new(false),
            store_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SyncEngineConfig {
        &self.config
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Acquire)
    }

    pub fn state(&self) -> EngineState {
        if self.draining.load(Ordering::Acquire) {
            EngineState::Draining
        } else {
            EngineState::Idle
        }
    }

    // ========================================================================
    // Reachability
    // ========================================================================

    /// Updates the reachability belief
    ///
    /// Emits `ReachabilityChanged` and returns `true` only when the value
    /// actually changed.
    pub async fn set_reachable(&self, reachable: bool) -> bool {
        let previous = self.reachable.swap(reachable, Ordering::AcqRel);
        if previous == reachable {
            return false;
        }

        info!(reachable, "Reachability changed");
        self.emit(SyncEvent::ReachabilityChanged { reachable }).await;
        true
    }

    /// Asks a running drain to stop before its next record
    ///
    /// The current attempt finishes and the pass commits what it did.
    pub fn interrupt_drain(&self) {
        if self.draining.load(Ordering::Acquire) {
            info!("Drain interruption requested");
            self.interrupt.store(true, Ordering::Release);
        }
    }

    // ========================================================================
    // Submit
    // ========================================================================

    /// Sends a lead now if possible, otherwise queues it
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotPersisted` with the payload when the lead
    /// could not be delivered and could not be stored either. Delivery
    /// failures alone are never errors.
    #[tracing::instrument(skip(self, submission))]
    pub async fn submit(&self, submission: Submission) -> Result<SubmitOutcome, SyncError> {
        let online_attempt_failed = if self.is_reachable() {
            match self.deliver(&submission.payload).await {
                Ok(()) => {
                    info!("Lead delivered");
                    self.emit(SyncEvent::Delivered).await;
                    return Ok(SubmitOutcome::Delivered);
                }
                Err(e) => {
                    warn!(error = %e, "Live delivery failed, saving locally");
                    Some(e)
                }
            }
        } else {
            debug!("Offline, saving locally");
            None
        };

        let record = Record::queued(submission);
        let record_id = record.id();

        if let Err(e) = self.append(record.clone()).await {
            error!(record_id = %record_id, error = %format!("{e:#}"), "Failed to save lead locally");
            let payload = record.payload().clone();
            self.emit(SyncEvent::StorageFailed {
                operation: "submit".to_string(),
                error: format!("{e:#}"),
                payload: Some(payload.clone()),
            })
            .await;
            return Err(SyncError::NotPersisted {
                payload: Box::new(payload),
                source: e,
            });
        }

        info!(record_id = %record_id, "Lead saved locally");
        self.emit(SyncEvent::SavedLocally {
            record_id,
            online_attempt_failed: online_attempt_failed.as_ref().map(ToString::to_string),
        })
        .await;

        Ok(SubmitOutcome::SavedLocally {
            record_id,
            online_attempt_failed,
        })
    }

    // ========================================================================
    // Drain
    // ========================================================================

    /// Attempts delivery of every queued `Pending` record
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` if the queue cannot be read at the start
    /// or the result cannot be committed.
    #[tracing::instrument(skip(self))]
    pub async fn drain(&self) -> Result<DrainStatus, SyncError> {
        if !self.is_reachable() {
            debug!("Drain skipped: offline");
            return Ok(DrainStatus::Offline);
        }

        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Drain skipped: another pass is running");
            return Ok(DrainStatus::AlreadyRunning);
        }
        let _guard = DrainGuard(&self.draining);
        self.interrupt.store(false, Ordering::Release);

        self.run_drain().await
    }

    async fn run_drain(&self) -> Result<DrainStatus, SyncError> {
        let start = Instant::now();

        let snapshot = match self.store.load_all().await {
            Ok(records) => records,
            Err(e) => return Err(self.storage_failure("drain", e).await),
        };

        let pending: Vec<Record> = snapshot.into_iter().filter(Record::is_pending).collect();
        if pending.is_empty() {
            debug!("Drain skipped: no pending records");
            return Ok(DrainStatus::Empty);
        }

        info!(pending = pending.len(), "Drain started");
        self.emit(SyncEvent::DrainStarted {
            pending: pending.len(),
        })
        .await;

        let mut synced: HashSet<RecordId> = HashSet::new();
        let mut updated: HashMap<RecordId, Record> = HashMap::new();
        let mut newly_failed = 0usize;
        let mut interrupted = false;

        for (index, mut record) in pending.into_iter().enumerate() {
            if index > 0 && !self.config.drain_delay.is_zero() {
                tokio::time::sleep(self.config.drain_delay).await;
            }

            if !self.is_reachable() || self.interrupt.load(Ordering::Acquire) {
                info!(processed = index, "Drain interrupted");
                interrupted = true;
                break;
            }

            let record_id = record.id();
            match self.deliver(record.payload()).await {
                Ok(()) => {
                    debug!(record_id = %record_id, "Record synced");
                    synced.insert(record_id);
                    self.emit(SyncEvent::RecordSynced { record_id }).await;
                }
                Err(e) => {
                    let reason = e.to_string();
                    let state = record.record_failed_attempt(self.config.retry_budget)?;
                    let attempts = record.attempts();

                    match state {
                        RecordState::Pending => {
                            warn!(record_id = %record_id, attempts, error = %reason, "Record failed, will retry");
                            self.emit(SyncEvent::RetryScheduled {
                                record_id,
                                attempts,
                                reason,
                            })
                            .await;
                        }
                        RecordState::Failed => {
                            newly_failed += 1;
                            warn!(record_id = %record_id, attempts, error = %reason, "Retry budget exhausted");
                            self.emit(SyncEvent::RetryBudgetExhausted {
                                record_id,
                                attempts,
                                reason,
                            })
                            .await;
                        }
                    }
                    updated.insert(record_id, record);
                }
            }
        }

        let (remaining, failed) = self.commit(&synced, updated).await?;

        let summary = DrainSummary {
            synced: synced.len(),
            remaining,
            failed,
            newly_failed,
            interrupted,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            synced = summary.synced,
            remaining = summary.remaining,
            failed = summary.failed,
            duration_ms = summary.duration_ms,
            "Drain completed"
        );
        self.emit(SyncEvent::DrainCompleted {
            summary: summary.clone(),
        })
        .await;

        Ok(DrainStatus::Completed(summary))
    }

    /// Merges a pass result into the current store contents
    ///
    /// Records removed since the snapshot stay removed and records added
    /// since the snapshot are kept. Returns `(pending, failed)` counts of
    /// the committed queue.
    async fn commit(
        &self,
        synced: &HashSet<RecordId>,
        mut updated: HashMap<RecordId, Record>,
    ) -> Result<(usize, usize), SyncError> {
        let _lock = self.store_lock.lock().await;

        let committed = if synced.is_empty() && updated.is_empty() {
            self.store.load_all().await
        } else {
            let synced = synced.clone();
            self.store
                .update(Box::new(move |current| {
                    current
                        .into_iter()
                        .filter(|r| !synced.contains(&r.id()))
                        .map(|r| updated.remove(&r.id()).unwrap_or(r))
                        .collect()
                }))
                .await
        };

        let merged = match committed {
            Ok(records) => records,
            Err(e) => return Err(self.storage_failure("drain commit", e).await),
        };

        let failed = merged.iter().filter(|r| r.is_failed()).count();
        Ok((merged.len() - failed, failed))
    }

    // ========================================================================
    // Queue access
    // ========================================================================

    /// Removes every queued record, `Failed` ones included
    ///
    /// Returns how many records were removed. A queue that cannot be
    /// decoded is still cleared.
    #[tracing::instrument(skip(self))]
    pub async fn clear_queue(&self) -> Result<usize, SyncError> {
        let removed = {
            let lock = self.store_lock.lock().await;

            let removed = match self.store.count().await {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "Queue unreadable, clearing anyway");
                    0
                }
            };

            if let Err(e) = self.store.clear_all().await {
                drop(lock);
                return Err(self.storage_failure("clear", e).await);
            }
            removed
        };

        info!(removed, "Queue cleared");
        self.emit(SyncEvent::QueueCleared { removed }).await;
        Ok(removed)
    }

    /// Number of queued records, `Pending` and `Failed`
    pub async fn queue_count(&self) -> Result<usize, SyncError> {
        match self.store.count().await {
            Ok(n) => Ok(n),
            Err(e) => Err(self.storage_failure("count", e).await),
        }
    }

    /// All queued records, oldest first
    pub async fn queued_records(&self) -> Result<Vec<Record>, SyncError> {
        match self.store.load_all().await {
            Ok(records) => Ok(records),
            Err(e) => Err(self.storage_failure("load", e).await),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn append(&self, record: Record) -> anyhow::Result<()> {
        let _lock = self.store_lock.lock().await;
        self.store
            .update(Box::new(move |mut records| {
                records.push(record);
                records
            }))
            .await?;
        Ok(())
    }

    /// One delivery attempt bounded by the delivery timeout
    async fn deliver(&self, payload: &Payload) -> Result<(), DeliveryError> {
        let timeout = self.config.delivery_timeout;
        match tokio::time::timeout(timeout, self.endpoint.deliver(payload)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(timeout)),
        }
    }

    async fn storage_failure(&self, operation: &'static str, e: anyhow::Error) -> SyncError {
        error!(operation, error = %format!("{e:#}"), "Queue storage failed");
        self.emit(SyncEvent::StorageFailed {
            operation: operation.to_string(),
            error: format!("{e:#}"),
            payload: None,
        })
        .await;
        SyncError::Storage {
            operation,
            source: e,
        }
    }

    async fn emit(&self, event: SyncEvent) {
        if let Err(e) = self.notifier.notify(&event).await {
            warn!(event = event.name(), error = %e, "Failed to report sync event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadq_core::config::ConfigBuilder;

    #[test]
    fn test_config_from_app_config() {
        let config = ConfigBuilder::new()
            .queue_retry_budget(5)
            .queue_drain_delay_ms(250)
            .endpoint_timeout_secs(7)
            .build();

        let engine_config = SyncEngineConfig::from_config(&config);
        assert_eq!(engine_config.retry_budget, 5);
        assert_eq!(engine_config.drain_delay, Duration::from_millis(250));
        assert_eq!(engine_config.delivery_timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_default_config_matches_app_defaults() {
        assert_eq!(
            SyncEngineConfig::default(),
            SyncEngineConfig::from_config(&Config::default())
        );
    }

    #[test]
    fn test_drain_guard_resets_flag() {
        let flag = AtomicBool::new(true);
        {
            let _guard = DrainGuard(&flag);
        }
        assert!(!flag.load(Ordering::Acquire));
    }

    #[test]
    fn test_submit_outcome_helpers() {
        assert!(SubmitOutcome::Delivered.is_delivered());
        assert!(!SubmitOutcome::SavedLocally {
            record_id: RecordId::new(),
            online_attempt_failed: None,
        }
        .is_delivered());
    }
}
