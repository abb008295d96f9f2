//! Queue store port (driven/secondary port)
//!
//! This module defines the interface for durably persisting records that
//! have not been confirmed by the remote endpoint yet.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, files, browser storage) and don't need domain-level
//!   classification. Callers surface them as storage failures.
//! - The whole queue is read and written as one snapshot. There are no
//!   row-level updates, so a crash between load and save can never leave a
//!   half-applied change behind.
//! - Ordering is insertion order, oldest first. New records are appended.
//! - The queue may be shared by several processes (the CLI appends while
//!   the daemon drains). Read-modify-write sequences go through
//!   [`IQueueStore::update`], which adapters run under an exclusive lock.

use crate::domain::Record;

/// Rewrites a loaded queue into the queue to persist
pub type QueueMutation = Box<dyn FnOnce(Vec<Record>) -> Vec<Record> + Send>;

/// Port trait for the durable queue of undelivered records
///
/// ## Implementation Notes
///
/// - `save_all` must replace the persisted set atomically: after it returns
///   `Ok`, `load_all` yields exactly the given sequence in the same order.
/// - Implementations must never turn unreadable data into an empty queue;
///   a decode failure is an error.
/// - `clear_all` is irreversible. UI collaborators confirm with the user
///   before calling it.
#[async_trait::async_trait]
pub trait IQueueStore: Send + Sync {
    /// Returns every queued record, oldest first
    async fn load_all(&self) -> anyhow::Result<Vec<Record>>;

    /// Atomically replaces the persisted set with `records`
    async fn save_all(&self, records: &[Record]) -> anyhow::Result<()>;

    /// Number of queued records
    async fn count(&self) -> anyhow::Result<usize>;

    /// Removes every queued record
    async fn clear_all(&self) -> anyhow::Result<()>;

    /// Loads the queue, applies `mutate` and saves the result as one step
    ///
    /// Returns the persisted queue. The default implementation is only
    /// atomic for a single writer; adapters whose storage is shared between
    /// processes override it with a transaction.
    async fn update(&self, mutate: QueueMutation) -> anyhow::Result<Vec<Record>> {
        let records = mutate(self.load_all().await?);
        self.save_all(&records).await?;
        Ok(records)
    }
}
