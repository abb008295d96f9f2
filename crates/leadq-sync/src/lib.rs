//! LeadQ Sync - Deferred submission engine
//!
//! Provides:
//! - Live delivery of captured leads with a durable local fallback
//! - Sequential drain passes with a bounded retry budget
//! - A scheduler reacting to connectivity changes, timers and "sync now"
//!
//! ## Modules
//!
//! - [`engine`] - `SyncEngine`: submit, drain, clear and queue inspection
//! - [`scheduler`] - `DrainScheduler`: event loop deciding when to drain
//! - [`notifier`] - `INotificationService` adapters (tracing log, channel)

pub mod engine;
pub mod notifier;
pub mod scheduler;

use leadq_core::domain::{DomainError, Payload};
use thiserror::Error;

/// Errors that can occur during sync operations
///
/// Network failures never show up here: they are absorbed by the local
/// queue and reported as events. Only storage problems reach the caller.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A submission could not be written to the queue. The payload is
    /// handed back so the caller can keep it (e.g. leave the form filled).
    #[error("Submission could not be saved locally: {source:#}")]
    NotPersisted {
        payload: Box<Payload>,
        #[source]
        source: anyhow::Error,
    },

    /// The queue store failed outside of a submission
    #[error("Queue storage failed during {operation}: {source:#}")]
    Storage {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A domain-level error propagated from leadq-core
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
}

impl SyncError {
    /// Payload of a submission that was not persisted
    pub fn unsaved_payload(&self) -> Option<&Payload> {
        match self {
            SyncError::NotPersisted { payload, .. } => Some(payload.as_ref()),
            _ => None,
        }
    }
}
