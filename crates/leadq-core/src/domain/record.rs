//! Queued record entity
//!
//! A [`Record`] is a lead that could not be delivered on its first attempt
//! and now lives in the queue store until a drain delivers it.
//!
//! ## State machine
//!
//! ```text
//!  Submission ──persist──→ Pending ──(attempts reach budget)──→ Failed
//!                             │                                   │
//!                          delivered                         clear all
//!                             ↓                                   ↓
//!                          (removed)                          (removed)
//! ```
//!
//! There is no persisted "synced" state: success removes the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::RecordId;
use super::payload::Payload;

/// Persisted state of a queued record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    /// Never delivered, eligible for automatic retries
    #[default]
    Pending,
    /// Retry budget exhausted, kept for manual inspection
    Failed,
}

impl RecordState {
    /// Returns the state name as a static string
    pub fn name(&self) -> &'static str {
        match self {
            RecordState::Pending => "Pending",
            RecordState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for RecordState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A freshly collected lead that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub payload: Payload,
    pub captured_at: DateTime<Utc>,
}

impl Submission {
    /// Creates a submission captured now
    pub fn new(payload: Payload) -> Self {
        Self::captured_at(payload, Utc::now())
    }

    /// Creates a submission with an explicit capture time
    pub fn captured_at(payload: Payload, captured_at: DateTime<Utc>) -> Self {
        Self {
            payload,
            captured_at,
        }
    }
}

/// A lead held in the queue store awaiting delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    id: RecordId,
    payload: Payload,
    captured_at: DateTime<Utc>,
    attempts: u32,
    state: RecordState,
}

impl Record {
    /// Turns a submission into a queued record with a fresh id,
    /// zero attempts and `Pending` state
    pub fn queued(submission: Submission) -> Self {
        Self {
            id: RecordId::new(),
            payload: submission.payload,
            captured_at: submission.captured_at,
            attempts: 0,
            state: RecordState::Pending,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == RecordState::Pending
    }

    pub fn is_failed(&self) -> bool {
        self.state == RecordState::Failed
    }

    /// Records one failed delivery attempt
    ///
    /// Increments `attempts` and moves the record to `Failed` once
    /// `attempts` reaches `retry_budget`. Returns the resulting state.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidState` if the record is already `Failed`;
    /// failed records are excluded from automatic retries.
    pub fn record_failed_attempt(&mut self, retry_budget: u32) -> Result<RecordState, DomainError> {
        if self.is_failed() {
            return Err(DomainError::InvalidState {
                from: RecordState::Failed.name().to_string(),
                to: RecordState::Pending.name().to_string(),
            });
        }

        self.attempts = self.attempts.saturating_add(1);
        if self.attempts >= retry_budget {
            self.state = RecordState::Failed;
        }
        Ok(self.state)
    }
}
