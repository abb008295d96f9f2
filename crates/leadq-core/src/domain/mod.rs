//! Domain entities and business logic
//!
//! This module contains the core domain types for LeadQ:
//! - Newtypes for identifiers and validated values
//! - The lead form and its validation
//! - The opaque payload sent to the remote endpoint
//! - Queued records and their state machine
//! - Domain-specific error types

pub mod errors;
pub mod lead;
pub mod newtypes;
pub mod payload;
pub mod record;

// Re-export commonly used types
pub use errors::DomainError;
pub use lead::{LeadForm, ValidatedLead};
pub use newtypes::*;
pub use payload::Payload;
pub use record::{Record, RecordState, Submission};
