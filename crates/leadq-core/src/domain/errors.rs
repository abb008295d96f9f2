//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures at the form boundary, malformed
//! identifiers and invalid record state transitions.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required form field was missing or blank
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Invalid email address format
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// Invalid state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Invalid device identifier
    #[error("Invalid device ID: {0}")]
    InvalidDeviceId(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}
