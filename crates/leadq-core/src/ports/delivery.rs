//! Delivery endpoint port (driven/secondary port)
//!
//! This module defines the interface for handing one lead payload to the
//! remote spreadsheet endpoint.
//!
//! ## Design Notes
//!
//! - Unlike the storage ports this one returns a typed [`DeliveryError`]:
//!   the sync engine reports network failures and endpoint rejections
//!   differently, even though both lead to the same fallback.
//! - Only the payload crosses this boundary. Queue bookkeeping (`id`,
//!   `attempts`, `state`) is never visible to the remote side.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Payload;

/// JSON body shape expected by the remote endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireShape {
    /// `[ { ...payload } ]` - a single-element array (sheet-style APIs)
    #[default]
    Array,
    /// `{ ...payload }` - the payload object itself
    Object,
}

impl WireShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireShape::Array => "array",
            WireShape::Object => "object",
        }
    }
}

impl std::fmt::Display for WireShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WireShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "array" => Ok(WireShape::Array),
            "object" => Ok(WireShape::Object),
            other => Err(format!(
                "invalid wire shape '{}'; valid options: array, object",
                other
            )),
        }
    }
}

/// Why a single delivery attempt did not succeed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Transport-level failure (DNS, refused connection, reset, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// No response within the delivery timeout
    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint answered with a non-success status
    #[error("Endpoint rejected the record (HTTP {status}): {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },
}

impl DeliveryError {
    /// True for failures where the endpoint was never reached
    pub fn is_network_failure(&self) -> bool {
        matches!(self, DeliveryError::Network(_) | DeliveryError::Timeout(_))
    }

    /// True when the endpoint was reached but refused the record
    pub fn is_rejection(&self) -> bool {
        matches!(self, DeliveryError::Rejected { .. })
    }
}

/// Port trait for the remote lead endpoint
///
/// ## Implementation Notes
///
/// - Any 2xx response counts as success; the body need not be parsed.
/// - Implementations should bound each request with a timeout and report
///   it as [`DeliveryError::Timeout`]. The engine applies its own bound
///   as well.
#[async_trait::async_trait]
pub trait IDeliveryEndpoint: Send + Sync {
    /// Sends one payload to the remote endpoint
    async fn deliver(&self, payload: &Payload) -> Result<(), DeliveryError>;
}
