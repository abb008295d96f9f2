//! LeadQ Endpoint - HTTP adapters for the remote lead sheet
//!
//! Provides:
//! - [`client::EndpointClient`] - reqwest wrapper that POSTs payloads in the
//!   configured wire shape and classifies failures
//! - [`provider::HttpDeliveryEndpoint`] - `IDeliveryEndpoint` implementation
//! - [`probe::HttpConnectivityProbe`] - `IConnectivityProbe` implementation

pub mod client;
pub mod probe;
pub mod provider;

use std::time::Duration;

use leadq_core::ports::DeliveryError;
use thiserror::Error;

/// Errors that can occur when talking to the remote endpoint
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The configured URL is empty or not http(s)
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint answered with a non-2xx status
    #[error("Endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<EndpointError> for DeliveryError {
    fn from(e: EndpointError) -> Self {
        match e {
            EndpointError::Timeout(after) => DeliveryError::Timeout(after),
            EndpointError::Rejected { status, body } => DeliveryError::Rejected { status, body },
            other => DeliveryError::Network(other.to_string()),
        }
    }
}
