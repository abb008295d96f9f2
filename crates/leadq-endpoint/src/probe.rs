//! HTTP connectivity probe
//!
//! Sends a `HEAD` request to the probe URL. Any HTTP response, including
//! 4xx and 5xx, proves the network path works; only transport errors and
//! timeouts count as unreachable.

use std::time::Duration;

use leadq_core::ports::IConnectivityProbe;
use reqwest::Client;
use tracing::trace;

use crate::EndpointError;

/// Probe requests are kept short regardless of the delivery timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// `IConnectivityProbe` backed by a lightweight HTTP request
#[derive(Debug, Clone)]
pub struct HttpConnectivityProbe {
    client: Client,
    url: String,
}

impl HttpConnectivityProbe {
    /// Creates a probe for `url` with [`DEFAULT_PROBE_TIMEOUT`]
    pub fn new(url: impl Into<String>) -> Result<Self, EndpointError> {
        Self::with_timeout(url, DEFAULT_PROBE_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, EndpointError> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(EndpointError::InvalidUrl(url));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EndpointError::ClientBuild(e.to_string()))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IConnectivityProbe for HttpConnectivityProbe {
    async fn is_reachable(&self) -> bool {
        match self.client.head(&self.url).send().await {
            Ok(response) => {
                trace!(url = %self.url, status = response.status().as_u16(), "Probe answered");
                true
            }
            Err(e) => {
                trace!(url = %self.url, error = %e, "Probe failed");
                false
            }
        }
    }
}
