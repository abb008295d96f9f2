//! HTTP client for the remote lead endpoint
//!
//! Wraps `reqwest::Client` with the endpoint URL, the wire shape and a
//! per-request timeout.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use leadq_core::domain::Payload;
//! use leadq_core::ports::WireShape;
//! use leadq_endpoint::client::EndpointClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = EndpointClient::new(
//!     "https://sheets.example.com/api/leads",
//!     WireShape::Array,
//!     Duration::from_secs(15),
//! )?;
//! client.post(&Payload::new().with("fullName", "Asha")).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use leadq_core::domain::Payload;
use leadq_core::ports::WireShape;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use crate::EndpointError;

/// Longest response body kept in a rejection error
const MAX_ERROR_BODY_CHARS: usize = 512;

const USER_AGENT: &str = concat!("leadq/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one endpoint URL
#[derive(Debug, Clone)]
pub struct EndpointClient {
    client: Client,
    url: String,
    wire_shape: WireShape,
    timeout: Duration,
}

impl EndpointClient {
    /// Creates a client for `url`
    ///
    /// # Errors
    /// Returns `EndpointError::InvalidUrl` for an empty or non-http(s) URL.
    pub fn new(
        url: impl Into<String>,
        wire_shape: WireShape,
        timeout: Duration,
    ) -> Result<Self, EndpointError> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(EndpointError::InvalidUrl(url));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| EndpointError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            url,
            wire_shape,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn wire_shape(&self) -> WireShape {
        self.wire_shape
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates a request builder against the endpoint URL
    pub fn request(&self, method: Method) -> RequestBuilder {
        self.client.request(method, &self.url)
    }

    /// JSON body for `payload` in the configured wire shape
    pub fn body_for(&self, payload: &Payload) -> Value {
        match self.wire_shape {
            WireShape::Array => Value::Array(vec![payload.to_value()]),
            WireShape::Object => payload.to_value(),
        }
    }

    /// POSTs one payload; any 2xx is success
    pub async fn post(&self, payload: &Payload) -> Result<(), EndpointError> {
        let body = self.body_for(payload);

        let response = self
            .request(Method::POST)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Endpoint accepted payload");
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        Err(EndpointError::Rejected {
            status: status.as_u16(),
            body: truncate(&text, MAX_ERROR_BODY_CHARS),
        })
    }

    fn classify(&self, e: reqwest::Error) -> EndpointError {
        if e.is_timeout() {
            EndpointError::Timeout(self.timeout)
        } else {
            EndpointError::Network(e)
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push('…');
    out
}
