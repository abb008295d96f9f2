//! HttpDeliveryEndpoint - IDeliveryEndpoint implementation over HTTP
//!
//! Wraps the [`EndpointClient`] and converts its errors into the port-level
//! [`DeliveryError`] the sync engine classifies.

use leadq_core::config::EndpointConfig;
use leadq_core::domain::Payload;
use leadq_core::ports::{DeliveryError, IDeliveryEndpoint};
use tracing::{debug, warn};

use crate::client::EndpointClient;
use crate::EndpointError;

/// Delivers lead payloads to the remote sheet with an HTTP POST
#[derive(Debug, Clone)]
pub struct HttpDeliveryEndpoint {
    client: EndpointClient,
}

impl HttpDeliveryEndpoint {
    pub fn new(client: EndpointClient) -> Self {
        Self { client }
    }

    /// Builds the endpoint from the `endpoint` config section
    pub fn from_config(config: &EndpointConfig) -> Result<Self, EndpointError> {
        let client = EndpointClient::new(config.url.clone(), config.wire_shape, config.timeout())?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &EndpointClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IDeliveryEndpoint for HttpDeliveryEndpoint {
    async fn deliver(&self, payload: &Payload) -> Result<(), DeliveryError> {
        debug!(
            url = self.client.url(),
            wire_shape = %self.client.wire_shape(),
            "Delivering payload"
        );

        self.client.post(payload).await.map_err(|e| {
            warn!(url = self.client.url(), error = %e, "Delivery failed");
            DeliveryError::from(e)
        })
    }
}
