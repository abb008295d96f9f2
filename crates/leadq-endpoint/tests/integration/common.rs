//! Shared test helpers for endpoint integration tests

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use leadq_core::domain::Payload;
use leadq_core::ports::WireShape;
use leadq_endpoint::client::EndpointClient;
use leadq_endpoint::provider::HttpDeliveryEndpoint;

pub const LEADS_PATH: &str = "/api/leads";

/// Starts a mock server answering POST /api/leads with `status`
pub async fn setup_endpoint_mock(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LEADS_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string("ok"))
        .mount(&server)
        .await;
    server
}

pub fn endpoint_for(server: &MockServer, shape: WireShape, timeout: Duration) -> HttpDeliveryEndpoint {
    let client = EndpointClient::new(format!("{}{}", server.uri(), LEADS_PATH), shape, timeout)
        .expect("valid mock url");
    HttpDeliveryEndpoint::new(client)
}

pub fn sample_payload() -> Payload {
    Payload::new()
        .with("timestamp", "2026-10-19T14:05:09Z")
        .with("fullName", "Asha")
        .with("email", "a@x.com")
        .with("deviceId", "device-abc123def")
}

/// URL of a local port nothing listens on
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}{}", port, LEADS_PATH)
}
