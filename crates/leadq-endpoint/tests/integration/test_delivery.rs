//! Delivery endpoint behavior against a mock sheet

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use leadq_core::ports::{DeliveryError, IDeliveryEndpoint, WireShape};
use leadq_endpoint::client::EndpointClient;
use leadq_endpoint::provider::HttpDeliveryEndpoint;

use crate::common::{self, LEADS_PATH};

#[tokio::test]
async fn test_array_shape_posts_single_element_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LEADS_PATH))
        .and(header("content-type", "application/json"))
        .and(body_json(json!([{
            "timestamp": "2026-10-19T14:05:09Z",
            "fullName": "Asha",
            "email": "a@x.com",
            "deviceId": "device-abc123def"
        }])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = common::endpoint_for(&server, WireShape::Array, Duration::from_secs(5));
    endpoint
        .deliver(&common::sample_payload())
        .await
        .expect("delivery should succeed");
}

#[tokio::test]
async fn test_object_shape_posts_payload_itself() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LEADS_PATH))
        .and(body_json(json!({
            "timestamp": "2026-10-19T14:05:09Z",
            "fullName": "Asha",
            "email": "a@x.com",
            "deviceId": "device-abc123def"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = common::endpoint_for(&server, WireShape::Object, Duration::from_secs(5));
    assert!(endpoint.deliver(&common::sample_payload()).await.is_ok());
}

#[tokio::test]
async fn test_non_2xx_is_rejection_with_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LEADS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("sheet is full"))
        .mount(&server)
        .await;

    let endpoint = common::endpoint_for(&server, WireShape::Array, Duration::from_secs(5));
    let err = endpoint.deliver(&common::sample_payload()).await.unwrap_err();

    assert_eq!(
        err,
        DeliveryError::Rejected {
            status: 500,
            body: "sheet is full".to_string()
        }
    );
}

#[tokio::test]
async fn test_not_found_is_rejection() {
    let server = common::setup_endpoint_mock(404).await;
    let endpoint = common::endpoint_for(&server, WireShape::Array, Duration::from_secs(5));

    let err = endpoint.deliver(&common::sample_payload()).await.unwrap_err();
    assert!(err.is_rejection());
}

#[tokio::test]
async fn test_slow_endpoint_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LEADS_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let endpoint = common::endpoint_for(&server, WireShape::Array, Duration::from_millis(200));
    let err = endpoint.deliver(&common::sample_payload()).await.unwrap_err();

    assert_eq!(err, DeliveryError::Timeout(Duration::from_millis(200)));
}

#[tokio::test]
async fn test_unreachable_host_is_network_failure() {
    let client = EndpointClient::new(
        common::closed_port_url(),
        WireShape::Array,
        Duration::from_secs(2),
    )
    .unwrap();
    let endpoint = HttpDeliveryEndpoint::new(client);

    let err = endpoint.deliver(&common::sample_payload()).await.unwrap_err();
    assert!(err.is_network_failure(), "got: {err:?}");
}
