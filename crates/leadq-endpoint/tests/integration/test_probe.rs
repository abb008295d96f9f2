//! Connectivity probe behavior

use std::time::Duration;

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use leadq_core::ports::IConnectivityProbe;
use leadq_endpoint::probe::HttpConnectivityProbe;

use crate::common;

#[tokio::test]
async fn test_any_http_answer_means_reachable() {
    for status in [200u16, 405, 503] {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let probe = HttpConnectivityProbe::new(server.uri()).unwrap();
        assert!(probe.is_reachable().await, "status {status} should count as reachable");
    }
}

#[tokio::test]
async fn test_unanswered_probe_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let probe = HttpConnectivityProbe::with_timeout(server.uri(), Duration::from_millis(200)).unwrap();
    assert!(!probe.is_reachable().await);
}

#[tokio::test]
async fn test_closed_port_is_unreachable() {
    let probe =
        HttpConnectivityProbe::with_timeout(common::closed_port_url(), Duration::from_secs(1))
            .unwrap();
    assert!(!probe.is_reachable().await);
}

#[test]
fn test_probe_rejects_non_http_url() {
    assert!(HttpConnectivityProbe::new("localhost:8080").is_err());
}
