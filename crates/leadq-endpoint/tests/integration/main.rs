//! Integration tests for leadq-endpoint
//!
//! Uses wiremock to simulate the remote lead sheet and verifies the wire
//! format, failure classification and the connectivity probe.

mod common;

mod test_delivery;
mod test_probe;
