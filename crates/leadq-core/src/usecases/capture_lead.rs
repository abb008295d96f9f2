//! Lead capture use case
//!
//! Turns the raw booth form into a [`Submission`] ready for the sync engine:
//! validates the required fields, stamps the capture time and attaches the
//! device identifier.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::{
    domain::{LeadForm, Submission},
    ports::IDeviceIdentity,
};

/// Use case for converting a booth form into a submission
pub struct CaptureLeadUseCase {
    device_identity: Arc<dyn IDeviceIdentity + Send + Sync>,
}

impl CaptureLeadUseCase {
    /// Creates a new CaptureLeadUseCase
    ///
    /// # Arguments
    ///
    /// * `device_identity` - Source of the per-device identifier
    pub fn new(device_identity: Arc<dyn IDeviceIdentity + Send + Sync>) -> Self {
        Self { device_identity }
    }

    /// Validates `form` and builds a submission captured now
    ///
    /// # Errors
    ///
    /// Returns a [`crate::domain::DomainError`] (inside `anyhow::Error`) when
    /// the form is invalid, or a storage error when the device id cannot be
    /// read or created.
    pub async fn execute(&self, form: LeadForm) -> Result<Submission> {
        self.execute_at(form, Utc::now()).await
    }

    /// Same as [`execute`](Self::execute) with an explicit capture time
    pub async fn execute_at(&self, form: LeadForm, captured_at: DateTime<Utc>) -> Result<Submission> {
        let lead = form.validate()?;

        let device_id = self
            .device_identity
            .device_id()
            .await
            .context("Failed to resolve device identifier")?;

        tracing::debug!(
            device_id = %device_id,
            email_domain = lead.email().domain(),
            "Lead captured"
        );

        let payload = lead.into_payload(&device_id, captured_at);
        Ok(Submission::captured_at(payload, captured_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeviceId, DomainError};
    use chrono::TimeZone;

    struct FixedIdentity(DeviceId);

    #[async_trait::async_trait]
    impl IDeviceIdentity for FixedIdentity {
        async fn device_id(&self) -> anyhow::Result<DeviceId> {
            Ok(self.0.clone())
        }
    }

    struct BrokenIdentity;

    #[async_trait::async_trait]
    impl IDeviceIdentity for BrokenIdentity {
        async fn device_id(&self) -> anyhow::Result<DeviceId> {
            anyhow::bail!("database is locked")
        }
    }

    fn use_case() -> CaptureLeadUseCase {
        let id = DeviceId::new("device-0a1b2c3d4".to_string()).unwrap();
        CaptureLeadUseCase::new(Arc::new(FixedIdentity(id)))
    }

    #[tokio::test]
    async fn test_capture_builds_submission() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let submission = use_case()
            .execute_at(LeadForm::new("Asha", "a@x.com"), at)
            .await
            .unwrap();

        assert_eq!(submission.captured_at, at);
        assert_eq!(submission.payload.get_str("fullName"), Some("Asha"));
        assert_eq!(submission.payload.get_str("email"), Some("a@x.com"));
        assert_eq!(submission.payload.get_str("deviceId"), Some("device-0a1b2c3d4"));
        assert_eq!(
            submission.payload.get_str("timestamp"),
            Some("2026-10-19T08:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_capture_rejects_invalid_form() {
        let err = use_case()
            .execute(LeadForm::new("", "a@x.com"))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<DomainError>(),
            Some(&DomainError::MissingField("fullName".to_string()))
        );
    }

    #[tokio::test]
    async fn test_capture_surfaces_identity_failure() {
        let use_case = CaptureLeadUseCase::new(Arc::new(BrokenIdentity));
        let err = use_case
            .execute(LeadForm::new("Asha", "a@x.com"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("device identifier"));
    }
}
