//! Booth lead form
//!
//! [`LeadForm`] is the typed shape of what the visitor types into the booth
//! form. Validation happens here, at the collection boundary, so that the
//! sync engine never has to look inside a payload.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{DeviceId, Email};
use super::payload::Payload;

/// Sheet column names, in the order the remote sheet expects them
pub mod fields {
    pub const TIMESTAMP: &str = "timestamp";
    pub const FULL_NAME: &str = "fullName";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const COMPANY: &str = "company";
    pub const JOB_TITLE: &str = "jobTitle";
    pub const COUNTRY: &str = "country";
    pub const PRODUCT_INTEREST: &str = "productInterest";
    pub const LEAD_SOURCE: &str = "leadSource";
    pub const NOTES: &str = "notes";
    pub const FOLLOW_UP: &str = "followUp";
    pub const CONSENT: &str = "consent";
    pub const DEVICE_ID: &str = "deviceId";
}

/// Raw values collected from the booth form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub job_title: String,
    pub country: String,
    /// Selected options of the multi-select
    pub product_interest: Vec<String>,
    pub lead_source: String,
    pub notes: String,
    /// Value of the checked follow-up radio, empty when none is checked
    pub follow_up: String,
    pub consent: bool,
}

/// A lead that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLead {
    form: LeadForm,
    email: Email,
}

impl LeadForm {
    /// Creates a form with the two required fields set
    pub fn new(full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Checks required fields and trims every text value
    ///
    /// # Errors
    /// - `DomainError::MissingField` when the full name or email is blank
    /// - `DomainError::InvalidEmail` when the email is malformed
    pub fn validate(self) -> Result<ValidatedLead, DomainError> {
        let form = self.trimmed();

        if form.full_name.is_empty() {
            return Err(DomainError::MissingField(fields::FULL_NAME.to_string()));
        }
        if form.email.is_empty() {
            return Err(DomainError::MissingField(fields::EMAIL.to_string()));
        }
        let email = Email::new(form.email.clone())?;

        Ok(ValidatedLead { form, email })
    }

    fn trimmed(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            company: self.company.trim().to_string(),
            job_title: self.job_title.trim().to_string(),
            country: self.country.trim().to_string(),
            product_interest: self
                .product_interest
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            lead_source: self.lead_source.trim().to_string(),
            notes: self.notes.trim().to_string(),
            follow_up: self.follow_up.trim().to_string(),
            consent: self.consent,
        }
    }
}

impl ValidatedLead {
    pub fn full_name(&self) -> &str {
        &self.form.full_name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Builds the remote payload in sheet column order
    pub fn into_payload(self, device_id: &DeviceId, captured_at: DateTime<Utc>) -> Payload {
        let form = self.form;
        Payload::new()
            .with(
                fields::TIMESTAMP,
                captured_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .with(fields::FULL_NAME, form.full_name)
            .with(fields::EMAIL, String::from(self.email))
            .with(fields::PHONE, form.phone)
            .with(fields::COMPANY, form.company)
            .with(fields::JOB_TITLE, form.job_title)
            .with(fields::COUNTRY, form.country)
            .with(fields::PRODUCT_INTEREST, form.product_interest.join(", "))
            .with(fields::LEAD_SOURCE, form.lead_source)
            .with(fields::NOTES, form.notes)
            .with(fields::FOLLOW_UP, form.follow_up)
            .with(fields::CONSENT, if form.consent { "Yes" } else { "No" })
            .with(fields::DEVICE_ID, device_id.as_str())
    }
}
