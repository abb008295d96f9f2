//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for domain identifiers and values.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// RecordId
// ============================================================================

/// Identifier of a record held in the queue store
///
/// Only records that are persisted get an id; leads delivered on the first
/// attempt never need one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new random RecordId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a RecordId from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid RecordId: {e}")))
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// ============================================================================
// DeviceId
// ============================================================================

/// Prefix shared by every generated device identifier
pub const DEVICE_ID_PREFIX: &str = "device-";

/// Number of random characters following the prefix
const DEVICE_ID_RANDOM_LEN: usize = 9;

/// Stable per-device identifier attached to every lead payload
///
/// Generated once (`device-` followed by 9 lowercase hex characters) and
/// reused for the lifetime of the device's storage so that the remote sheet
/// can tell which booth device captured a lead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Generate a fresh random device identifier
    #[must_use]
    pub fn generate() -> Self {
        let random = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{DEVICE_ID_PREFIX}{}",
            &random[..DEVICE_ID_RANDOM_LEN]
        ))
    }

    /// Wrap an existing identifier, e.g. one loaded from storage
    ///
    /// # Errors
    /// Returns error if the value is blank, lacks the `device-` prefix or
    /// contains whitespace
    pub fn new(value: String) -> Result<Self, DomainError> {
        let suffix = value
            .strip_prefix(DEVICE_ID_PREFIX)
            .ok_or_else(|| DomainError::InvalidDeviceId(value.clone()))?;
        if suffix.is_empty() || suffix.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidDeviceId(value));
        }
        Ok(Self(value))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

// ============================================================================
// Email
// ============================================================================

/// A validated email address as typed by the visitor
///
/// The value is trimmed but otherwise kept as entered; the remote sheet
/// receives exactly what the visitor typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Create a new validated Email
    ///
    /// # Errors
    /// Returns error if the email format is invalid
    pub fn new(email: String) -> Result<Self, DomainError> {
        let email = email.trim().to_string();
        Self::validate(&email)?;
        Ok(Self(email))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the domain part (after @)
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split('@').nth(1).unwrap_or("")
    }

    fn validate(email: &str) -> Result<(), DomainError> {
        if email.is_empty() {
            return Err(DomainError::InvalidEmail(
                "Email cannot be empty".to_string(),
            ));
        }

        if email.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidEmail(format!(
                "Email cannot contain whitespace: {email}"
            )));
        }

        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 {
            return Err(DomainError::InvalidEmail(format!(
                "Email must contain exactly one '@': {email}"
            )));
        }

        let local = parts[0];
        let domain = parts[1];

        if local.is_empty() {
            return Err(DomainError::InvalidEmail(format!(
                "Email local part cannot be empty: {email}"
            )));
        }

        // Domain needs a dot with something on both sides
        match domain.rsplit_once('.') {
            Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
            _ => Err(DomainError::InvalidEmail(format!(
                "Email domain must look like host.tld: {email}"
            ))),
        }
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Email {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

// ============================================================================
// Tests
// ============================================================================
