//! Device identity port (driven/secondary port)
//!
//! Every payload carries the identifier of the booth device that captured
//! it, so that leads from several devices can be told apart in the sheet.

use crate::domain::DeviceId;

/// Port trait for the stable per-device identifier
///
/// ## Implementation Notes
///
/// - The first call generates an id with [`DeviceId::generate`] and persists
///   it; every later call, including after a restart, returns the same id.
/// - Uses `anyhow::Result` because persistence is adapter-specific.
#[async_trait::async_trait]
pub trait IDeviceIdentity: Send + Sync {
    /// Returns this device's identifier, creating it on first use
    async fn device_id(&self) -> anyhow::Result<DeviceId>;
}
