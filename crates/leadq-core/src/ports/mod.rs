//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IQueueStore`] - Durable queue of undelivered records
//! - [`IDeviceIdentity`] - Stable per-device identifier
//! - [`IDeliveryEndpoint`] - Remote endpoint receiving lead payloads
//! - [`IConnectivityProbe`] - On-demand reachability check
//! - [`INotificationService`] - Sync event reporting to the UI

pub mod connectivity;
pub mod delivery;
pub mod device_identity;
pub mod notification;
pub mod queue_store;

pub use connectivity::{ConnectivityEvent, IConnectivityProbe};
pub use delivery::{DeliveryError, IDeliveryEndpoint, WireShape};
pub use device_identity::IDeviceIdentity;
pub use notification::{DrainSummary, INotificationService, SyncEvent};
pub use queue_store::{IQueueStore, QueueMutation};
