//! LeadQ Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Record`, `Submission`, `Payload`, `LeadForm`
//! - **Use cases** - `CaptureLeadUseCase`
//! - **Port definitions** - Traits for adapters: `IQueueStore`, `IDeliveryEndpoint`,
//!   `IDeviceIdentity`, `IConnectivityProbe`, `INotificationService`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
