//! Use cases (interactors) for LeadQ
//!
//! Use cases are thin coordinators that delegate business rules to domain
//! methods and I/O to ports. Delivery and queueing live in the sync engine
//! crate; this layer covers what happens before a lead reaches it.
//!
//! ## Use Cases
//!
//! - [`CaptureLeadUseCase`] - Validate a booth form and turn it into a submission

pub mod capture_lead;

pub use capture_lead::CaptureLeadUseCase;
