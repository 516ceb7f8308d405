//! Priority triage and verification engine for pharmacy fulfillment orders.
//!
//! The [`triage`] module scores and organizes the pharmacist work queue; the
//! [`capture`] module gates prescription photos before upload. Both keep
//! "now" as an explicit parameter, so every operation is deterministic for a
//! given input.

pub mod capture;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod triage;
