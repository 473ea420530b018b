//! Operational rules engine for the residence backend.
//!
//! The CRUD surface of the backend (profiles, tickets, subscriptions) lives
//! elsewhere. This crate holds the few rules whose timing and idempotency
//! must be right on their own:
//! - daily attendance reconciliation (`attendance`)
//! - leave/travel permission validation (`permission`)
//! - complaint-reply notifications (`notification`)
//! - the checkout clearance lifecycle (`clearance`)
//!
//! Storage is reached only through [`PersistenceGateway`]; time only through
//! [`Clock`].

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod attendance;
pub mod clearance;
pub mod clock;
pub mod engine;
pub mod errors;
pub mod gateway;
pub mod model;
pub mod notification;
pub mod permission;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use attendance::ReconcileReport;
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::RulesEngine;
pub use errors::{ClearanceError, ErrorCategory, GatewayError, PermissionError, PermissionRejection};
pub use gateway::PersistenceGateway;
