//! Telemetry cache fed by the hardware link.
//!
//! # ISOLATION INVARIANT
//! Change flags are kept per (kind, index). A flag raised on one key must
//! never satisfy, or be cleared by, a query issued against another key.

pub mod event;
pub mod store;

pub use event::{TelemetryRecord, TelemetryUpdate};
pub use store::TelemetryStore;
