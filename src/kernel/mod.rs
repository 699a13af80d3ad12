//! Correlation core: telemetry cache, command dispatch, request/response
//! correlation and joint convergence.

pub mod cancel;
pub mod channel;
pub mod command;
pub mod convergence;
pub mod power;
pub mod query;
pub mod stats;
pub mod telemetry;
pub mod time;
