//! Link statistics.
//!
//! Write-only from the point of view of the correlation core: queries and
//! moves record what happened here, but never read it back to decide anything.

pub mod event;
pub mod metrics;
pub mod recorder;
