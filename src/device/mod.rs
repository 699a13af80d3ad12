//! Stand-ins for the hardware end of the link.

pub mod sim;

pub use sim::{SimConfig, SimulatedDevice};
