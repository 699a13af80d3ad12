pub mod bridge;
pub mod config;
pub mod device;
pub mod error;
pub mod kernel;

// Re-export the pieces the block layer reaches for most
pub use bridge::{Bridge, WaitMode};
pub use config::BridgeConfig;
pub use kernel::query::Reading;
