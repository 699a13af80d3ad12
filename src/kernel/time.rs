use std::time::Duration;
use tokio::time::Instant;

// Cadences and bounds used by the block layer. All overridable through `BridgeConfig`.
pub const QUERY_POLL_MS: u64 = 10;
pub const QUERY_TIMEOUT_MS: u64 = 500;
pub const GYRO_TIMEOUT_MS: u64 = 3000;
pub const READING_TIMEOUT_MS: u64 = 1000;
pub const JOINT_POLL_MS: u64 = 20;
pub const JOINT_DEADLINE_MS: u64 = 2000;
pub const SNAPSHOT_TIMEOUT_MS: u64 = 200;

/// Ceiling for any single wait or hold. Longer requests are cut down to this.
pub const MAX_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

/// `start + limit` with the limit capped at `MAX_WAIT`, so huge windows cannot overflow `Instant`.
pub fn deadline_after(start: Instant, limit: Duration) -> Instant {
    start + limit.min(MAX_WAIT)
}

/// A poll cadence paired with the hard upper bound of the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollWindow {
    pub interval: Duration,
    pub limit: Duration,
}

impl PollWindow {
    pub fn new(interval: Duration, limit: Duration) -> Self {
        Self { interval, limit }
    }

    pub fn from_millis(interval_ms: u64, limit_ms: u64) -> Self {
        Self::new(Duration::from_millis(interval_ms), Duration::from_millis(limit_ms))
    }

    /// Same cadence, shorter bound. Never widens the window.
    pub fn capped(&self, limit: Duration) -> Self {
        Self {
            interval: self.interval,
            limit: self.limit.min(limit),
        }
    }
}

impl Default for PollWindow {
    fn default() -> Self {
        Self::from_millis(QUERY_POLL_MS, QUERY_TIMEOUT_MS)
    }
}
