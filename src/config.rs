use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::kernel::time::{
    PollWindow, GYRO_TIMEOUT_MS, JOINT_DEADLINE_MS, JOINT_POLL_MS, QUERY_POLL_MS, QUERY_TIMEOUT_MS,
    MAX_WAIT, READING_TIMEOUT_MS, SNAPSHOT_TIMEOUT_MS,
};

/// Cadences and bounds for every correlated operation. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub query_poll_ms: u64,
    /// Comparison queries (touch / colour / infrared / gyro compare).
    pub query_timeout_ms: u64,
    pub gyro_timeout_ms: u64,
    /// Value reads (colour value, distance, motor angle and speed, joint angle).
    pub reading_timeout_ms: u64,
    pub joint_poll_ms: u64,
    pub joint_tolerance_deg: f64,
    pub joint_deadline_ms: u64,
    pub snapshot_timeout_ms: u64,
    pub command_queue_depth: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            query_poll_ms: QUERY_POLL_MS,
            query_timeout_ms: QUERY_TIMEOUT_MS,
            gyro_timeout_ms: GYRO_TIMEOUT_MS,
            reading_timeout_ms: READING_TIMEOUT_MS,
            joint_poll_ms: JOINT_POLL_MS,
            joint_tolerance_deg: 3.0,
            joint_deadline_ms: JOINT_DEADLINE_MS,
            snapshot_timeout_ms: SNAPSHOT_TIMEOUT_MS,
            command_queue_depth: 100,
        }
    }
}

impl BridgeConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("query_poll_ms", self.query_poll_ms),
            ("query_timeout_ms", self.query_timeout_ms),
            ("gyro_timeout_ms", self.gyro_timeout_ms),
            ("reading_timeout_ms", self.reading_timeout_ms),
            ("joint_poll_ms", self.joint_poll_ms),
            ("joint_deadline_ms", self.joint_deadline_ms),
            ("snapshot_timeout_ms", self.snapshot_timeout_ms),
        ];
        let max_ms = MAX_WAIT.as_millis() as u64;
        for (field, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
            if value > max_ms {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be at most {} ms, got {}", max_ms, value),
                });
            }
        }
        if !(self.joint_tolerance_deg >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "joint_tolerance_deg",
                reason: format!("must be a non-negative number, got {}", self.joint_tolerance_deg),
            });
        }
        if self.command_queue_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "command_queue_depth",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn compare_window(&self) -> PollWindow {
        PollWindow::from_millis(self.query_poll_ms, self.query_timeout_ms)
    }

    pub fn gyro_window(&self) -> PollWindow {
        PollWindow::from_millis(self.query_poll_ms, self.gyro_timeout_ms)
    }

    pub fn reading_window(&self) -> PollWindow {
        PollWindow::from_millis(self.query_poll_ms, self.reading_timeout_ms)
    }

    pub fn joint_window(&self) -> PollWindow {
        PollWindow::from_millis(self.joint_poll_ms, self.joint_deadline_ms)
    }

    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_millis(self.snapshot_timeout_ms)
    }
}
