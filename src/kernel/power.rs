use serde::{Deserialize, Serialize};
use crate::kernel::command::{Command, RotateDirection};
use crate::kernel::time::MAX_WAIT;

pub const UI_POWER_MAX: f64 = 100.0;
pub const DEVICE_POWER_FLOOR: u8 = 35;
const DEVICE_POWER_SLOPE: f64 = 0.65;

/// Remaps a 0-100 UI power/speed onto the drive's live range, skipping the
/// dead zone below 35. Out-of-range and NaN inputs are clamped first.
pub fn map_power(ui_power: f64) -> u8 {
    let clamped = if ui_power.is_nan() { 0.0 } else { ui_power.clamp(0.0, UI_POWER_MAX) };
    (clamped * DEVICE_POWER_SLOPE).floor() as u8 + DEVICE_POWER_FLOOR
}

/// Whether a batch drives by power or by speed. Both go through `map_power`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    Power,
    Speed,
}

/// One drive ball in a rotate command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorDrive {
    pub index: u8,
    pub direction: RotateDirection,
    /// UI scale, 0-100.
    pub level: f64,
    /// Run time; `None` rotates until stopped.
    pub seconds: Option<f64>,
}

/// Primary drive ball plus its mutation list, issued as one logical command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorBatch {
    pub mode: DriveMode,
    pub primary: MotorDrive,
    pub mutations: Vec<MotorDrive>,
}

impl MotorBatch {
    pub fn new(mode: DriveMode, primary: MotorDrive) -> Self {
        Self {
            mode,
            primary,
            mutations: Vec::new(),
        }
    }

    pub fn with_mutation(mut self, drive: MotorDrive) -> Self {
        self.mutations.push(drive);
        self
    }

    pub fn members(&self) -> impl Iterator<Item = &MotorDrive> {
        std::iter::once(&self.primary).chain(self.mutations.iter())
    }

    /// Longest run time across the batch, capped at `MAX_WAIT`. The batch is
    /// done when its slowest member is.
    pub fn max_seconds(&self) -> f64 {
        self.members()
            .filter_map(|m| m.seconds)
            .filter(|s| s.is_finite())
            .fold(0.0, f64::max)
            .clamp(0.0, MAX_WAIT.as_secs_f64())
    }

    /// Device commands for every member, each calibrated the same way.
    pub fn commands(&self) -> Vec<Command> {
        self.members()
            .map(|drive| {
                let level = map_power(drive.level);
                match self.mode {
                    DriveMode::Power => Command::RotateOnPower {
                        index: drive.index,
                        direction: drive.direction,
                        power: level,
                        seconds: drive.seconds,
                    },
                    DriveMode::Speed => Command::RotateOnSpeed {
                        index: drive.index,
                        direction: drive.direction,
                        speed: level,
                        seconds: drive.seconds,
                    },
                }
            })
            .collect()
    }
}
