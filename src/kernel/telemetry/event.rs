use serde::{Deserialize, Serialize};
use crate::kernel::channel::{ChannelKey, ChannelKind, JointGroup};

/// Inbound telemetry as handed over by the transport.
/// Field layout per kind; unknown tags land in `Unknown` and are dropped on ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryUpdate {
    Touch { index: u8, pressed: bool },
    Color { index: u8, mode: u8, data: Vec<i32> },
    Infrared { index: u8, distance: f64 },
    Gyro { x: f64, y: f64, z: f64 },
    MotorBall { index: u8, position: i64, speed: f64 },
    JointAngle { group: JointGroup, index: u8, angle: f64 },
    AllAngles { group: JointGroup, angles: Vec<f64> },
    #[serde(other)]
    Unknown,
}

impl TelemetryUpdate {
    /// Correlation key this update targets. `None` for unrecognized kinds.
    pub fn key(&self) -> Option<ChannelKey> {
        match self {
            TelemetryUpdate::Touch { index, .. } => Some(ChannelKey::touch(*index)),
            TelemetryUpdate::Color { index, .. } => Some(ChannelKey::color(*index)),
            TelemetryUpdate::Infrared { index, .. } => Some(ChannelKey::infrared(*index)),
            TelemetryUpdate::Gyro { .. } => Some(ChannelKey::gyro()),
            TelemetryUpdate::MotorBall { index, .. } => Some(ChannelKey::motor_ball(*index)),
            TelemetryUpdate::JointAngle { group, index, .. } => Some(ChannelKey::joint_angle(*group, *index)),
            TelemetryUpdate::AllAngles { group, .. } => Some(ChannelKey::all_angles(*group)),
            TelemetryUpdate::Unknown => None,
        }
    }

    /// Builds the record this update overwrites, with `changed` raised.
    pub fn into_record(self) -> Option<TelemetryRecord> {
        let record = match self {
            TelemetryUpdate::Touch { index, pressed } => {
                TelemetryRecord::Touch(TouchRecord { index, pressed, changed: true })
            }
            TelemetryUpdate::Color { index, mode, data } => {
                TelemetryRecord::Color(ColorRecord { index, mode, data, changed: true })
            }
            TelemetryUpdate::Infrared { index, distance } => {
                TelemetryRecord::Infrared(InfraredRecord { index, distance, changed: true })
            }
            TelemetryUpdate::Gyro { x, y, z } => TelemetryRecord::Gyro(GyroRecord { x, y, z, changed: true }),
            TelemetryUpdate::MotorBall { index, position, speed } => {
                TelemetryRecord::MotorBall(MotorBallRecord { index, position, speed, changed: true })
            }
            TelemetryUpdate::JointAngle { group, index, angle } => {
                TelemetryRecord::JointAngle(ActuatorAngleRecord { group, index, angle, changed: true })
            }
            TelemetryUpdate::AllAngles { group, angles } => {
                TelemetryRecord::AllAngles(AllAnglesSnapshot { group, angles, changed: true })
            }
            TelemetryUpdate::Unknown => return None,
        };
        Some(record)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GyroAxis {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchRecord {
    pub index: u8,
    pub pressed: bool,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRecord {
    pub index: u8,
    pub mode: u8,
    pub data: Vec<i32>,
    pub changed: bool,
}

impl ColorRecord {
    /// First data slot carries the colour id in colour mode.
    pub fn primary(&self) -> Option<i32> {
        self.data.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfraredRecord {
    pub index: u8,
    pub distance: f64,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GyroRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub changed: bool,
}

impl GyroRecord {
    /// Axis reading folded into one turn.
    pub fn axis(&self, axis: GyroAxis) -> f64 {
        let raw = match axis {
            GyroAxis::X => self.x,
            GyroAxis::Y => self.y,
            GyroAxis::Z => self.z,
        };
        raw % 360.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorBallRecord {
    pub index: u8,
    pub position: i64,
    pub speed: f64,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorAngleRecord {
    pub group: JointGroup,
    pub index: u8,
    pub angle: f64,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllAnglesSnapshot {
    pub group: JointGroup,
    pub angles: Vec<f64>,
    pub changed: bool,
}

impl AllAnglesSnapshot {
    pub fn angle(&self, joint: u8) -> Option<f64> {
        self.angles.get(joint as usize).copied()
    }
}

/// One stored record per correlation key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryRecord {
    Touch(TouchRecord),
    Color(ColorRecord),
    Infrared(InfraredRecord),
    Gyro(GyroRecord),
    MotorBall(MotorBallRecord),
    JointAngle(ActuatorAngleRecord),
    AllAngles(AllAnglesSnapshot),
}

impl TelemetryRecord {
    pub fn kind(&self) -> ChannelKind {
        match self {
            TelemetryRecord::Touch(_) => ChannelKind::Touch,
            TelemetryRecord::Color(_) => ChannelKind::Color,
            TelemetryRecord::Infrared(_) => ChannelKind::Infrared,
            TelemetryRecord::Gyro(_) => ChannelKind::Gyro,
            TelemetryRecord::MotorBall(_) => ChannelKind::MotorBall,
            TelemetryRecord::JointAngle(r) => ChannelKind::JointAngle(r.group),
            TelemetryRecord::AllAngles(r) => ChannelKind::AllAngles(r.group),
        }
    }

    pub fn changed(&self) -> bool {
        match self {
            TelemetryRecord::Touch(r) => r.changed,
            TelemetryRecord::Color(r) => r.changed,
            TelemetryRecord::Infrared(r) => r.changed,
            TelemetryRecord::Gyro(r) => r.changed,
            TelemetryRecord::MotorBall(r) => r.changed,
            TelemetryRecord::JointAngle(r) => r.changed,
            TelemetryRecord::AllAngles(r) => r.changed,
        }
    }

    pub(crate) fn set_changed(&mut self, changed: bool) {
        let flag = match self {
            TelemetryRecord::Touch(r) => &mut r.changed,
            TelemetryRecord::Color(r) => &mut r.changed,
            TelemetryRecord::Infrared(r) => &mut r.changed,
            TelemetryRecord::Gyro(r) => &mut r.changed,
            TelemetryRecord::MotorBall(r) => &mut r.changed,
            TelemetryRecord::JointAngle(r) => &mut r.changed,
            TelemetryRecord::AllAngles(r) => &mut r.changed,
        };
        *flag = changed;
    }

    pub fn as_touch(&self) -> Option<&TouchRecord> {
        match self {
            TelemetryRecord::Touch(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<&ColorRecord> {
        match self {
            TelemetryRecord::Color(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_infrared(&self) -> Option<&InfraredRecord> {
        match self {
            TelemetryRecord::Infrared(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_gyro(&self) -> Option<&GyroRecord> {
        match self {
            TelemetryRecord::Gyro(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_motor_ball(&self) -> Option<&MotorBallRecord> {
        match self {
            TelemetryRecord::MotorBall(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_joint_angle(&self) -> Option<&ActuatorAngleRecord> {
        match self {
            TelemetryRecord::JointAngle(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_all_angles(&self) -> Option<&AllAnglesSnapshot> {
        match self {
            TelemetryRecord::AllAngles(r) => Some(r),
            _ => None,
        }
    }
}
