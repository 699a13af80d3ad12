use serde::{Deserialize, Serialize};
use std::fmt;

/// Actuator groups that report a shared all-angles snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointGroup {
    Swing,
    Horizontal,
}

/// Category of a telemetry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Touch,
    Color,
    Infrared,
    Gyro,
    MotorBall,
    JointAngle(JointGroup),
    AllAngles(JointGroup),
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Touch => write!(f, "touch"),
            ChannelKind::Color => write!(f, "color"),
            ChannelKind::Infrared => write!(f, "infrared"),
            ChannelKind::Gyro => write!(f, "gyro"),
            ChannelKind::MotorBall => write!(f, "motor_ball"),
            ChannelKind::JointAngle(group) => write!(f, "joint_angle/{:?}", group),
            ChannelKind::AllAngles(group) => write!(f, "all_angles/{:?}", group),
        }
    }
}

/// Correlation key. (kind, index) is the only thing a query may match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelKey {
    pub kind: ChannelKind,
    pub index: Option<u8>,
}

impl ChannelKey {
    pub fn indexed(kind: ChannelKind, index: u8) -> Self {
        Self { kind, index: Some(index) }
    }

    pub fn singleton(kind: ChannelKind) -> Self {
        Self { kind, index: None }
    }

    pub fn touch(index: u8) -> Self {
        Self::indexed(ChannelKind::Touch, index)
    }

    pub fn color(index: u8) -> Self {
        Self::indexed(ChannelKind::Color, index)
    }

    pub fn infrared(index: u8) -> Self {
        Self::indexed(ChannelKind::Infrared, index)
    }

    pub fn gyro() -> Self {
        Self::singleton(ChannelKind::Gyro)
    }

    pub fn motor_ball(index: u8) -> Self {
        Self::indexed(ChannelKind::MotorBall, index)
    }

    pub fn joint_angle(group: JointGroup, index: u8) -> Self {
        Self::indexed(ChannelKind::JointAngle(group), index)
    }

    pub fn all_angles(group: JointGroup) -> Self {
        Self::singleton(ChannelKind::AllAngles(group))
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.kind, index),
            None => write!(f, "{}", self.kind),
        }
    }
}
