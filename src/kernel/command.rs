use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::kernel::channel::JointGroup;
use crate::kernel::telemetry::event::GyroAxis;
use crate::kernel::stats::event::LinkEvent;
use crate::kernel::stats::recorder::LinkRecorder;

/// Buzzer code that silences the buzzer.
pub const BUZZER_OFF_CODE: u8 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuzzerTone {
    High,
    Mid,
    Low,
}

impl BuzzerTone {
    /// Device level for a step within the tone's band (high 25-31, mid 18-24, low 11-17).
    pub fn level(self, step: u8) -> u8 {
        let step = step.clamp(1, 7);
        match self {
            BuzzerTone::High => 24 + step,
            BuzzerTone::Mid => 17 + step,
            BuzzerTone::Low => 10 + step,
        }
    }
}

/// Threshold test. `AtLeast` holds when the reading is >= the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    AtLeast,
    Below,
}

impl Threshold {
    pub fn holds(self, reading: f64, threshold: f64) -> bool {
        match self {
            Threshold::AtLeast => reading >= threshold,
            Threshold::Below => reading < threshold,
        }
    }
}

/// Which lights a light command addresses: the main controller and/or drive balls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightTarget {
    pub main: bool,
    pub motors: Vec<u8>,
}

/// Outbound command. Delivery is fire-and-forget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    ReadTouch { index: u8 },
    ReadColor { index: u8, mode: u8 },
    SetColorMode { index: u8, mode: u8 },
    ReadInfrared { index: u8 },
    ReadGyro,
    ResetGyro,
    RotateOnPower { index: u8, direction: RotateDirection, power: u8, seconds: Option<f64> },
    RotateOnSpeed { index: u8, direction: RotateDirection, speed: u8, seconds: Option<f64> },
    StopMotor { index: u8, immediate: bool },
    ResetMotor { index: u8 },
    ReadMotorAngle { index: u8 },
    ReadMotorSpeed { index: u8 },
    SetJointAngle { group: JointGroup, index: u8, angle: f64 },
    ReadJointAngle { group: JointGroup, index: u8 },
    ReadAllAngles { group: JointGroup },
    SetLights { target: LightTarget, color: u8, mode: u8 },
    CloseLights { target: LightTarget },
    PlayBuzzer { level: u8 },
    CloseBuzzer { code: u8 },
    // Event arming: the device watches the condition itself
    ArmTouchEvent { index: u8, pressed: bool },
    ArmInfraredEvent { index: u8, test: Threshold, distance: f64 },
    ArmGyroEvent { axis: GyroAxis, test: Threshold, angle: f64 },
    ArmColorEvent { index: u8, mode: u8 },
    VoiceRecognize { seconds: f64 },
    VoiceSynthesis { content: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::ReadTouch { .. } => "read_touch",
            Command::ReadColor { .. } => "read_color",
            Command::SetColorMode { .. } => "set_color_mode",
            Command::ReadInfrared { .. } => "read_infrared",
            Command::ReadGyro => "read_gyro",
            Command::ResetGyro => "reset_gyro",
            Command::RotateOnPower { .. } => "rotate_on_power",
            Command::RotateOnSpeed { .. } => "rotate_on_speed",
            Command::StopMotor { .. } => "stop_motor",
            Command::ResetMotor { .. } => "reset_motor",
            Command::ReadMotorAngle { .. } => "read_motor_angle",
            Command::ReadMotorSpeed { .. } => "read_motor_speed",
            Command::SetJointAngle { .. } => "set_joint_angle",
            Command::ReadJointAngle { .. } => "read_joint_angle",
            Command::ReadAllAngles { .. } => "read_all_angles",
            Command::SetLights { .. } => "set_lights",
            Command::CloseLights { .. } => "close_lights",
            Command::PlayBuzzer { .. } => "play_buzzer",
            Command::CloseBuzzer { .. } => "close_buzzer",
            Command::ArmTouchEvent { .. } => "arm_touch_event",
            Command::ArmInfraredEvent { .. } => "arm_infrared_event",
            Command::ArmGyroEvent { .. } => "arm_gyro_event",
            Command::ArmColorEvent { .. } => "arm_color_event",
            Command::VoiceRecognize { .. } => "voice_recognize",
            Command::VoiceSynthesis { .. } => "voice_synthesis",
        }
    }
}

/// Hands commands to the transport. No retry, no acknowledgement.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    tx: mpsc::Sender<Command>,
    recorder: Option<Arc<LinkRecorder>>,
}

impl CommandDispatcher {
    pub fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx, recorder: None }
    }

    /// Dispatcher plus the receiving end the transport drains.
    pub fn channel(depth: usize) -> (Self, mpsc::Receiver<Command>) {
        let (tx, rx) = mpsc::channel(depth.max(1));
        (Self::new(tx), rx)
    }

    pub fn with_recorder(mut self, recorder: Arc<LinkRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Never blocks. A full or closed queue drops the command; callers
    /// recover from loss through their own timeouts.
    pub fn send(&self, command: Command) {
        let name = command.name();
        let event = match self.tx.try_send(command) {
            Ok(()) => {
                debug!(command = name, "Command dispatched");
                LinkEvent::CommandSent { command: name }
            }
            Err(TrySendError::Full(_)) => {
                warn!(command = name, "Outbound queue full, command dropped");
                LinkEvent::CommandDropped { command: name }
            }
            Err(TrySendError::Closed(_)) => {
                warn!(command = name, "Transport closed, command dropped");
                LinkEvent::CommandDropped { command: name }
            }
        };
        if let Some(recorder) = &self.recorder {
            recorder.record(event);
        }
    }

    pub fn send_all<I>(&self, commands: I)
    where
        I: IntoIterator<Item = Command>,
    {
        for command in commands {
            self.send(command);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
