use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::kernel::channel::JointGroup;
use crate::kernel::command::Command;
use crate::kernel::telemetry::{TelemetryStore, TelemetryUpdate};

#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Delay between receiving a read command and ingesting the reply.
    pub latency: Duration,
    /// Drop every n-th reply (wireless loss). `None` delivers everything.
    pub drop_every: Option<u32>,
    /// Joint slew rate. Non-positive or infinite means joints jump to target.
    pub joint_speed_deg_per_s: f64,
    pub joints_per_group: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            drop_every: None,
            joint_speed_deg_per_s: 90.0,
            joints_per_group: 4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct JointState {
    from: f64,
    target: f64,
    started: Instant,
}

impl JointState {
    fn at_rest(angle: f64) -> Self {
        Self {
            from: angle,
            target: angle,
            started: Instant::now(),
        }
    }

    fn angle_at(&self, now: Instant, rate: f64) -> f64 {
        let span = self.target - self.from;
        if !rate.is_finite() || rate <= 0.0 {
            return self.target;
        }
        let travel = rate * now.saturating_duration_since(self.started).as_secs_f64();
        if travel >= span.abs() {
            self.target
        } else {
            self.from + span.signum() * travel
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct MotorState {
    position: i64,
    speed: f64,
}

#[derive(Debug, Default)]
struct DeviceModel {
    touch: HashMap<u8, bool>,
    color: HashMap<u8, (u8, Vec<i32>)>,
    infrared: HashMap<u8, f64>,
    gyro: (f64, f64, f64),
    motors: HashMap<u8, MotorState>,
    joints: HashMap<JointGroup, Vec<JointState>>,
    muted: bool,
    replies: u32,
    received: Vec<Command>,
}

/// In-process stand-in for the robot. Drains outbound commands and answers
/// read commands by ingesting telemetry into the store, like the real link.
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    store: Arc<TelemetryStore>,
    model: Arc<Mutex<DeviceModel>>,
    config: SimConfig,
}

impl SimulatedDevice {
    pub fn new(store: Arc<TelemetryStore>, config: SimConfig) -> Self {
        Self {
            store,
            model: Arc::new(Mutex::new(DeviceModel::default())),
            config,
        }
    }

    fn model(&self) -> MutexGuard<'_, DeviceModel> {
        self.model.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_touch(&self, index: u8, pressed: bool) {
        self.model().touch.insert(index, pressed);
    }

    pub fn set_color(&self, index: u8, data: Vec<i32>) {
        let mut model = self.model();
        let entry = model.color.entry(index).or_insert((3, Vec::new()));
        entry.1 = data;
    }

    pub fn set_infrared(&self, index: u8, distance: f64) {
        self.model().infrared.insert(index, distance);
    }

    pub fn set_gyro(&self, x: f64, y: f64, z: f64) {
        self.model().gyro = (x, y, z);
    }

    pub fn set_motor_position(&self, index: u8, position: i64) {
        self.model().motors.entry(index).or_default().position = position;
    }

    /// Places a joint at `angle` with no motion in progress.
    pub fn place_joint(&self, group: JointGroup, index: u8, angle: f64) {
        let mut model = self.model();
        let joints = Self::group_mut(&mut model, group, self.config.joints_per_group);
        if let Some(joint) = joints.get_mut(index as usize) {
            *joint = JointState::at_rest(angle);
        }
    }

    /// Stop answering (or resume). Commands are still recorded while muted.
    pub fn set_muted(&self, muted: bool) {
        self.model().muted = muted;
    }

    /// Every command the device has received, in order.
    pub fn received(&self) -> Vec<Command> {
        self.model().received.clone()
    }

    pub fn spawn(&self, mut rx: mpsc::Receiver<Command>) -> JoinHandle<()> {
        let device = self.clone();
        tokio::spawn(async move {
            info!("Simulated device online");
            while let Some(command) = rx.recv().await {
                if let Some(update) = device.handle(command) {
                    device.deliver(update);
                }
            }
            info!("Simulated device offline");
        })
    }

    fn deliver(&self, update: TelemetryUpdate) {
        if self.config.latency.is_zero() {
            self.store.ingest(update);
            return;
        }
        let store = self.store.clone();
        let latency = self.config.latency;
        tokio::spawn(async move {
            sleep(latency).await;
            store.ingest(update);
        });
    }

    fn group_mut(model: &mut DeviceModel, group: JointGroup, count: usize) -> &mut Vec<JointState> {
        model
            .joints
            .entry(group)
            .or_insert_with(|| vec![JointState::at_rest(0.0); count])
    }

    /// Applies a command to the model and returns the reply, if the command
    /// is a read and the reply survives simulated loss.
    fn handle(&self, command: Command) -> Option<TelemetryUpdate> {
        let now = Instant::now();
        let rate = self.config.joint_speed_deg_per_s;
        let joints_per_group = self.config.joints_per_group;
        let mut model = self.model();
        model.received.push(command.clone());
        debug!(command = command.name(), "Device received command");

        let reply = match command {
            Command::ReadTouch { index } => Some(TelemetryUpdate::Touch {
                index,
                pressed: model.touch.get(&index).copied().unwrap_or(false),
            }),
            Command::ReadColor { index, mode } => {
                let data = model.color.get(&index).map(|(_, d)| d.clone()).unwrap_or_default();
                Some(TelemetryUpdate::Color { index, mode, data })
            }
            Command::SetColorMode { index, mode } => {
                model.color.entry(index).or_insert((mode, Vec::new())).0 = mode;
                None
            }
            Command::ReadInfrared { index } => Some(TelemetryUpdate::Infrared {
                index,
                distance: model.infrared.get(&index).copied().unwrap_or(0.0),
            }),
            Command::ReadGyro => {
                let (x, y, z) = model.gyro;
                Some(TelemetryUpdate::Gyro { x, y, z })
            }
            Command::ResetGyro => {
                model.gyro = (0.0, 0.0, 0.0);
                None
            }
            Command::RotateOnPower { index, power: level, .. } | Command::RotateOnSpeed { index, speed: level, .. } => {
                model.motors.entry(index).or_default().speed = level as f64;
                None
            }
            Command::StopMotor { index, .. } => {
                model.motors.entry(index).or_default().speed = 0.0;
                None
            }
            Command::ResetMotor { index } => {
                model.motors.entry(index).or_default().position = 0;
                None
            }
            Command::ReadMotorAngle { index } | Command::ReadMotorSpeed { index } => {
                let motor = model.motors.get(&index).copied().unwrap_or_default();
                Some(TelemetryUpdate::MotorBall {
                    index,
                    position: motor.position,
                    speed: motor.speed,
                })
            }
            Command::SetJointAngle { group, index, angle } => {
                let joints = Self::group_mut(&mut model, group, joints_per_group);
                if let Some(joint) = joints.get_mut(index as usize) {
                    let current = joint.angle_at(now, rate);
                    *joint = JointState {
                        from: current,
                        target: angle,
                        started: now,
                    };
                }
                None
            }
            Command::ReadJointAngle { group, index } => {
                let joints = Self::group_mut(&mut model, group, joints_per_group);
                joints.get(index as usize).map(|joint| TelemetryUpdate::JointAngle {
                    group,
                    index,
                    angle: joint.angle_at(now, rate),
                })
            }
            Command::ReadAllAngles { group } => {
                let joints = Self::group_mut(&mut model, group, joints_per_group);
                let angles = joints.iter().map(|joint| joint.angle_at(now, rate)).collect();
                Some(TelemetryUpdate::AllAngles { group, angles })
            }
            Command::SetLights { .. }
            | Command::CloseLights { .. }
            | Command::PlayBuzzer { .. }
            | Command::CloseBuzzer { .. }
            | Command::ArmTouchEvent { .. }
            | Command::ArmInfraredEvent { .. }
            | Command::ArmGyroEvent { .. }
            | Command::ArmColorEvent { .. }
            | Command::VoiceRecognize { .. }
            | Command::VoiceSynthesis { .. } => None,
        };

        let reply = reply?;
        if model.muted {
            return None;
        }
        model.replies += 1;
        if let Some(every) = self.config.drop_every {
            if every > 0 && model.replies % every == 0 {
                debug!("Device dropped reply");
                return None;
            }
        }
        Some(reply)
    }
}
