use std::time::Duration;
use tracing::debug;

use super::{Bridge, WaitMode};
use crate::kernel::channel::{ChannelKey, JointGroup};
use crate::kernel::command::Command;
use crate::kernel::convergence::{BatchReport, MoveReport, MoveRequest};
use crate::kernel::power::MotorBatch;
use crate::kernel::query::Reading;
use crate::kernel::time::MAX_WAIT;

impl Bridge {
    /// Starts every drive ball in the batch. With `WaitMode::Wait`, holds the
    /// caller for the longest run time in the batch. Returns the time waited.
    pub async fn rotate(&self, batch: &MotorBatch, wait: WaitMode) -> Duration {
        let commands = batch.commands();
        debug!(members = commands.len(), mode = ?batch.mode, "Rotating drive balls");
        for command in commands {
            self.send(command);
        }

        let hold = batch.max_seconds();
        match wait {
            WaitMode::Wait if hold > 0.0 => {
                let hold = Duration::try_from_secs_f64(hold).unwrap_or(MAX_WAIT).min(MAX_WAIT);
                self.pause(hold).await
            }
            _ => Duration::ZERO,
        }
    }

    pub fn stop_motors(&self, indices: &[u8], immediate: bool) {
        for &index in indices {
            self.send(Command::StopMotor { index, immediate });
        }
    }

    pub fn reset_motors(&self, indices: &[u8]) {
        for &index in indices {
            self.send(Command::ResetMotor { index });
        }
    }

    /// Encoder position of drive ball `index`.
    pub async fn motor_angle(&self, index: u8) -> Reading<i64> {
        let request = self.request(ChannelKey::motor_ball(index), Command::ReadMotorAngle { index }, self.config().reading_window());
        self.correlator()
            .query(request, |record| record.as_motor_ball().map(|m| m.position))
            .await
    }

    pub async fn motor_speed(&self, index: u8) -> Reading<f64> {
        let request = self.request(ChannelKey::motor_ball(index), Command::ReadMotorSpeed { index }, self.config().reading_window());
        self.correlator()
            .query(request, |record| record.as_motor_ball().map(|m| m.speed))
            .await
    }

    pub async fn joint_angle(&self, group: JointGroup, index: u8) -> Reading<f64> {
        let command = Command::ReadJointAngle { group, index };
        let request = self.request(ChannelKey::joint_angle(group, index), command, self.config().reading_window());
        self.correlator()
            .query(request, |record| record.as_joint_angle().map(|j| j.angle))
            .await
    }

    /// Closed-loop move of one joint using the configured tolerance and deadline.
    pub async fn set_joint_angle(&self, group: JointGroup, index: u8, angle: f64) -> MoveReport {
        self.controller().move_to_angle(self.move_request(group, index, angle)).await
    }

    /// Moves a joint group (primary plus mutation list). `Wait` converges every
    /// member and returns the batch report; `Detach` only sends the set-angle
    /// commands and returns `None`.
    pub async fn set_joint_angles(&self, group: JointGroup, targets: &[(u8, f64)], wait: WaitMode) -> Option<BatchReport> {
        match wait {
            WaitMode::Detach => {
                for &(index, angle) in targets {
                    self.send(Command::SetJointAngle { group, index, angle });
                }
                None
            }
            WaitMode::Wait => {
                let requests = targets
                    .iter()
                    .map(|&(index, angle)| self.move_request(group, index, angle))
                    .collect();
                Some(self.controller().move_batch(requests).await)
            }
        }
    }

    fn move_request(&self, group: JointGroup, index: u8, angle: f64) -> MoveRequest {
        let config = self.config();
        let request = MoveRequest::new(
            group,
            index,
            angle,
            config.joint_tolerance_deg,
            config.joint_window(),
            config.snapshot_timeout(),
        );
        match self.cancel_token() {
            Some(token) => request.with_cancel(token),
            None => request,
        }
    }
}
