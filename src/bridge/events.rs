use super::sensing::{PressState, COLOR_MODE_COLOR};
use super::Bridge;
use crate::kernel::command::{Command, Threshold};
use crate::kernel::telemetry::event::GyroAxis;

// Hat blocks arm a condition on the device and return. Whatever the device
// reports back arrives through ordinary telemetry ingest.
impl Bridge {
    pub fn arm_touch_event(&self, index: u8, state: PressState) {
        self.send(Command::ArmTouchEvent {
            index,
            pressed: state == PressState::Pressed,
        });
    }

    pub fn arm_infrared_event(&self, index: u8, distance: f64, test: Threshold) {
        self.send(Command::ArmInfraredEvent { index, test, distance });
    }

    pub fn arm_gyro_event(&self, axis: GyroAxis, angle: f64, test: Threshold) {
        self.send(Command::ArmGyroEvent { axis, test, angle });
    }

    /// Colour events always watch in colour mode.
    pub fn arm_color_event(&self, index: u8) {
        self.send(Command::ArmColorEvent { index, mode: COLOR_MODE_COLOR });
    }
}
