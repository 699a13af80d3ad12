use serde::{Deserialize, Serialize};

use super::Bridge;
use crate::kernel::channel::ChannelKey;
pub use crate::kernel::command::Threshold;
use crate::kernel::command::Command;
use crate::kernel::query::Reading;
use crate::kernel::telemetry::event::GyroAxis;

// Colour sensor modes.
pub const COLOR_MODE_AMBIENT: u8 = 1;
pub const COLOR_MODE_REFLECT: u8 = 2;
pub const COLOR_MODE_COLOR: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressState {
    Pressed,
    Released,
}

impl From<bool> for PressState {
    fn from(pressed: bool) -> Self {
        if pressed {
            PressState::Pressed
        } else {
            PressState::Released
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equality {
    Equals,
    NotEquals,
}

impl Bridge {
    /// Whether touch ball `index` is in the `expected` state.
    pub async fn touch_state(&self, index: u8, expected: PressState) -> Reading<bool> {
        let request = self.request(ChannelKey::touch(index), Command::ReadTouch { index }, self.config().compare_window());
        self.correlator()
            .query(request, |record| record.as_touch().map(|t| PressState::from(t.pressed) == expected))
            .await
    }

    pub async fn touch_pressed(&self, index: u8) -> Reading<bool> {
        let request = self.request(ChannelKey::touch(index), Command::ReadTouch { index }, self.config().compare_window());
        self.correlator()
            .query(request, |record| record.as_touch().map(|t| t.pressed))
            .await
    }

    pub async fn color_compare(&self, index: u8, color: i32, equality: Equality) -> Reading<bool> {
        let command = Command::ReadColor { index, mode: COLOR_MODE_COLOR };
        let request = self.request(ChannelKey::color(index), command, self.config().compare_window());
        self.correlator()
            .query(request, |record| {
                record.as_color().map(|c| {
                    let equal = c.primary() == Some(color);
                    match equality {
                        Equality::Equals => equal,
                        Equality::NotEquals => !equal,
                    }
                })
            })
            .await
    }

    /// First data slot of colour sensor `index` in the given mode; 0 when the frame is empty.
    pub async fn color_value(&self, index: u8, mode: u8) -> Reading<i32> {
        let command = Command::ReadColor { index, mode };
        let request = self.request(ChannelKey::color(index), command, self.config().reading_window());
        self.correlator()
            .query(request, |record| record.as_color().map(|c| c.primary().unwrap_or(0)))
            .await
    }

    pub async fn infrared_compare(&self, index: u8, threshold: f64, test: Threshold) -> Reading<bool> {
        let request = self.request(ChannelKey::infrared(index), Command::ReadInfrared { index }, self.config().compare_window());
        self.correlator()
            .query(request, |record| record.as_infrared().map(|ir| test.holds(ir.distance, threshold)))
            .await
    }

    pub async fn infrared_distance(&self, index: u8) -> Reading<f64> {
        let request = self.request(ChannelKey::infrared(index), Command::ReadInfrared { index }, self.config().reading_window());
        self.correlator()
            .query(request, |record| record.as_infrared().map(|ir| ir.distance))
            .await
    }

    pub async fn gyro_compare(&self, axis: GyroAxis, angle: f64, test: Threshold) -> Reading<bool> {
        let request = self.request(ChannelKey::gyro(), Command::ReadGyro, self.config().compare_window());
        self.correlator()
            .query(request, |record| record.as_gyro().map(|g| test.holds(g.axis(axis), angle)))
            .await
    }

    /// Axis angle folded into one turn. Gyro replies are slow; uses the gyro window.
    pub async fn gyro_value(&self, axis: GyroAxis) -> Reading<f64> {
        let request = self.request(ChannelKey::gyro(), Command::ReadGyro, self.config().gyro_window());
        self.correlator()
            .query(request, |record| record.as_gyro().map(|g| g.axis(axis)))
            .await
    }

    pub fn reset_gyro(&self) {
        self.send(Command::ResetGyro);
    }

    pub fn set_color_mode(&self, index: u8, mode: u8) {
        self.send(Command::SetColorMode { index, mode });
    }
}
