use std::time::Duration;

use super::{Bridge, WaitMode};
use crate::kernel::command::{BuzzerTone, Command, LightTarget, BUZZER_OFF_CODE};

impl Bridge {
    /// Lights on. With a `hold`, the lights are closed again once it elapses.
    pub async fn set_lights(&self, target: LightTarget, color: u8, mode: u8, hold: Option<Duration>, wait: WaitMode) {
        self.send(Command::SetLights { target: target.clone(), color, mode });
        if let Some(hold) = hold {
            self.release_after(hold, wait, Command::CloseLights { target }).await;
        }
    }

    pub fn close_lights(&self, target: LightTarget) {
        self.send(Command::CloseLights { target });
    }

    pub async fn play_buzzer(&self, tone: BuzzerTone, step: u8, hold: Option<Duration>, wait: WaitMode) {
        self.send(Command::PlayBuzzer { level: tone.level(step) });
        if let Some(hold) = hold {
            self.release_after(hold, wait, Command::CloseBuzzer { code: BUZZER_OFF_CODE }).await;
        }
    }

    pub fn close_buzzer(&self) {
        self.send(Command::CloseBuzzer { code: BUZZER_OFF_CODE });
    }

    /// Asks the controller to record speech for `seconds`. Negative and
    /// non-finite lengths become zero.
    pub fn voice_recognize(&self, seconds: f64) {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self.send(Command::VoiceRecognize { seconds });
    }

    pub fn voice_synthesis(&self, content: impl Into<String>) {
        self.send(Command::VoiceSynthesis { content: content.into() });
    }
}
