use std::time::Duration;
use tokio::time::{sleep, Instant};

use bellbridge::bridge::sensing::{Equality, PressState, Threshold, COLOR_MODE_COLOR};
use bellbridge::device::{SimConfig, SimulatedDevice};
use bellbridge::kernel::channel::JointGroup;
use bellbridge::kernel::command::{BuzzerTone, Command, LightTarget, RotateDirection, BUZZER_OFF_CODE};
use bellbridge::kernel::convergence::MoveOutcome;
use bellbridge::kernel::power::{DriveMode, MotorBatch, MotorDrive};
use bellbridge::kernel::telemetry::event::GyroAxis;
use bellbridge::{Bridge, BridgeConfig, Reading, WaitMode};

fn online(config: SimConfig) -> (Bridge, SimulatedDevice) {
    let (bridge, commands) = Bridge::new(BridgeConfig::default());
    let device = SimulatedDevice::new(bridge.store().clone(), config);
    device.spawn(commands);
    (bridge, device)
}

fn drive(index: u8, level: f64, seconds: Option<f64>) -> MotorDrive {
    MotorDrive { index, direction: RotateDirection::Forward, level, seconds }
}

#[tokio::test(start_paused = true)]
async fn test_touch_state_per_index() {
    let (bridge, device) = online(SimConfig::default());
    device.set_touch(2, true);

    assert_eq!(bridge.touch_state(2, PressState::Pressed).await, Reading::Value(true));
    assert_eq!(bridge.touch_state(1, PressState::Pressed).await, Reading::Value(false));
    assert_eq!(bridge.touch_state(1, PressState::Released).await, Reading::Value(true));
    assert_eq!(bridge.touch_pressed(2).await, Reading::Value(true));
}

#[tokio::test(start_paused = true)]
async fn test_silent_device_yields_no_data_after_timeout() {
    let (bridge, device) = online(SimConfig::default());
    device.set_muted(true);

    let started = Instant::now();
    let reading = bridge.touch_state(1, PressState::Pressed).await;
    assert!(reading.is_no_data());
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert!(started.elapsed() <= Duration::from_millis(510));

    // Value reads use the longer window
    let started = Instant::now();
    assert!(bridge.infrared_distance(1).await.is_no_data());
    assert!(started.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_latency_is_absorbed_by_polling() {
    let (bridge, device) = online(SimConfig { latency: Duration::from_millis(45), ..SimConfig::default() });
    device.set_infrared(1, 18.5);

    let started = Instant::now();
    assert_eq!(bridge.infrared_distance(1).await, Reading::Value(18.5));
    assert_eq!(started.elapsed(), Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_color_sensing() {
    let (bridge, device) = online(SimConfig::default());
    device.set_color(1, vec![5, 0, 0]);

    assert_eq!(bridge.color_compare(1, 5, Equality::Equals).await, Reading::Value(true));
    assert_eq!(bridge.color_compare(1, 5, Equality::NotEquals).await, Reading::Value(false));
    assert_eq!(bridge.color_value(1, COLOR_MODE_COLOR).await, Reading::Value(5));

    // Empty frame reads as zero
    device.set_color(2, Vec::new());
    assert_eq!(bridge.color_value(2, COLOR_MODE_COLOR).await, Reading::Value(0));
}

#[tokio::test(start_paused = true)]
async fn test_infrared_and_gyro_thresholds() {
    let (bridge, device) = online(SimConfig::default());
    device.set_infrared(1, 42.0);
    device.set_gyro(15.0, 370.0, 0.0);

    assert_eq!(bridge.infrared_compare(1, 30.0, Threshold::AtLeast).await, Reading::Value(true));
    assert_eq!(bridge.infrared_compare(1, 30.0, Threshold::Below).await, Reading::Value(false));
    assert_eq!(bridge.gyro_value(GyroAxis::Y).await, Reading::Value(10.0));
    assert_eq!(bridge.gyro_compare(GyroAxis::X, 20.0, Threshold::Below).await, Reading::Value(true));

    bridge.reset_gyro();
    assert_eq!(bridge.gyro_value(GyroAxis::X).await, Reading::Value(0.0));
}

#[tokio::test(start_paused = true)]
async fn test_rotate_sends_calibrated_batch_and_waits() {
    let (bridge, device) = online(SimConfig::default());
    let batch = MotorBatch::new(DriveMode::Power, drive(1, 50.0, Some(1.0)))
        .with_mutation(drive(2, 100.0, Some(2.5)))
        .with_mutation(drive(3, 0.0, None));

    let started = Instant::now();
    let waited = bridge.rotate(&batch, WaitMode::Wait).await;
    assert_eq!(waited, Duration::from_millis(2500));
    assert_eq!(started.elapsed(), Duration::from_millis(2500));

    let powers: Vec<u8> = device
        .received()
        .into_iter()
        .filter_map(|c| match c {
            Command::RotateOnPower { power, .. } => Some(power),
            _ => None,
        })
        .collect();
    assert_eq!(powers, vec![67, 100, 35]);
}

#[tokio::test(start_paused = true)]
async fn test_detached_rotate_returns_immediately() {
    let (bridge, _device) = online(SimConfig::default());
    let batch = MotorBatch::new(DriveMode::Speed, drive(1, 80.0, Some(3.0)));

    let started = Instant::now();
    assert_eq!(bridge.rotate(&batch, WaitMode::Detach).await, Duration::ZERO);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_motor_readings() {
    let (bridge, device) = online(SimConfig::default());
    device.set_motor_position(2, 540);

    assert_eq!(bridge.motor_angle(2).await, Reading::Value(540));

    bridge.reset_motors(&[2]);
    assert_eq!(bridge.motor_angle(2).await, Reading::Value(0));

    let batch = MotorBatch::new(DriveMode::Speed, drive(2, 100.0, None));
    bridge.rotate(&batch, WaitMode::Detach).await;
    assert_eq!(bridge.motor_speed(2).await, Reading::Value(100.0));

    bridge.stop_motors(&[2], true);
    assert_eq!(bridge.motor_speed(2).await, Reading::Value(0.0));
}

#[tokio::test(start_paused = true)]
async fn test_joint_moves() {
    let (bridge, device) = online(SimConfig { joint_speed_deg_per_s: 0.0, ..SimConfig::default() });

    let report = bridge.set_joint_angle(JointGroup::Horizontal, 1, 35.0).await;
    assert_eq!(report.outcome, MoveOutcome::Converged);
    assert_eq!(bridge.joint_angle(JointGroup::Horizontal, 1).await, Reading::Value(35.0));

    let batch = bridge
        .set_joint_angles(JointGroup::Swing, &[(0, 20.0), (2, -20.0)], WaitMode::Wait)
        .await;
    assert!(batch.map(|b| b.all_converged()).unwrap_or(false));

    device.set_muted(true);
    let before = device.received().len();
    let detached = bridge
        .set_joint_angles(JointGroup::Swing, &[(1, 10.0), (3, 10.0)], WaitMode::Detach)
        .await;
    assert!(detached.is_none());
    sleep(Duration::from_millis(1)).await;
    let sent: Vec<Command> = device.received().split_off(before);
    assert_eq!(
        sent,
        vec![
            Command::SetJointAngle { group: JointGroup::Swing, index: 1, angle: 10.0 },
            Command::SetJointAngle { group: JointGroup::Swing, index: 3, angle: 10.0 },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_buzzer_hold_closes_after_wait() {
    let (bridge, device) = online(SimConfig::default());

    let started = Instant::now();
    bridge
        .play_buzzer(BuzzerTone::High, 3, Some(Duration::from_millis(300)), WaitMode::Wait)
        .await;
    assert_eq!(started.elapsed(), Duration::from_millis(300));

    sleep(Duration::from_millis(1)).await;
    assert_eq!(
        device.received(),
        vec![Command::PlayBuzzer { level: 27 }, Command::CloseBuzzer { code: BUZZER_OFF_CODE }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_detached_lights_close_later() {
    let (bridge, device) = online(SimConfig::default());
    let target = LightTarget { main: true, motors: vec![1, 2] };

    let started = Instant::now();
    bridge
        .set_lights(target.clone(), 4, 1, Some(Duration::from_millis(200)), WaitMode::Detach)
        .await;
    assert_eq!(started.elapsed(), Duration::ZERO);

    sleep(Duration::from_millis(50)).await;
    assert_eq!(device.received(), vec![Command::SetLights { target: target.clone(), color: 4, mode: 1 }]);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(device.received().last(), Some(&Command::CloseLights { target }));
}

#[tokio::test(start_paused = true)]
async fn test_stop_script_cancels_pending_reads() {
    let (bridge, device) = online(SimConfig::default());
    device.set_muted(true);
    let script = bridge.for_script("blocks-1");
    let other = bridge.for_script("blocks-2");

    let started = Instant::now();
    let (stopped, untouched, _) = tokio::join!(
        script.touch_state(1, PressState::Pressed),
        other.touch_state(1, PressState::Pressed),
        async {
            sleep(Duration::from_millis(50)).await;
            assert!(bridge.stop_script("blocks-1"));
        }
    );

    assert!(stopped.is_no_data());
    assert!(untouched.is_no_data());
    assert!(started.elapsed() >= Duration::from_millis(500), "Other scripts run to their own timeout");

    let snap = bridge.recorder().snapshot();
    assert_eq!(snap.query_stats.canceled, 1);
    assert_eq!(snap.query_stats.no_data, 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_all_cancels_moves_and_holds() {
    let (bridge, device) = online(SimConfig::default());
    device.set_muted(true);
    let script = bridge.for_script("blocks-1");
    let batch = MotorBatch::new(DriveMode::Power, drive(1, 50.0, Some(5.0)));

    let (report, waited, _) = tokio::join!(
        script.set_joint_angle(JointGroup::Swing, 0, 90.0),
        script.rotate(&batch, WaitMode::Wait),
        async {
            sleep(Duration::from_millis(80)).await;
            bridge.stop_all();
        }
    );

    assert_eq!(report.outcome, MoveOutcome::Canceled);
    assert_eq!(report.elapsed, Duration::from_millis(80));
    assert_eq!(waited, Duration::from_millis(80));
}

#[tokio::test(start_paused = true)]
async fn test_oversized_hold_is_capped_and_stoppable() {
    let (bridge, _device) = online(SimConfig::default());
    let script = bridge.for_script("long-run");
    let batch = MotorBatch::new(DriveMode::Power, drive(1, 50.0, Some(1e30)));

    let (waited, _) = tokio::join!(script.rotate(&batch, WaitMode::Wait), async {
        sleep(Duration::from_millis(10)).await;
        bridge.stop_script("long-run");
    });
    assert_eq!(waited, Duration::from_millis(10));

    assert_eq!(bridge.rotate(&batch, WaitMode::Detach).await, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_event_arming_commands() {
    let (bridge, device) = online(SimConfig::default());

    bridge.arm_touch_event(2, PressState::Pressed);
    bridge.arm_infrared_event(1, 25.0, Threshold::Below);
    bridge.arm_gyro_event(GyroAxis::Z, 90.0, Threshold::AtLeast);
    bridge.arm_color_event(3);
    sleep(Duration::from_millis(1)).await;

    assert_eq!(
        device.received(),
        vec![
            Command::ArmTouchEvent { index: 2, pressed: true },
            Command::ArmInfraredEvent { index: 1, test: Threshold::Below, distance: 25.0 },
            Command::ArmGyroEvent { axis: GyroAxis::Z, test: Threshold::AtLeast, angle: 90.0 },
            Command::ArmColorEvent { index: 3, mode: COLOR_MODE_COLOR },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_voice_commands() {
    let (bridge, device) = online(SimConfig::default());

    bridge.voice_recognize(3.0);
    bridge.voice_recognize(-1.0);
    bridge.voice_synthesis("hello bell");
    sleep(Duration::from_millis(1)).await;

    assert_eq!(
        device.received(),
        vec![
            Command::VoiceRecognize { seconds: 3.0 },
            Command::VoiceRecognize { seconds: 0.0 },
            Command::VoiceSynthesis { content: "hello bell".to_string() },
        ]
    );
}

#[test]
fn test_arming_command_wire_format() {
    let command = Command::ArmTouchEvent { index: 1, pressed: false };
    let json = serde_json::to_value(&command).expect("encode");
    assert_eq!(json["type"], "arm_touch_event");
    assert_eq!(json["pressed"], false);
}

#[tokio::test(start_paused = true)]
async fn test_finished_script_releases_registry_entry() {
    let (bridge, device) = online(SimConfig::default());
    device.set_touch(1, true);

    let script = bridge.for_script("short");
    assert_eq!(script.touch_pressed(1).await, Reading::Value(true));
    assert!(bridge.finish_script("short"));
    assert!(!bridge.stop_script("short"), "Nothing left to stop");
}
