use std::time::Duration;
use bellbridge::bridge::sensing::{PressState, Threshold};
use bellbridge::device::{SimConfig, SimulatedDevice};
use bellbridge::kernel::channel::JointGroup;
use bellbridge::kernel::command::RotateDirection;
use bellbridge::kernel::power::{DriveMode, MotorBatch, MotorDrive};
use bellbridge::kernel::telemetry::event::GyroAxis;
use bellbridge::{Bridge, BridgeConfig, WaitMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging/tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    tracing::info!("Bell bridge demo booting...");

    // Optional JSON config as first argument
    let config = match std::env::args().nth(1) {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };

    let (bridge, commands) = Bridge::new(config);

    // Simulated robot: 15ms link latency, loses every 5th reply
    let device = SimulatedDevice::new(
        bridge.store().clone(),
        SimConfig {
            latency: Duration::from_millis(15),
            drop_every: Some(5),
            ..SimConfig::default()
        },
    );
    device.set_touch(1, true);
    device.set_infrared(1, 42.0);
    device.set_gyro(10.0, 370.0, -5.0);
    let link = device.spawn(commands);

    let script = bridge.for_script("demo");

    let touched = script.touch_state(1, PressState::Pressed).await;
    tracing::info!("Touch 1 pressed: {:?}", touched);

    let near = script.infrared_compare(1, 30.0, Threshold::AtLeast).await;
    tracing::info!("Infrared 1 >= 30cm: {:?}", near);

    let yaw = script.gyro_value(GyroAxis::Y).await;
    tracing::info!("Gyro Y: {:?}", yaw);

    let batch = MotorBatch::new(
        DriveMode::Power,
        MotorDrive { index: 1, direction: RotateDirection::Forward, level: 50.0, seconds: Some(0.5) },
    )
    .with_mutation(MotorDrive { index: 2, direction: RotateDirection::Backward, level: 80.0, seconds: Some(1.0) });
    let waited = script.rotate(&batch, WaitMode::Wait).await;
    tracing::info!("Drive batch held for {:?}", waited);

    if let Some(report) = script
        .set_joint_angles(JointGroup::Swing, &[(0, 45.0), (1, -30.0)], WaitMode::Wait)
        .await
    {
        for mv in &report.moves {
            tracing::info!("Joint {} -> {:?} after {:?} (last {:?})", mv.joint, mv.outcome, mv.elapsed, mv.last_angle);
        }
        tracing::info!("Swing batch settled in {:?}", report.slowest());
    }

    let snap = bridge.recorder().snapshot();
    tracing::info!(
        "Link stats: {} ingested, {} commands, {} queries resolved, {} no-data, avg latency {:.1}ms",
        snap.ingest_stats.total,
        snap.command_stats.sent,
        snap.query_stats.resolved,
        snap.query_stats.no_data,
        snap.query_stats.avg_latency_ms
    );

    // Closing the bridge's outbound queue takes the device task down with it
    drop(script);
    drop(bridge);
    link.await?;
    Ok(())
}
