use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use bellbridge::bridge::sensing::{PressState, COLOR_MODE_COLOR};
use bellbridge::kernel::channel::JointGroup;
use bellbridge::kernel::telemetry::event::GyroAxis;
use bellbridge::{Bridge, BridgeConfig};

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

/// Stdio transport: JSON telemetry frames in on stdin, JSON commands out on stdout.
/// Lines that are not JSON are console requests:
///   touch <i> | color <i> | ir <i> | gyro <x|y|z> | joint <swing|horizontal> <i> <deg> | stop
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout is the command stream
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match std::env::var("BELLBRIDGE_CONFIG") {
        Ok(path) => BridgeConfig::load(path)?,
        Err(_) => BridgeConfig::default(),
    };
    let (bridge, mut commands) = Bridge::new(config);

    // Outbound: one JSON object per line
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(command) = commands.recv().await {
            match serde_json::to_string(&command) {
                Ok(line) => {
                    if let Err(e) = write_line(&mut stdout, &line).await {
                        tracing::warn!("Command stream closed: {}", e);
                        break;
                    }
                }
                Err(e) => tracing::warn!("Failed to encode command: {}", e),
            }
        }
    });

    let reader = BufReader::new(tokio::io::stdin());
    let mut lines = reader.lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('{') {
            if let Err(e) = bridge.store().ingest_json(&line) {
                tracing::debug!("Frame ignored: {}", e);
            }
            continue;
        }

        // Requests run on their own task so telemetry keeps flowing while they wait
        let console = bridge.for_script("console");
        let words: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        tokio::spawn(async move {
            let index = |i: usize| words.get(i).and_then(|w| w.parse::<u8>().ok()).unwrap_or(0);
            match words.first().map(String::as_str) {
                Some("touch") => eprintln!("touch: {:?}", console.touch_state(index(1), PressState::Pressed).await),
                Some("color") => eprintln!("color: {:?}", console.color_value(index(1), COLOR_MODE_COLOR).await),
                Some("ir") => eprintln!("ir: {:?}", console.infrared_distance(index(1)).await),
                Some("gyro") => {
                    let axis = match words.get(1).map(String::as_str) {
                        Some("x") => GyroAxis::X,
                        Some("y") => GyroAxis::Y,
                        _ => GyroAxis::Z,
                    };
                    eprintln!("gyro: {:?}", console.gyro_value(axis).await);
                }
                Some("joint") => {
                    let group = match words.get(1).map(String::as_str) {
                        Some("horizontal") => JointGroup::Horizontal,
                        _ => JointGroup::Swing,
                    };
                    let angle = words.get(3).and_then(|w| w.parse::<f64>().ok()).unwrap_or(0.0);
                    let report = console.set_joint_angle(group, index(2), angle).await;
                    eprintln!("joint: {:?}", report);
                }
                Some("stop") => {
                    console.stop_all();
                    eprintln!("stopped");
                }
                _ => eprintln!("unknown request: {}", words.join(" ")),
            }
        });
    }

    tracing::info!("stdin closed, shutting down");
    bridge.stop_all();
    drop(bridge);
    writer.abort();
    Ok(())
}
