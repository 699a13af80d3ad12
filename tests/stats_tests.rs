use bellbridge::kernel::cancel::CancellationRegistry;
use bellbridge::kernel::channel::{ChannelKind, JointGroup};
use bellbridge::kernel::command::{Command, CommandDispatcher};
use bellbridge::kernel::convergence::MoveOutcome;
use bellbridge::kernel::stats::event::LinkEvent;
use bellbridge::kernel::stats::recorder::LinkRecorder;
use bellbridge::kernel::telemetry::{TelemetryStore, TelemetryUpdate};
use std::sync::Arc;

#[test]
fn test_snapshot_aggregates_events() {
    let recorder = LinkRecorder::new();
    recorder.record(LinkEvent::Ingested { kind: ChannelKind::Touch });
    recorder.record(LinkEvent::Ingested { kind: ChannelKind::Touch });
    recorder.record(LinkEvent::Ingested { kind: ChannelKind::Gyro });
    recorder.record(LinkEvent::QueryResolved { kind: ChannelKind::Touch, latency_ms: 10 });
    recorder.record(LinkEvent::QueryResolved { kind: ChannelKind::Touch, latency_ms: 30 });
    recorder.record(LinkEvent::QueryNoData { kind: ChannelKind::Gyro });
    recorder.record(LinkEvent::MoveFinished {
        group: JointGroup::Swing,
        joint: 0,
        outcome: MoveOutcome::TimedOut,
        elapsed_ms: 2000,
    });

    let snap = recorder.snapshot();
    assert_eq!(snap.ingest_stats.total, 3);
    assert_eq!(snap.ingest_stats.per_kind.get(&ChannelKind::Touch), Some(&2));
    assert_eq!(snap.query_stats.resolved, 2);
    assert_eq!(snap.query_stats.no_data, 1);
    assert_eq!(snap.query_stats.avg_latency_ms, 20.0);
    assert_eq!(snap.query_stats.max_latency_ms, 30);
    assert_eq!(snap.move_stats.timed_out, 1);
    assert_eq!(snap.move_stats.max_elapsed_ms, 2000);
}

#[test]
fn test_recorder_is_bounded() {
    let recorder = LinkRecorder::new();
    for _ in 0..10_050 {
        recorder.record(LinkEvent::FrameDropped);
    }
    assert_eq!(recorder.len(), 10_000);

    recorder.clear();
    assert!(recorder.is_empty());
}

#[test]
fn test_store_records_ingest_and_drops() {
    let recorder = Arc::new(LinkRecorder::new());
    let store = TelemetryStore::with_recorder(recorder.clone());

    store.ingest(TelemetryUpdate::Infrared { index: 1, distance: 4.0 });
    let _ = store.ingest_json("not json");
    store.ingest(TelemetryUpdate::Unknown);

    let snap = recorder.snapshot();
    assert_eq!(snap.ingest_stats.total, 1);
    assert_eq!(snap.ingest_stats.dropped, 2);
    assert_eq!(
        recorder.events().first(),
        Some(&LinkEvent::Ingested { kind: ChannelKind::Infrared })
    );
}

#[tokio::test]
async fn test_dispatcher_drops_when_queue_full() {
    let recorder = Arc::new(LinkRecorder::new());
    let (dispatcher, mut rx) = CommandDispatcher::channel(2);
    let dispatcher = dispatcher.with_recorder(recorder.clone());

    dispatcher.send_all(vec![Command::ReadGyro, Command::ResetGyro, Command::ReadGyro]);

    let snap = recorder.snapshot();
    assert_eq!(snap.command_stats.sent, 2);
    assert_eq!(snap.command_stats.dropped, 1);
    assert_eq!(rx.recv().await, Some(Command::ReadGyro));
    assert_eq!(rx.recv().await, Some(Command::ResetGyro));

    drop(rx);
    assert!(dispatcher.is_closed());
}

#[test]
fn test_cancellation_registry_scopes_by_script() {
    let registry = CancellationRegistry::new();
    let first = registry.token_for("a");
    let second = registry.token_for("a");
    let other = registry.token_for("b");
    assert_eq!(registry.active(), 2);

    assert!(registry.stop("a"));
    assert!(first.is_cancelled() && second.is_cancelled());
    assert!(!other.is_cancelled());
    assert!(!registry.stop("a"), "Stopped scripts are forgotten");

    let fresh = registry.token_for("a");
    assert!(!fresh.is_cancelled());

    registry.stop_all();
    assert!(fresh.is_cancelled() && other.is_cancelled());
    assert_eq!(registry.active(), 0);
}

#[test]
fn test_finished_script_is_forgotten_without_cancel() {
    let registry = CancellationRegistry::new();
    let token = registry.token_for("done");
    assert_eq!(registry.active(), 1);

    assert!(registry.finish("done"));
    assert_eq!(registry.active(), 0);
    assert!(!token.is_cancelled(), "Finishing must not cancel outstanding work");
    assert!(!registry.finish("done"));

    registry.stop_all();
    assert!(!token.is_cancelled());
}
