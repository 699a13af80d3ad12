use std::collections::{HashMap, VecDeque};
use super::event::LinkEvent;
use crate::kernel::channel::ChannelKind;
use crate::kernel::convergence::MoveOutcome;

#[derive(Debug, Clone, Default)]
pub struct LinkSnapshot {
    pub ingest_stats: IngestStats,
    pub command_stats: CommandStats,
    pub query_stats: QueryStats,
    pub move_stats: MoveStats,
}

#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    pub total: u64,
    pub per_kind: HashMap<ChannelKind, u64>,
    pub dropped: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CommandStats {
    pub sent: u64,
    pub dropped: u64,
}

#[derive(Debug, Clone, Default)]
pub struct QueryStats {
    pub resolved: u64,
    pub no_data: u64,
    pub canceled: u64,
    pub total_latency_ms: u64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MoveStats {
    pub converged: u64,
    pub timed_out: u64,
    pub canceled: u64,
    pub max_elapsed_ms: u64,
}

pub fn compute_snapshot(events: &VecDeque<LinkEvent>) -> LinkSnapshot {
    let mut snap = LinkSnapshot::default();

    for event in events {
        match event {
            LinkEvent::Ingested { kind } => {
                snap.ingest_stats.total += 1;
                *snap.ingest_stats.per_kind.entry(*kind).or_insert(0) += 1;
            }
            LinkEvent::FrameDropped => snap.ingest_stats.dropped += 1,
            LinkEvent::CommandSent { .. } => snap.command_stats.sent += 1,
            LinkEvent::CommandDropped { .. } => snap.command_stats.dropped += 1,
            LinkEvent::QueryResolved { latency_ms, .. } => {
                snap.query_stats.resolved += 1;
                snap.query_stats.total_latency_ms += latency_ms;
                if *latency_ms > snap.query_stats.max_latency_ms {
                    snap.query_stats.max_latency_ms = *latency_ms;
                }
            }
            LinkEvent::QueryNoData { .. } => snap.query_stats.no_data += 1,
            LinkEvent::QueryCanceled { .. } => snap.query_stats.canceled += 1,
            LinkEvent::MoveFinished { outcome, elapsed_ms, .. } => {
                match outcome {
                    MoveOutcome::Converged => snap.move_stats.converged += 1,
                    MoveOutcome::TimedOut => snap.move_stats.timed_out += 1,
                    MoveOutcome::Canceled => snap.move_stats.canceled += 1,
                }
                snap.move_stats.max_elapsed_ms = snap.move_stats.max_elapsed_ms.max(*elapsed_ms);
            }
        }
    }

    if snap.query_stats.resolved > 0 {
        snap.query_stats.avg_latency_ms =
            snap.query_stats.total_latency_ms as f64 / snap.query_stats.resolved as f64;
    }

    snap
}
