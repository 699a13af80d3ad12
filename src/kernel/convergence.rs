use std::collections::HashMap;
use std::future::{poll_fn, Future};
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::kernel::channel::{ChannelKey, JointGroup};
use crate::kernel::command::Command;
use crate::kernel::query::{QueryCorrelator, QueryRequest, Reading};
use crate::kernel::stats::event::LinkEvent;
use crate::kernel::stats::recorder::LinkRecorder;
use crate::kernel::time::{deadline_after, PollWindow};

/// How a move ended. Every variant means "done"; a move never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOutcome {
    /// Measured angle entered the tolerance band.
    Converged,
    /// Deadline passed first.
    TimedOut,
    /// The owning script was stopped.
    Canceled,
}

#[derive(Debug, Clone)]
pub struct MoveRequest {
    pub group: JointGroup,
    pub joint: u8,
    pub target: f64,
    pub tolerance: f64,
    /// `interval` is the snapshot poll cadence, `limit` the overall deadline.
    pub window: PollWindow,
    /// Bound on each individual snapshot query.
    pub snapshot_timeout: Duration,
    pub cancel: Option<CancellationToken>,
}

impl MoveRequest {
    pub fn new(group: JointGroup, joint: u8, target: f64, tolerance: f64, window: PollWindow, snapshot_timeout: Duration) -> Self {
        Self {
            group,
            joint,
            target,
            tolerance,
            window,
            snapshot_timeout,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn within_tolerance(&self, angle: f64) -> bool {
        (angle - self.target).abs() <= self.tolerance
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveReport {
    pub joint: u8,
    pub outcome: MoveOutcome,
    pub elapsed: Duration,
    /// Last angle observed for the joint, if any snapshot arrived.
    pub last_angle: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub moves: Vec<MoveReport>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn all_converged(&self) -> bool {
        self.moves.iter().all(|m| m.outcome == MoveOutcome::Converged)
    }

    /// Completion time of the slowest member.
    pub fn slowest(&self) -> Duration {
        self.moves.iter().map(|m| m.elapsed).max().unwrap_or_default()
    }
}

/// Closed-loop "move and wait" on hardware that never reports motion complete.
///
/// Joints of one group share a single `AllAngles` snapshot key, so every move
/// on a group is driven by one loop: one snapshot request per round, consumed
/// once, checked against every joint still in motion.
#[derive(Debug, Clone)]
pub struct ConvergenceController {
    correlator: QueryCorrelator,
    recorder: Option<Arc<LinkRecorder>>,
}

/// Progress of one joint inside a group loop.
#[derive(Debug)]
struct JointTrack {
    request: MoveRequest,
    deadline: Instant,
    last_angle: Option<f64>,
    finished: Option<(MoveOutcome, Duration)>,
}

impl JointTrack {
    fn new(request: MoveRequest, started: Instant) -> Self {
        let deadline = deadline_after(started, request.window.limit);
        Self {
            request,
            deadline,
            last_angle: None,
            finished: None,
        }
    }

    fn is_moving(&self) -> bool {
        self.finished.is_none()
    }

    fn is_canceled(&self) -> bool {
        self.request.cancel.as_ref().map(|t| t.is_cancelled()).unwrap_or(false)
    }

    fn finish(&mut self, outcome: MoveOutcome, started: Instant) {
        self.finished = Some((outcome, started.elapsed()));
    }
}

/// Resolves once any of `tokens` is canceled; never when the list is empty.
async fn any_cancelled(tokens: &[CancellationToken]) {
    let mut waits: Vec<_> = tokens.iter().map(|t| Box::pin(t.cancelled())).collect();
    poll_fn(|cx| {
        if waits.iter_mut().any(|w| w.as_mut().poll(cx).is_ready()) {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    })
    .await
}

impl ConvergenceController {
    pub fn new(correlator: QueryCorrelator) -> Self {
        Self {
            correlator,
            recorder: None,
        }
    }

    pub fn with_recorder(mut self, recorder: Arc<LinkRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn correlator(&self) -> &QueryCorrelator {
        &self.correlator
    }

    /// Sends the set-angle command once, then re-queries the group snapshot
    /// until the joint is within tolerance or the deadline passes.
    pub async fn move_to_angle(&self, request: MoveRequest) -> MoveReport {
        let span = info_span!("move", id = %Uuid::new_v4(), group = ?request.group, joint = request.joint);
        let group = request.group;

        async move {
            let started = Instant::now();
            let mut tracks = [JointTrack::new(request, started)];
            self.converge(group, &mut tracks, started).await;
            let [track] = tracks;
            self.report(group, track, started)
        }
        .instrument(span)
        .await
    }

    /// Moves every joint in `requests`. Joints sharing a group share one
    /// snapshot loop; separate groups run concurrently. The batch completes
    /// with its slowest member. Reports come back in request order.
    pub async fn move_batch(&self, requests: Vec<MoveRequest>) -> BatchReport {
        let started = Instant::now();

        let mut by_group: HashMap<JointGroup, Vec<(usize, MoveRequest)>> = HashMap::new();
        for (slot, request) in requests.into_iter().enumerate() {
            by_group.entry(request.group).or_default().push((slot, request));
        }

        let mut set = JoinSet::new();
        for (group, members) in by_group {
            let controller = self.clone();
            let span = info_span!("move_batch", id = %Uuid::new_v4(), ?group, members = members.len());
            set.spawn(
                async move {
                    let (slots, requests): (Vec<usize>, Vec<MoveRequest>) = members.into_iter().unzip();
                    let mut tracks: Vec<JointTrack> =
                        requests.into_iter().map(|r| JointTrack::new(r, started)).collect();
                    controller.converge(group, &mut tracks, started).await;
                    slots
                        .into_iter()
                        .zip(tracks)
                        .map(|(slot, track)| (slot, controller.report(group, track, started)))
                        .collect::<Vec<_>>()
                }
                .instrument(span),
            );
        }

        let mut moves = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(group_moves) => moves.extend(group_moves),
                Err(e) => warn!("Joint group task failed: {}", e),
            }
        }
        moves.sort_by_key(|(slot, _)| *slot);

        BatchReport {
            moves: moves.into_iter().map(|(_, report)| report).collect(),
            elapsed: started.elapsed(),
        }
    }

    /// Group loop. Returns once every track has an outcome.
    async fn converge(&self, group: JointGroup, tracks: &mut [JointTrack], started: Instant) {
        for track in tracks.iter() {
            self.correlator.dispatcher().send(Command::SetJointAngle {
                group,
                index: track.request.joint,
                angle: track.request.target,
            });
        }

        let key = ChannelKey::all_angles(group);
        loop {
            let now = Instant::now();
            for track in tracks.iter_mut().filter(|t| t.is_moving()) {
                if track.is_canceled() {
                    track.finish(MoveOutcome::Canceled, started);
                } else if now >= track.deadline {
                    track.finish(MoveOutcome::TimedOut, started);
                }
            }

            let moving: Vec<&JointTrack> = tracks.iter().filter(|t| t.is_moving()).collect();
            let Some(nearest) = moving.iter().map(|t| t.deadline).min() else {
                break;
            };
            let interval = moving.iter().map(|t| t.request.window.interval).min().unwrap_or_default();
            let snapshot_timeout = moving.iter().map(|t| t.request.snapshot_timeout).max().unwrap_or_default();
            let tokens: Vec<CancellationToken> = moving.iter().filter_map(|t| t.request.cancel.clone()).collect();

            // Bounded by the nearest member deadline so timeouts are reported on time
            let window = PollWindow::new(interval, snapshot_timeout).capped(nearest - now);
            let query = QueryRequest::new(key, Command::ReadAllAngles { group }, window);
            let reading = tokio::select! {
                biased;
                _ = any_cancelled(&tokens) => Reading::NoData,
                reading = self.correlator.query(query, |record| record.as_all_angles().map(|s| s.angles.clone())) => reading,
            };

            let Reading::Value(angles) = reading else {
                continue;
            };
            for track in tracks.iter_mut().filter(|t| t.is_moving()) {
                let joint = track.request.joint;
                match angles.get(joint as usize).copied() {
                    Some(angle) => {
                        track.last_angle = Some(angle);
                        if track.request.within_tolerance(angle) {
                            track.finish(MoveOutcome::Converged, started);
                        } else {
                            debug!(joint, angle, target = track.request.target, "Joint not settled yet");
                        }
                    }
                    None => debug!(joint, "Snapshot has no slot for this joint"),
                }
            }
        }
    }

    fn report(&self, group: JointGroup, track: JointTrack, started: Instant) -> MoveReport {
        let joint = track.request.joint;
        let (outcome, elapsed) = track
            .finished
            .unwrap_or_else(|| (MoveOutcome::TimedOut, started.elapsed()));

        info!(joint, ?outcome, elapsed_ms = elapsed.as_millis() as u64, "Joint move finished");
        if let Some(recorder) = &self.recorder {
            recorder.record(LinkEvent::MoveFinished {
                group,
                joint,
                outcome,
                elapsed_ms: elapsed.as_millis() as u64,
            });
        }

        MoveReport {
            joint,
            outcome,
            elapsed,
            last_angle: track.last_angle,
        }
    }
}
