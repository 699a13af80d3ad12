//! Consumer-facing API for the block layer.
//!
//! Every operation returns a future that resolves to a value, `NoData`, or a
//! completion report. Nothing here returns an error: silence from the link is
//! a routine outcome.

pub mod events;
pub mod motion;
pub mod sensing;
pub mod sound;

use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::BridgeConfig;
use crate::kernel::cancel::CancellationRegistry;
use crate::kernel::channel::ChannelKey;
use crate::kernel::command::{Command, CommandDispatcher};
use crate::kernel::convergence::ConvergenceController;
use crate::kernel::query::{QueryCorrelator, QueryRequest};
use crate::kernel::stats::recorder::LinkRecorder;
use crate::kernel::telemetry::{TelemetryStore, TelemetryUpdate};
use crate::kernel::time::{PollWindow, MAX_WAIT};

/// Whether a timed operation holds its caller until it is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitMode {
    Wait,
    Detach,
}

/// Explicitly constructed bridge. Cheap to clone; clones share the same store,
/// outbound queue and statistics.
#[derive(Debug, Clone)]
pub struct Bridge {
    config: Arc<BridgeConfig>,
    store: Arc<TelemetryStore>,
    correlator: QueryCorrelator,
    controller: ConvergenceController,
    scripts: Arc<CancellationRegistry>,
    recorder: Arc<LinkRecorder>,
    cancel: Option<CancellationToken>,
}

impl Bridge {
    /// Builds the bridge and returns the outbound command queue the transport drains.
    pub fn new(config: BridgeConfig) -> (Self, mpsc::Receiver<Command>) {
        let recorder = Arc::new(LinkRecorder::new());
        let store = Arc::new(TelemetryStore::with_recorder(recorder.clone()));
        let (dispatcher, rx) = CommandDispatcher::channel(config.command_queue_depth);
        let dispatcher = dispatcher.with_recorder(recorder.clone());
        let correlator = QueryCorrelator::new(store.clone(), dispatcher).with_recorder(recorder.clone());
        let controller = ConvergenceController::new(correlator.clone()).with_recorder(recorder.clone());

        info!(
            poll_ms = config.query_poll_ms,
            timeout_ms = config.query_timeout_ms,
            "Bridge ready"
        );

        let bridge = Self {
            config: Arc::new(config),
            store,
            correlator,
            controller,
            scripts: Arc::new(CancellationRegistry::new()),
            recorder,
            cancel: None,
        };
        (bridge, rx)
    }

    /// A handle whose operations are canceled by `stop_script(script_id)`.
    pub fn for_script(&self, script_id: &str) -> Self {
        let mut scoped = self.clone();
        scoped.cancel = Some(self.scripts.token_for(script_id));
        scoped
    }

    pub fn stop_script(&self, script_id: &str) -> bool {
        self.scripts.stop(script_id)
    }

    /// Releases the bookkeeping for a script that ended on its own.
    pub fn finish_script(&self, script_id: &str) -> bool {
        self.scripts.finish(script_id)
    }

    pub fn stop_all(&self) {
        self.scripts.stop_all();
    }

    /// Ingestion entry point for the transport.
    pub fn ingest(&self, update: TelemetryUpdate) -> Option<ChannelKey> {
        self.store.ingest(update)
    }

    pub fn store(&self) -> &Arc<TelemetryStore> {
        &self.store
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn recorder(&self) -> &Arc<LinkRecorder> {
        &self.recorder
    }

    pub fn controller(&self) -> &ConvergenceController {
        &self.controller
    }

    pub(crate) fn correlator(&self) -> &QueryCorrelator {
        &self.correlator
    }

    pub(crate) fn send(&self, command: Command) {
        self.correlator.dispatcher().send(command);
    }

    pub(crate) fn request(&self, key: ChannelKey, command: Command, window: PollWindow) -> QueryRequest {
        let request = QueryRequest::new(key, command, window);
        match &self.cancel {
            Some(token) => request.with_cancel(token.clone()),
            None => request,
        }
    }

    pub(crate) fn cancel_token(&self) -> Option<CancellationToken> {
        self.cancel.clone()
    }

    /// Sleeps for `duration` unless the script is stopped first. Returns the time actually waited.
    pub(crate) async fn pause(&self, duration: Duration) -> Duration {
        let duration = duration.min(MAX_WAIT);
        let started = Instant::now();
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = sleep(duration) => {}
                }
            }
            None => sleep(duration).await,
        }
        started.elapsed()
    }

    /// Holds for `hold`, then sends `release`. Detached holds run on their own task.
    pub(crate) async fn release_after(&self, hold: Duration, wait: WaitMode, release: Command) {
        match wait {
            WaitMode::Wait => {
                self.pause(hold).await;
                self.send(release);
            }
            WaitMode::Detach => {
                let dispatcher = self.correlator.dispatcher().clone();
                tokio::spawn(async move {
                    sleep(hold.min(MAX_WAIT)).await;
                    dispatcher.send(release);
                });
            }
        }
    }
}
