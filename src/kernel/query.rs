use std::sync::Arc;
use std::time::Duration;
use serde::Serialize;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, Instrument};
use uuid::Uuid;

use crate::kernel::channel::ChannelKey;
use crate::kernel::command::{Command, CommandDispatcher};
use crate::kernel::stats::event::LinkEvent;
use crate::kernel::stats::recorder::LinkRecorder;
use crate::kernel::telemetry::{TelemetryRecord, TelemetryStore};
use crate::kernel::time::{deadline_after, PollWindow, MAX_WAIT};

/// Result of a correlated read. `NoData` covers both a dropped reply and a
/// reply that never matched; it is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Reading<T> {
    Value(T),
    NoData,
}

impl<T> Reading<T> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Reading::NoData)
    }

    pub fn value(self) -> Option<T> {
        match self {
            Reading::Value(v) => Some(v),
            Reading::NoData => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Reading<U> {
        match self {
            Reading::Value(v) => Reading::Value(f(v)),
            Reading::NoData => Reading::NoData,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.value().unwrap_or(default)
    }
}

impl<T> From<Option<T>> for Reading<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Reading::Value(v),
            None => Reading::NoData,
        }
    }
}

/// One "send, then wait for the matching reply" request.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub key: ChannelKey,
    pub command: Command,
    pub window: PollWindow,
    pub cancel: Option<CancellationToken>,
}

impl QueryRequest {
    pub fn new(key: ChannelKey, command: Command, window: PollWindow) -> Self {
        Self {
            key,
            command,
            window,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Turns a fire-and-forget command plus the unsolicited telemetry stream into
/// one bounded request/response future.
#[derive(Debug, Clone)]
pub struct QueryCorrelator {
    store: Arc<TelemetryStore>,
    dispatcher: CommandDispatcher,
    recorder: Option<Arc<LinkRecorder>>,
}

impl QueryCorrelator {
    pub fn new(store: Arc<TelemetryStore>, dispatcher: CommandDispatcher) -> Self {
        Self {
            store,
            dispatcher,
            recorder: None,
        }
    }

    pub fn with_recorder(mut self, recorder: Arc<LinkRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn store(&self) -> &Arc<TelemetryStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    fn record(&self, event: LinkEvent) {
        if let Some(recorder) = &self.recorder {
            recorder.record(event);
        }
    }

    /// Dispatches `request.command` once, then polls `request.key` every
    /// `window.interval`. The first pending record `extract` accepts is consumed
    /// and returned. Resolves `NoData` once `window.limit` has elapsed, or as
    /// soon as the cancel token fires.
    ///
    /// Dropping the returned future stops polling at once; the interval and
    /// deadline timers are owned by the future and go with it.
    pub async fn query<T, F>(&self, request: QueryRequest, mut extract: F) -> Reading<T>
    where
        F: FnMut(&TelemetryRecord) -> Option<T>,
    {
        let QueryRequest { key, command, window, cancel } = request;
        let span = debug_span!("query", id = %Uuid::new_v4(), %key);

        async move {
            let cancel = cancel.unwrap_or_default();
            let started = Instant::now();
            self.dispatcher.send(command);

            // tokio intervals reject a zero period
            let period = window.interval.clamp(Duration::from_millis(1), MAX_WAIT);
            let mut ticker = interval_at(deadline_after(started, period), period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let deadline = sleep_until(deadline_after(started, window.limit));
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("Query canceled");
                        self.record(LinkEvent::QueryCanceled { kind: key.kind });
                        return Reading::NoData;
                    }
                    _ = ticker.tick() => {
                        if let Some(value) = self.store.take_matching(&key, &mut extract) {
                            let latency_ms = started.elapsed().as_millis() as u64;
                            debug!(latency_ms, "Query resolved");
                            self.record(LinkEvent::QueryResolved { kind: key.kind, latency_ms });
                            return Reading::Value(value);
                        }
                    }
                    _ = &mut deadline => {
                        debug!("Query timed out");
                        self.record(LinkEvent::QueryNoData { kind: key.kind });
                        return Reading::NoData;
                    }
                }
            }
        }
        .instrument(span)
        .await
    }
}
