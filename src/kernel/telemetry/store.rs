use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::event::{TelemetryRecord, TelemetryUpdate};
use crate::error::LinkError;
use crate::kernel::channel::ChannelKey;
use crate::kernel::stats::event::LinkEvent;
use crate::kernel::stats::recorder::LinkRecorder;

/// Latest-value cache with one change flag per correlation key.
///
/// Single writer (the ingestion entry point), any number of readers.
/// The lock is only ever held for one synchronous step, never across an await,
/// so a match-and-clear is exclusive to the caller that performed it.
#[derive(Debug, Default)]
pub struct TelemetryStore {
    channels: Mutex<HashMap<ChannelKey, TelemetryRecord>>,
    recorder: Option<Arc<LinkRecorder>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recorder(recorder: Arc<LinkRecorder>) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            recorder: Some(recorder),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<ChannelKey, TelemetryRecord>> {
        // Records are replaced whole, so a poisoned lock is still consistent
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: LinkEvent) {
        if let Some(recorder) = &self.recorder {
            recorder.record(event);
        }
    }

    /// Overwrites the record for the update's key and raises its flag.
    /// Returns the key touched, or `None` when the update was dropped.
    pub fn ingest(&self, update: TelemetryUpdate) -> Option<ChannelKey> {
        let Some(key) = update.key() else {
            debug!("Dropping telemetry update with unrecognized kind");
            self.record(LinkEvent::FrameDropped);
            return None;
        };
        let record = update.into_record()?;

        self.channels().insert(key, record);
        debug!(%key, "Telemetry ingested");
        self.record(LinkEvent::Ingested { kind: key.kind });
        Some(key)
    }

    /// JSON entry point for text transports. Malformed frames leave the store untouched.
    pub fn ingest_json(&self, frame: &str) -> Result<ChannelKey, LinkError> {
        let update: TelemetryUpdate = match serde_json::from_str(frame) {
            Ok(update) => update,
            Err(e) => {
                debug!("Dropping malformed telemetry frame: {}", e);
                self.record(LinkEvent::FrameDropped);
                return Err(LinkError::Malformed(e));
            }
        };
        self.ingest(update).ok_or(LinkError::UnknownKind)
    }

    /// Side-effect free snapshot. Never touches the change flag.
    pub fn read(&self, key: &ChannelKey) -> Option<TelemetryRecord> {
        self.channels().get(key).cloned()
    }

    /// Snapshot plus flag clear. `None` when nothing is pending for this key.
    pub fn consume(&self, key: &ChannelKey) -> Option<TelemetryRecord> {
        let mut channels = self.channels();
        let record = channels.get_mut(key)?;
        if !record.changed() {
            return None;
        }
        record.set_changed(false);
        Some(record.clone())
    }

    /// Read, match and clear in one step. The flag is cleared only when
    /// `extract` accepts the pending record; otherwise it stays pending for
    /// whichever consumer does match.
    pub fn take_matching<T, F>(&self, key: &ChannelKey, extract: F) -> Option<T>
    where
        F: FnOnce(&TelemetryRecord) -> Option<T>,
    {
        let mut channels = self.channels();
        let record = channels.get_mut(key)?;
        if !record.changed() {
            return None;
        }
        let value = extract(record)?;
        record.set_changed(false);
        Some(value)
    }

    pub fn is_pending(&self, key: &ChannelKey) -> bool {
        self.channels().get(key).map(|r| r.changed()).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.channels().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels().is_empty()
    }
}
