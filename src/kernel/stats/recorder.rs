use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use super::event::LinkEvent;
use super::metrics::{compute_snapshot, LinkSnapshot};

const MAX_EVENTS: usize = 10_000;

/// Bounded event log shared by the store, dispatcher and correlators.
#[derive(Debug)]
pub struct LinkRecorder {
    buffer: Mutex<VecDeque<LinkEvent>>,
}

impl Default for LinkRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkRecorder {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(MAX_EVENTS)),
        }
    }

    fn buffer(&self) -> MutexGuard<'_, VecDeque<LinkEvent>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, event: LinkEvent) {
        let mut buffer = self.buffer();
        if buffer.len() >= MAX_EVENTS {
            buffer.pop_front();
        }
        buffer.push_back(event);
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        compute_snapshot(&self.buffer())
    }

    pub fn events(&self) -> Vec<LinkEvent> {
        self.buffer().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }

    pub fn clear(&self) {
        self.buffer().clear();
    }
}
