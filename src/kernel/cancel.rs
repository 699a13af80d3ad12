use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Per-script cancellation. The block layer stops a script by id; every
/// query or move started under that id resolves on its next scheduler turn.
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    scripts: Mutex<HashMap<String, CancellationToken>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn scripts(&self) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.scripts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Child of the script's token; created on first use.
    pub fn token_for(&self, script_id: &str) -> CancellationToken {
        self.scripts()
            .entry(script_id.to_string())
            .or_default()
            .child_token()
    }

    /// Stop one script. Later `token_for` calls with the same id start fresh.
    pub fn stop(&self, script_id: &str) -> bool {
        match self.scripts().remove(script_id) {
            Some(token) => {
                debug!(script_id, "Script stopped");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// A script ran to completion. Forgets its token without canceling work
    /// still holding a child of it.
    pub fn finish(&self, script_id: &str) -> bool {
        self.scripts().remove(script_id).is_some()
    }

    /// Project-wide stop.
    pub fn stop_all(&self) {
        let drained: Vec<_> = self.scripts().drain().collect();
        debug!(count = drained.len(), "Stopping all scripts");
        for (_, token) in drained {
            token.cancel();
        }
    }

    pub fn active(&self) -> usize {
        self.scripts().len()
    }
}
