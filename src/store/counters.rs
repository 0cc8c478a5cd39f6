//! File-backed counter store.
//!
//! Counters are a flat map of scope key → value persisted as JSON. Daily
//! scopes embed their date in the key, so a new day naturally starts a
//! fresh counter. Reads are snapshot reads; increments serialise through
//! the store mutex and persist immediately.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::ZplgridError;
use crate::vars::CounterStore;

pub struct FileCounterStore {
    path: PathBuf,
    state: Mutex<HashMap<String, u64>>,
}

impl FileCounterStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ZplgridError> {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| ZplgridError::Store(format!("invalid counters file: {}", e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, state: Mutex::new(state) })
    }

    fn persist(&self, state: &HashMap<String, u64>) {
        let payload = match serde_json::to_vec_pretty(state) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialise counters");
                return;
            }
        };
        if let Err(e) = super::atomic_write(&self.path, &payload) {
            tracing::error!(error = %e, path = %self.path.display(), "failed to persist counters");
        }
    }
}

impl CounterStore for FileCounterStore {
    fn peek(&self, key: &str) -> u64 {
        *self.state.lock().expect("counter lock poisoned").get(key).unwrap_or(&0)
    }

    fn commit(&self, key: &str) -> u64 {
        let mut state = self.state.lock().expect("counter lock poisoned");
        let value = state.entry(key.to_string()).or_insert(0);
        *value += 1;
        let committed = *value;
        self.persist(&state);
        committed
    }
}
