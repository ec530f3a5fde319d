use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

/// Thread-safe key/value store shared between the orchestrator and every
/// running task.
///
/// The store doubles as task input and as the channel through which a task
/// publishes values for later stages. Handles are cheap to clone; every clone
/// observes the same map. All access goes through `get`/`set` and a single
/// mutex, so a write that happens before a stage boundary is visible to every
/// read after it. Within one stage no ordering is guaranteed: sibling tasks
/// must not assume they can observe each other's writes.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().insert(key.into(), value.into());
    }

    /// Read a value. Returns a clone so the lock is released before the
    /// caller touches the result.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
