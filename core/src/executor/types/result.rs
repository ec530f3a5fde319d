use std::collections::HashMap;

use serde_json::Value;

use crate::error::ExecutorError;

/// Outcome of a full pipeline run.
///
/// Failure is data here, not an `Err` branch: results merged before the first
/// failure are preserved so callers can inspect what did complete.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Task name -> returned value, for every task that completed without
    /// error before the run stopped.
    pub results: HashMap<String, Value>,

    /// First failure observed (task error, converted panic, or timeout).
    pub error: Option<ExecutorError>,

    /// Number of task results merged into `results`.
    pub completed: usize,

    /// Total number of tasks declared across all stages.
    pub total_tasks: usize,

    /// Number of stages that began dispatching.
    pub stages_run: usize,

    /// Total number of declared stages.
    pub total_stages: usize,

    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Collapse into a plain `Result`, discarding partial results on failure.
    pub fn into_results(self) -> Result<HashMap<String, Value>, ExecutorError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.results),
        }
    }
}

/// Response sent by one task unit into the stage completion channel.
#[derive(Debug)]
pub(crate) struct TaskResponse {
    pub name: String,
    pub outcome: Result<Value, ExecutorError>,
    pub duration_ms: u64,
}
