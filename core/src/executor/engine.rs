use std::collections::HashMap;

use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::ExecutorError;
use crate::state::SharedState;

use super::scheduler::dispatch_batch;
use super::types::{ExecutionResult, Stage, TaskFn};

/// Drives frozen stages strictly in declaration order: stage K+1 never
/// dispatches until stage K has fully joined and merged cleanly.
///
/// One engine backs exactly one run; the builder hands over its state handle,
/// deadline and stages, and gets an [`ExecutionResult`] back.
pub(crate) struct ExecutionEngine {
    state: SharedState,
    deadline: Option<Instant>,
    max_concurrency: Option<usize>,
}

impl ExecutionEngine {
    pub fn new(
        state: SharedState,
        deadline: Option<Instant>,
        max_concurrency: Option<usize>,
    ) -> Self {
        Self {
            state,
            deadline,
            max_concurrency: max_concurrency.map(|n| n.max(1)),
        }
    }

    pub async fn execute_stages(self, stages: Vec<Stage>) -> ExecutionResult {
        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let total_tasks: usize = stages.iter().map(|stage| stage.len()).sum();
        let total_stages = stages.len();

        tracing::debug!(
            run_id = %run_id,
            total_tasks,
            total_stages,
            max_concurrency = ?self.max_concurrency,
            "run started"
        );

        let mut results: HashMap<String, Value> = HashMap::new();
        let mut first_error = None;
        let mut stages_run = 0;

        for (stage_id, stage) in stages.into_iter().enumerate() {
            stages_run += 1;

            if let Err(err) = self
                .execute_stage(&run_id, stage_id, stage, &mut results)
                .await
            {
                match &err {
                    ExecutorError::StageTimeout => tracing::warn!(
                        run_id = %run_id,
                        stage_id,
                        "stage deadline elapsed, abandoning in-flight tasks"
                    ),
                    other => tracing::warn!(
                        run_id = %run_id,
                        stage_id,
                        error = %other,
                        "stage failed"
                    ),
                }
                first_error = Some(err);
                break;
            }
        }

        let result = ExecutionResult {
            completed: results.len(),
            total_tasks,
            stages_run,
            total_stages,
            duration_ms: started.elapsed().as_millis() as u64,
            error: first_error,
            results,
        };

        tracing::debug!(
            run_id = %run_id,
            completed = result.completed,
            success = result.is_success(),
            duration_ms = result.duration_ms,
            "run finished"
        );

        result
    }

    /// Execute one stage: everything at once, or in joined batches of
    /// `max_concurrency` tasks.
    async fn execute_stage(
        &self,
        run_id: &str,
        stage_id: usize,
        stage: Stage,
        results: &mut HashMap<String, Value>,
    ) -> Result<(), ExecutorError> {
        let task_count = stage.len();
        let batch_size = self.max_concurrency.unwrap_or(task_count).max(1);

        tracing::debug!(
            run_id = %run_id,
            stage_id,
            task_count,
            batch_size,
            "dispatching stage"
        );

        // Batch membership follows map iteration order and is not part of the
        // contract; only the batch size bound is.
        let tasks: Vec<(String, TaskFn)> = stage.into_iter().collect();
        for batch in tasks.chunks(batch_size) {
            dispatch_batch(batch.to_vec(), &self.state, self.deadline, results).await?;
        }

        Ok(())
    }
}
