use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::state::SharedState;

use super::engine::ExecutionEngine;
use super::types::task::boxed_task;
use super::types::{ExecutionOpts, ExecutionResult, Stage, TaskOutput};

/// Fluent builder for a staged run.
///
/// Tasks registered between two [`advance_stage`](Pipeline::advance_stage)
/// calls form one stage; all tasks of a stage run concurrently, and the next
/// stage starts only after the previous one completed cleanly. The builder is
/// plain mutable state behind chained by-value calls; construct it fully,
/// then consume it with one of the run entry points.
///
/// ```no_run
/// use serde_json::json;
/// use stagerun_core::Pipeline;
///
/// # async fn demo() -> Result<(), stagerun_core::ExecutorError> {
/// let outcome = Pipeline::new()
///     .add_input("base", 10)
///     .add_task("double", |state| async move {
///         let base = state.get("base").and_then(|v| v.as_i64()).unwrap_or(0);
///         state.set("doubled", base * 2);
///         Ok(json!(base * 2))
///     })
///     .advance_stage()
///     .add_task("report", |state| async move { Ok(json!(state.get("doubled"))) })
///     .run()
///     .await;
///
/// let results = outcome.into_results()?;
/// assert_eq!(results["double"], json!(20));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Pipeline {
    state: SharedState,
    stages: Vec<Stage>,
    pending: Stage,
    deadline: Option<Instant>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the run to an absolute deadline. Once it passes, the executor
    /// stops waiting on the in-flight stage and reports a timeout; the tasks
    /// themselves are left to finish in the background.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Bind the run to a timeout. The clock starts now, when the timeout is
    /// attached, not at `run()`.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.with_deadline(deadline)
    }

    /// Seed or update a shared input value. Tasks reach the same store
    /// through the handle their body receives.
    pub fn add_input(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state.set(key, value);
        self
    }

    /// Read a shared value.
    pub fn get_input(&self, key: &str) -> Option<Value> {
        self.state.get(key)
    }

    /// Extra handle to the shared state store; clones observe the same map.
    /// Useful for inspecting values published by tasks after the run.
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Register a task in the currently open stage. The body receives a
    /// handle to the shared state store. Re-using a name within one stage
    /// overwrites the earlier registration.
    pub fn add_task<F, Fut>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(SharedState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskOutput> + Send + 'static,
    {
        self.pending.insert(name.into(), boxed_task(body));
        self
    }

    /// Register a task whose body needs no view of the shared state.
    pub fn add_simple_task<F, Fut>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskOutput> + Send + 'static,
    {
        self.add_task(name, move |_state| body())
    }

    /// Freeze the open stage and start a new one. A no-op while the open
    /// stage is still empty, so stray calls never produce empty stages.
    pub fn advance_stage(mut self) -> Self {
        if !self.pending.is_empty() {
            self.stages.push(std::mem::take(&mut self.pending));
        }
        self
    }

    /// Number of stages the run will execute, counting a non-empty open one.
    pub fn stage_count(&self) -> usize {
        self.stages.len() + usize::from(!self.pending.is_empty())
    }

    /// Total declared tasks across all stages.
    pub fn task_count(&self) -> usize {
        self.stages.iter().map(|stage| stage.len()).sum::<usize>() + self.pending.len()
    }

    /// Execute all stages with unlimited in-stage concurrency.
    pub async fn run(self) -> ExecutionResult {
        self.run_with_opts(ExecutionOpts::default()).await
    }

    /// Execute all stages with at most `max_concurrency` tasks in flight.
    /// Tasks are dispatched in joined batches of that size.
    pub async fn run_with_max_concurrency(self, max_concurrency: usize) -> ExecutionResult {
        self.run_with_opts(ExecutionOpts {
            max_concurrency: Some(max_concurrency),
            ..ExecutionOpts::default()
        })
        .await
    }

    /// General entry point: execute all stages under `opts`.
    pub async fn run_with_opts(mut self, opts: ExecutionOpts) -> ExecutionResult {
        // A non-empty open stage is closed implicitly.
        self = self.advance_stage();

        let deadline = match opts.timeout {
            Some(timeout) => Some(Instant::now() + timeout),
            None => self.deadline,
        };

        ExecutionEngine::new(self.state, deadline, opts.max_concurrency)
            .execute_stages(self.stages)
            .await
    }
}
