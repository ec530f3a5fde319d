//! Staged concurrent task executor.
//!
//! `stagerun-core` runs named units of work in ordered stages: every task in
//! a stage executes concurrently, and a stage must fully complete before the
//! next one starts. That covers "fan out within a stage, fan in between
//! stages" dependency shapes without a task-graph scheduler; stage
//! membership is explicit, never inferred.
//!
//! Tasks exchange values through a [`SharedState`] store: the caller seeds
//! inputs, tasks publish values for later stages, and a single lock keeps
//! every access safe. Failures follow first-error-wins: the first task error,
//! contained panic, or deadline breach stops the run, and partial results
//! collected before it are preserved on the [`ExecutionResult`].
//!
//! A deadline never kills in-flight work. On a breach the executor stops
//! waiting and reports [`ExecutorError::StageTimeout`]; already-launched
//! tasks run to completion in the background and their results are dropped.
//! Do not rely on a timed-out task's side effects being unwound.

pub mod error;
pub mod executor;
pub mod state;

pub use error::ExecutorError;
pub use executor::{ExecutionOpts, ExecutionResult, Pipeline};
pub use state::SharedState;
