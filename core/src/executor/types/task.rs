use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::state::SharedState;

/// What a task body resolves to: a value on success, an opaque error
/// otherwise.
pub type TaskOutput = Result<Value, anyhow::Error>;

/// Boxed, shareable task body. Receives a handle to the shared state store
/// and runs inside its own spawned unit.
pub type TaskFn = Arc<dyn Fn(SharedState) -> BoxFuture<'static, TaskOutput> + Send + Sync>;

/// One stage: task name -> body. Iteration order is not part of the
/// contract, and re-inserting a name replaces the earlier registration.
pub type Stage = HashMap<String, TaskFn>;

pub(crate) fn boxed_task<F, Fut>(body: F) -> TaskFn
where
    F: Fn(SharedState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TaskOutput> + Send + 'static,
{
    Arc::new(move |state| body(state).boxed())
}
