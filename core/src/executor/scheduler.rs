use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use futures::future::join_all;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::ExecutorError;
use crate::state::SharedState;

use super::types::result::TaskResponse;
use super::types::TaskFn;

/// Launch one batch of task units and wait for all of them, racing the wait
/// against `deadline`.
///
/// Every unit reports into a completion channel sized to the batch, so a unit
/// can always deliver its response even after the orchestrator stopped
/// listening. A deadline breach abandons the units rather than aborting them:
/// they keep running in the background and their responses are dropped with
/// the channel.
///
/// After a clean join the channel is drained in completion order. The first
/// error encountered short-circuits the batch; responses merged before it
/// stay in `results`, responses buffered after it are discarded unread.
pub(crate) async fn dispatch_batch(
    batch: Vec<(String, TaskFn)>,
    state: &SharedState,
    deadline: Option<Instant>,
    results: &mut HashMap<String, Value>,
) -> Result<(), ExecutorError> {
    let (tx, mut rx) = mpsc::channel::<TaskResponse>(batch.len().max(1));
    let mut units = Vec::with_capacity(batch.len());

    for (name, body) in batch {
        let tx = tx.clone();
        let state = state.clone();
        units.push(tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match AssertUnwindSafe(body(state)).catch_unwind().await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(ExecutorError::TaskFailed {
                    name: name.clone(),
                    source: err,
                }),
                Err(payload) => Err(ExecutorError::TaskPanicked {
                    name: name.clone(),
                    message: panic_message(payload.as_ref()),
                }),
            };
            let response = TaskResponse {
                name,
                outcome,
                duration_ms: started.elapsed().as_millis() as u64,
            };
            // The receiver may be gone after a deadline breach.
            let _ = tx.send(response).await;
        }));
    }
    drop(tx);

    join_batch(units, deadline).await?;

    while let Some(response) = rx.recv().await {
        tracing::debug!(
            task = %response.name,
            duration_ms = response.duration_ms,
            ok = response.outcome.is_ok(),
            "task unit finished"
        );
        match response.outcome {
            Ok(value) => {
                results.insert(response.name, value);
            }
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

/// Wait for every unit in the batch, or for the deadline, whichever comes
/// first.
async fn join_batch(
    units: Vec<JoinHandle<()>>,
    deadline: Option<Instant>,
) -> Result<(), ExecutorError> {
    match deadline {
        Some(at) => match tokio::time::timeout_at(at, join_all(units)).await {
            Ok(_) => Ok(()),
            Err(_) => Err(ExecutorError::StageTimeout),
        },
        None => {
            join_all(units).await;
            Ok(())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
