use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use pretty_assertions::assert_eq;
use serde_json::json;

use stagerun_core::{ExecutorError, Pipeline};

#[tokio::test(flavor = "multi_thread")]
async fn all_tasks_succeed_across_stages() {
    let outcome = Pipeline::new()
        .add_simple_task("f1", || async { Ok(json!(1)) })
        .add_simple_task("f2", || async { Ok(json!(1.5)) })
        .add_simple_task("f3", || async { Ok(json!(3)) })
        .advance_stage()
        .add_simple_task("f4", || async { Ok(json!("abcde")) })
        .add_simple_task("f5", || async { Ok(json!(5)) })
        .run()
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.completed, 5);
    assert_eq!(outcome.total_tasks, 5);
    assert_eq!(outcome.stages_run, 2);
    assert_eq!(outcome.results["f1"], json!(1));
    assert_eq!(outcome.results["f2"], json!(1.5));
    assert_eq!(outcome.results["f4"], json!("abcde"));
}

#[tokio::test(flavor = "multi_thread")]
async fn first_error_blocks_later_stages() {
    let second_stage_runs = Arc::new(AtomicUsize::new(0));
    let marker = second_stage_runs.clone();

    let outcome = Pipeline::new()
        .add_simple_task("a", || async { Ok(json!(1)) })
        .add_simple_task("b", || async { Ok(json!(2)) })
        .add_simple_task("c", || async { Err(anyhow!("boom")) })
        .advance_stage()
        .add_simple_task("d", move || {
            let marker = marker.clone();
            async move {
                marker.fetch_add(1, Ordering::SeqCst);
                Ok(json!(4))
            }
        })
        .run()
        .await;

    assert!(!outcome.is_success());
    assert_eq!(
        outcome.error.as_ref().and_then(|err| err.task_name()),
        Some("c")
    );
    assert_eq!(outcome.stages_run, 1);
    // Siblings of the failed task may or may not have been merged depending
    // on drain order; the second stage must never have dispatched.
    assert!(!outcome.results.contains_key("d"));
    assert_eq!(second_stage_runs.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn panic_is_contained_and_converted() {
    let outcome = Pipeline::new()
        .add_simple_task("stable", || async { Ok(json!(2)) })
        .advance_stage()
        .add_simple_task("explosive", || async { panic!("blew up") })
        .run()
        .await;

    assert!(!outcome.is_success());
    match outcome.error {
        Some(ExecutorError::TaskPanicked { ref name, ref message }) => {
            assert_eq!(name, "explosive");
            assert_eq!(message, "blew up");
        }
        ref other => panic!("expected a converted panic, got {other:?}"),
    }
    // The first stage completed before the panic.
    assert_eq!(outcome.results["stable"], json!(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn writes_are_visible_across_stage_boundaries() {
    let outcome = Pipeline::new()
        .add_input("x", 1)
        .add_task("producer", |state| async move {
            assert_eq!(state.get("x"), Some(json!(1)));
            state.set("y", 2);
            Ok(json!("produced"))
        })
        .advance_stage()
        .add_task("consumer", |state| async move { Ok(json!(state.get("y"))) })
        .run()
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.results["consumer"], json!(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn tasks_can_publish_values_read_after_the_run() {
    let pipeline = Pipeline::new();
    let state = pipeline.state();

    let outcome = pipeline
        .add_task("writer", |state| async move {
            state.set("published", "from inside a task");
            Ok(json!(null))
        })
        .run()
        .await;

    assert!(outcome.is_success());
    assert_eq!(state.get("published"), Some(json!("from inside a task")));
}

#[tokio::test(flavor = "multi_thread")]
async fn re_adding_a_name_overwrites_the_task() {
    let outcome = Pipeline::new()
        .add_simple_task("t", || async { Ok(json!("first")) })
        .add_simple_task("t", || async { Ok(json!("second")) })
        .run()
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.completed, 1);
    assert_eq!(outcome.results["t"], json!("second"));
}

#[tokio::test(flavor = "multi_thread")]
async fn stray_advances_never_create_empty_stages() {
    let outcome = Pipeline::new()
        .advance_stage()
        .add_simple_task("only", || async { Ok(json!(1)) })
        .advance_stage()
        .advance_stage()
        .run()
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.total_stages, 1);
    assert_eq!(outcome.stages_run, 1);
    assert_eq!(outcome.results["only"], json!(1));
}
