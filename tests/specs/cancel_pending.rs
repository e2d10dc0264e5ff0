// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 4 (spec.md §8): cancelling a task that is still pending.

use fleet_core::{Instance, Mode, TaskStatus};

use crate::prelude::*;

#[tokio::test]
async fn cancel_pending_task_fails_it_immediately_without_running() {
    // Worker pool size zero: nothing ever dequeues the task, so it stays
    // pending until cancelled.
    let mut harness = Harness::with_worker_pool_size(0);
    let instance = Instance::builder().instance_name("app_1").build();
    harness.store.seed_instance(instance.clone()).expect("seed");

    let ids = harness
        .coordinator
        .submit_update(instance.id, "https://example.test/dist/app-2.0.0.tar.gz".into(), Mode::Immediate, None, None)
        .expect("submit");
    let task_id = ids[0];

    let before = harness.coordinator.get_task(&task_id).expect("get").expect("present");
    assert_eq!(before.task.status, TaskStatus::Pending);

    let outcome = harness.coordinator.cancel_task(&task_id).await.expect("cancel");
    assert_eq!(outcome, fleet_storage::CancelOutcome::Cancelled);

    let after = harness.coordinator.get_task(&task_id).expect("get").expect("present");
    assert_eq!(after.task.status, TaskStatus::Failed);
    assert!(after.task.cancelled);
    assert!(after.task.error.is_some());
    assert!(after.task.result.is_none());
    assert!(after.task.started_at.is_none());

    assert!(harness.adapter.invocations().is_empty(), "a cancelled-pending task must never spawn a process");
}

#[tokio::test]
async fn double_cancel_is_a_no_op_returning_a_diagnostic() {
    let mut harness = Harness::with_worker_pool_size(0);
    let instance = Instance::builder().instance_name("app_1").build();
    harness.store.seed_instance(instance.clone()).expect("seed");

    let ids = harness
        .coordinator
        .submit_update(instance.id, "https://example.test/dist/app-2.0.0.tar.gz".into(), Mode::Immediate, None, None)
        .expect("submit");
    let task_id = ids[0];

    let first = harness.coordinator.cancel_task(&task_id).await.expect("cancel");
    assert_eq!(first, fleet_storage::CancelOutcome::Cancelled);

    let second = harness.coordinator.cancel_task(&task_id).await.expect("cancel");
    assert_ne!(second, fleet_storage::CancelOutcome::Cancelled, "a second cancel must not report success");
}

#[tokio::test]
async fn cancel_of_unknown_task_returns_not_found() {
    let harness = Harness::new();
    let outcome = harness.coordinator.cancel_task(&fleet_core::TaskId::new()).await.expect("cancel");
    assert_eq!(outcome, fleet_storage::CancelOutcome::NotFound);
}
