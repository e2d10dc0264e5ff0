// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 5 (spec.md §8): cancelling a task while its playbook process
//! is running.

use std::time::Duration;

use fleet_adapters::ScriptedRun;
use fleet_core::{Instance, Mode, TaskStatus};

use crate::prelude::*;

#[tokio::test]
async fn cancel_in_flight_task_ends_failed_within_the_kill_grace() {
    let mut harness = Harness::with_worker_pool_size(1);
    let instance = Instance::builder().instance_name("app_1").version("1.0.0").build();
    harness.store.seed_instance(instance.clone()).expect("seed");

    // Never exits on its own; only reacts to terminate/kill.
    harness.adapter.push(ScriptedRun::hangs(9001, ["PLAY [update app_1] ***".to_string()]));
    harness.start();

    let ids = harness
        .coordinator
        .submit_update(instance.id, "https://example.test/dist/app-2.0.0.tar.gz".into(), Mode::Immediate, None, None)
        .expect("submit");
    let task_id = ids[0];

    let processing = wait_for(SPEC_WAIT_MAX_MS, || {
        harness.coordinator.get_task(&task_id).expect("get").map(|d| d.task.status == TaskStatus::Processing).unwrap_or(false)
    })
    .await;
    assert!(processing, "task never reached processing");

    let outcome = harness.coordinator.cancel_task(&task_id).await.expect("cancel");
    assert_eq!(outcome, fleet_storage::CancelOutcome::Cancelled);

    // Grace window is configured at 100ms in the harness; allow a margin.
    let finished = wait_for(Duration::from_millis(500).as_millis() as u64, || {
        harness.coordinator.get_task(&task_id).expect("get").map(|d| d.task.status.is_terminal()).unwrap_or(false)
    })
    .await;
    assert!(finished, "cancelled in-flight task did not finish within the kill grace window");

    let detail = harness.coordinator.get_task(&task_id).expect("get").expect("present");
    assert_eq!(detail.task.status, TaskStatus::Failed);
    assert!(detail.task.cancelled);

    let history = harness.store.list_version_history(&instance.id).expect("history");
    assert!(history.is_empty(), "a cancelled task must not record a version change");
}
