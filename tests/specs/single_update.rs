// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 1 (spec.md §8): single update, happy path.

use fleet_adapters::ScriptedRun;
use fleet_core::{ChangedBy, Instance, InstanceStatus, Mode, TaskStatus};
use fleet_storage::{Store, TaskFilter};

use crate::prelude::*;

#[tokio::test]
async fn single_update_happy_path_records_version_history() {
    let mut harness = Harness::new();

    let instance = Instance::builder()
        .instance_name("jurws_1")
        .version("1.79.2")
        .status(InstanceStatus::Online)
        .build();
    harness.store.seed_instance(instance.clone()).expect("seed instance");

    harness.adapter.push(ScriptedRun::completes(
        4242,
        [
            "PLAY [update jurws_1] ***".to_string(),
            "PLAY RECAP *********************************************************".to_string(),
            "jurws_1                    : ok=3    changed=2    unreachable=0    failed=0".to_string(),
        ],
    ));

    harness.start();

    let ids = harness
        .coordinator
        .submit_update(instance.id, "https://example.test/dist/jurws-1.80.0.jar".into(), Mode::Immediate, None, None)
        .expect("submit");
    assert_eq!(ids.len(), 1);
    let task_id = ids[0];

    let completed = wait_for(SPEC_WAIT_MAX_MS, || {
        harness.coordinator.get_task(&task_id).expect("get").map(|d| d.task.status.is_terminal()).unwrap_or(false)
    })
    .await;
    assert!(completed, "task did not reach a terminal state in time");

    let detail = harness.coordinator.get_task(&task_id).expect("get").expect("present");
    assert_eq!(detail.task.status, TaskStatus::Completed);
    assert_eq!(detail.play_recap.len(), 1);
    assert_eq!(detail.play_recap[0].host, "jurws_1");

    let history = harness.store.list_version_history(&instance.id).expect("history");
    assert_eq!(history.len(), 1);
    let entry = &history[0];
    assert_eq!(entry.old.version.as_deref(), Some("1.79.2"));
    assert_eq!(entry.new.version.as_deref(), Some("1.80.0"));
    assert_eq!(entry.changed_by, ChangedBy::User);
    assert_eq!(entry.change_source, "update_task");
    assert_eq!(entry.task_id, Some(task_id));

    // Invariant 4: a VersionHistory row referencing this task exists only
    // because the task completed.
    let by_task = harness.store.version_history_by_task(&task_id).expect("by task");
    assert_eq!(by_task.len(), 1);

    // Invariant 3: started_at <= completed_at.
    assert!(detail.task.started_at.unwrap() <= detail.task.completed_at.unwrap());
}

#[tokio::test]
async fn list_tasks_filters_by_status() {
    let mut harness = Harness::new();
    let instance = Instance::builder().instance_name("svc_1").build();
    harness.store.seed_instance(instance.clone()).expect("seed");
    harness.adapter.push(ScriptedRun::completes(1, Vec::<String>::new()));
    harness.start();

    let ids = harness
        .coordinator
        .submit_update(instance.id, "https://example.test/dist/svc-2.0.0.tar.gz".into(), Mode::Immediate, None, None)
        .expect("submit");

    wait_for(SPEC_WAIT_MAX_MS, || {
        harness.coordinator.get_task(&ids[0]).expect("get").map(|d| d.task.status == TaskStatus::Completed).unwrap_or(false)
    })
    .await;

    let completed = harness
        .coordinator
        .list_tasks(&TaskFilter { status: Some(TaskStatus::Completed), instance_id: None, server_id: None })
        .expect("list");
    assert!(completed.iter().any(|t| t.id == ids[0]));

    let pending = harness
        .coordinator
        .list_tasks(&TaskFilter { status: Some(TaskStatus::Pending), instance_id: None, server_id: None })
        .expect("list");
    assert!(pending.is_empty());
}
