// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 3 (spec.md §8): night-restart is rejected outright for any
//! docker instance in the batch, before anything is persisted.

use fleet_core::{AppType, Instance, Mode, TaskStatus};
use fleet_storage::TaskFilter;

use crate::prelude::*;

#[tokio::test]
async fn night_restart_rejects_a_batch_containing_a_docker_instance() {
    let mut harness = Harness::new();

    let docker_app = Instance::builder().instance_name("D1").app_type(AppType::Docker).build();
    let site_app = Instance::builder().instance_name("S1").app_type(AppType::Site).build();
    harness.store.seed_instance(docker_app.clone()).expect("seed docker");
    harness.store.seed_instance(site_app.clone()).expect("seed site");

    harness.start();

    let result = harness.coordinator.submit_update_batch(
        vec![docker_app.id, site_app.id],
        "https://example.test/dist/app.tar.gz".into(),
        Mode::NightRestart,
        None,
        None,
    );

    assert!(result.is_err(), "night-restart with a docker instance in the batch must be rejected");

    let tasks = harness.coordinator.list_tasks(&TaskFilter { status: None, instance_id: None, server_id: None }).expect("list");
    assert!(tasks.is_empty(), "a rejected submission must not persist any task");
}

#[tokio::test]
async fn night_restart_for_non_docker_instances_succeeds() {
    let mut harness = Harness::new();
    let site_app = Instance::builder().instance_name("S1").app_type(AppType::Site).build();
    harness.store.seed_instance(site_app.clone()).expect("seed");

    harness.adapter.push(fleet_adapters::ScriptedRun::completes(1, Vec::<String>::new()));
    harness.start();

    let ids = harness
        .coordinator
        .submit_update(site_app.id, "https://example.test/dist/app.tar.gz".into(), Mode::NightRestart, None, None)
        .expect("submit");
    assert_eq!(ids.len(), 1);

    wait_for(SPEC_WAIT_MAX_MS, || {
        harness.coordinator.get_task(&ids[0]).expect("get").map(|d| d.task.status == TaskStatus::Completed).unwrap_or(false)
    })
    .await;
}
