// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 2 (spec.md §8): batch grouping by server, with and without an
//! orchestrator playbook.

use fleet_adapters::ScriptedRun;
use fleet_core::{BatchGroupingStrategy, Group, Instance, Mode, ServerId, TaskStatus};

use crate::prelude::*;

fn seed_two_server_pair(harness: &Harness, group: Group) -> (Instance, Instance) {
    harness.store.seed_group(group.clone()).expect("seed group");

    let server_a = ServerId::new();
    let server_b = ServerId::new();
    let app1 = Instance::builder().instance_name("app_1").server_id(server_a).group_id(group.id).build();
    let app2 = Instance::builder().instance_name("app_2").server_id(server_b).group_id(group.id).build();
    harness.store.seed_instance(app1.clone()).expect("seed app1");
    harness.store.seed_instance(app2.clone()).expect("seed app2");
    (app1, app2)
}

#[tokio::test]
async fn by_server_without_orchestrator_produces_two_plans() {
    let mut harness = Harness::new();
    let group = Group::builder().batch_grouping_strategy(BatchGroupingStrategy::ByServer).build();
    let (app1, app2) = seed_two_server_pair(&harness, group);

    harness.adapter.push(ScriptedRun::completes(1, Vec::<String>::new()));
    harness.adapter.push(ScriptedRun::completes(2, Vec::<String>::new()));
    harness.start();

    let ids = harness
        .coordinator
        .submit_update_batch(vec![app1.id, app2.id], "https://example.test/dist/app-1.0.0.tar.gz".into(), Mode::Immediate, None, None)
        .expect("submit");

    assert_eq!(ids.len(), 2, "by_server with no orchestrator should split across the two servers");

    let done = wait_for(SPEC_WAIT_MAX_MS, || {
        ids.iter().all(|id| {
            harness.coordinator.get_task(id).expect("get").map(|d| d.task.status == TaskStatus::Completed).unwrap_or(false)
        })
    })
    .await;
    assert!(done);
}

#[tokio::test]
async fn by_server_with_orchestrator_collapses_to_one_plan() {
    let mut harness = Harness::new();
    let group = Group::builder().batch_grouping_strategy(BatchGroupingStrategy::ByServer).build();
    let (app1, app2) = seed_two_server_pair(&harness, group);

    harness.adapter.push(ScriptedRun::completes(1, Vec::<String>::new()));
    harness.start();

    let ids = harness
        .coordinator
        .submit_update_batch(
            vec![app1.id, app2.id],
            "https://example.test/dist/app-1.0.0.tar.gz".into(),
            Mode::Immediate,
            Some("orchestrate.yml".into()),
            None,
        )
        .expect("submit");

    assert_eq!(ids.len(), 1, "an orchestrator playbook removes server_id from the grouping key");

    let invocations = harness.adapter.invocations();
    wait_for(SPEC_WAIT_MAX_MS, || !harness.adapter.invocations().is_empty()).await;
    let _ = invocations;
}

#[tokio::test]
async fn no_grouping_strategy_produces_one_plan_per_instance() {
    let mut harness = Harness::new();
    let group = Group::builder().batch_grouping_strategy(BatchGroupingStrategy::NoGrouping).build();
    let (app1, app2) = seed_two_server_pair(&harness, group);

    harness.adapter.push(ScriptedRun::completes(1, Vec::<String>::new()));
    harness.adapter.push(ScriptedRun::completes(2, Vec::<String>::new()));

    let ids = harness
        .coordinator
        .submit_update_batch(vec![app1.id, app2.id], "https://example.test/dist/app-1.0.0.tar.gz".into(), Mode::Immediate, None, None)
        .expect("submit");

    assert_eq!(ids.len(), 2);
}
