// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use fleet_adapters::{FakeAdapter, ScriptedRun};
use fleet_core::{Action, BatchGroupingStrategy, FakeClock, GroupBuilder, InstanceBuilder, Mode, ServerId, TaskStatus};
use fleet_storage::{TaskFilter, TaskQueue, WalStore};

use super::*;

fn harness(dir: &TempDir) -> (Arc<Coordinator<WalStore, FakeAdapter, FakeClock>>, Arc<WalStore>) {
    let (coordinator, store, _adapter) = harness_with_adapter(dir, Duration::from_secs(5));
    (coordinator, store)
}

fn harness_with_adapter(
    dir: &TempDir,
    shutdown_grace: Duration,
) -> (Arc<Coordinator<WalStore, FakeAdapter, FakeClock>>, Arc<WalStore>, Arc<FakeAdapter>) {
    let store = Arc::new(WalStore::open(dir.path().join("fleet.wal"), dir.path().join("fleet.snapshot")).expect("open"));
    let queue = Arc::new(TaskQueue::new(Arc::clone(&store), false));
    let adapter = Arc::new(FakeAdapter::new());
    let config = Config {
        socket_path: dir.path().join("fleetd.sock"),
        lock_path: dir.path().join("fleetd.pid"),
        wal_path: dir.path().join("fleet.wal"),
        snapshot_path: dir.path().join("fleet.snapshot"),
        log_path: dir.path().join("fleetd.log"),
        state_dir: dir.path().to_path_buf(),
        worker_pool_size: 2,
        default_update_playbook: "playbooks/update.yml".into(),
        night_restart_playbook: "playbooks/night_restart.yml".into(),
        docker_update_playbook: "playbooks/docker_update.yml".into(),
        action_playbook: "playbooks/lifecycle.yml".into(),
        task_progress_retention: Duration::from_secs(300),
        subprocess_kill_grace: Duration::from_secs(30),
        shutdown_grace,
        serialize_per_server: false,
    };
    let coordinator = Coordinator::new(Arc::clone(&store), queue, Arc::clone(&adapter), FakeClock::new(), &config);
    (coordinator, store, adapter)
}

#[test]
fn submit_update_enqueues_a_pending_task() {
    let dir = TempDir::new().expect("tempdir");
    let (coordinator, store) = harness(&dir);

    let instance = InstanceBuilder::default().build();
    store.seed_instance(instance.clone()).expect("seed");

    let ids = coordinator
        .submit_update(instance.id, "https://example.test/app-2.0.0.tar.gz".into(), Mode::Immediate, None, None)
        .expect("submit");

    assert_eq!(ids.len(), 1);
    let task = coordinator.get_task(&ids[0]).expect("get").expect("present");
    assert_eq!(task.task.status, TaskStatus::Pending);
    assert!(task.play_recap.is_empty());
}

#[test]
fn submit_bulk_action_groups_instances_by_server() {
    let dir = TempDir::new().expect("tempdir");
    let (coordinator, store) = harness(&dir);

    let server_a = ServerId::new();
    let server_b = ServerId::new();
    let group = GroupBuilder::default().batch_grouping_strategy(BatchGroupingStrategy::ByServer).build();
    store.seed_group(group.clone()).expect("seed group");

    let app1 = InstanceBuilder::default().instance_name("app_1").server_id(server_a).group_id(group.id).build();
    let app2 = InstanceBuilder::default().instance_name("app_2").server_id(server_b).group_id(group.id).build();
    store.seed_instance(app1.clone()).expect("seed");
    store.seed_instance(app2.clone()).expect("seed");

    let ids = coordinator.submit_bulk_action(vec![app1.id, app2.id], Action::Restart).expect("submit");
    assert_eq!(ids.len(), 2);
}

#[test]
fn get_task_returns_none_for_unknown_id() {
    let dir = TempDir::new().expect("tempdir");
    let (coordinator, _store) = harness(&dir);

    let result = coordinator.get_task(&fleet_core::TaskId::new()).expect("get");
    assert!(result.is_none());
}

#[tokio::test]
async fn cancel_task_on_a_pending_task_marks_it_failed_immediately() {
    let dir = TempDir::new().expect("tempdir");
    let (coordinator, store) = harness(&dir);

    let instance = InstanceBuilder::default().build();
    store.seed_instance(instance.clone()).expect("seed");
    let ids = coordinator.submit_action(instance.id, Action::Start).expect("submit");

    let outcome = coordinator.cancel_task(&ids[0]).await.expect("cancel");
    assert_eq!(outcome, fleet_storage::CancelOutcome::Cancelled);

    let task = coordinator.get_task(&ids[0]).expect("get").expect("present");
    assert_eq!(task.task.status, TaskStatus::Failed);
}

#[test]
fn list_tasks_filters_by_status() {
    let dir = TempDir::new().expect("tempdir");
    let (coordinator, store) = harness(&dir);

    let instance = InstanceBuilder::default().build();
    store.seed_instance(instance.clone()).expect("seed");
    coordinator.submit_action(instance.id, Action::Start).expect("submit");

    let pending = coordinator
        .list_tasks(&TaskFilter {
            status: Some(TaskStatus::Pending),
            instance_id: None,
            server_id: None,
        })
        .expect("list");
    assert_eq!(pending.len(), 1);

    let completed = coordinator
        .list_tasks(&TaskFilter {
            status: Some(TaskStatus::Completed),
            instance_id: None,
            server_id: None,
        })
        .expect("list");
    assert!(completed.is_empty());
}

#[tokio::test]
async fn drain_fails_tasks_still_processing_past_the_deadline_with_shutdown_error() {
    let dir = TempDir::new().expect("tempdir");
    let (coordinator, store, adapter) = harness_with_adapter(&dir, Duration::from_millis(50));

    let instance = InstanceBuilder::default().build();
    store.seed_instance(instance.clone()).expect("seed");
    adapter.push(ScriptedRun::hangs(4242, Vec::<String>::new()));

    let ids = coordinator
        .submit_update(instance.id, "https://example.test/app-2.0.0.tar.gz".into(), Mode::Immediate, None, None)
        .expect("submit");

    let (workers, sweep) = coordinator.start();

    let mut waited = 0;
    while coordinator.get_task(&ids[0]).expect("get").expect("present").task.status != TaskStatus::Processing {
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += 1;
        assert!(waited < 200, "task never reached processing");
    }

    coordinator.drain(workers, Duration::from_millis(50)).await;
    sweep.abort();

    let task = coordinator.get_task(&ids[0]).expect("get").expect("present").task;
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.error.as_deref(), Some("shutdown"));
}
