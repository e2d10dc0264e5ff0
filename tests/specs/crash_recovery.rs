// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 6 (spec.md §8): a task left `processing` when the daemon was
//! killed is failed loudly on the next startup, with no version history
//! written on its behalf.

use std::time::Duration;

use fleet_core::{Action, Instance, Mode, TaskId, TaskParams, TaskStatus};
use fleet_daemon::config::Config;
use fleet_daemon::lifecycle;
use fleet_storage::{NewTaskRequest, Store, WalStore};
use tempfile::TempDir;

fn test_config(dir: &TempDir) -> Config {
    let state_dir = dir.path().to_path_buf();
    Config {
        socket_path: state_dir.join("fleetd.sock"),
        lock_path: state_dir.join("fleetd.pid"),
        wal_path: state_dir.join("fleet.wal"),
        snapshot_path: state_dir.join("fleet.snapshot"),
        log_path: state_dir.join("fleetd.log"),
        state_dir,
        worker_pool_size: 2,
        default_update_playbook: "playbooks/update.yml".into(),
        night_restart_playbook: "playbooks/night_restart.yml".into(),
        docker_update_playbook: "playbooks/docker_update.yml".into(),
        action_playbook: "playbooks/lifecycle.yml".into(),
        task_progress_retention: Duration::from_secs(300),
        subprocess_kill_grace: Duration::from_secs(30),
        shutdown_grace: Duration::from_secs(5),
        serialize_per_server: false,
    }
}

#[tokio::test]
async fn interrupted_task_is_failed_loudly_on_restart() {
    let dir = TempDir::new().expect("tempdir");
    let config = test_config(&dir);

    let instance = Instance::builder().instance_name("crashy_1").build();
    let task_id = TaskId::new();

    {
        // Simulates the daemon that crashed: a store left with one task
        // mid-flight, and no lock/socket held (process is gone).
        let store = WalStore::open(&config.wal_path, &config.snapshot_path).expect("open store");
        store.seed_instance(instance.clone()).expect("seed instance");
        store
            .insert_task(
                task_id,
                NewTaskRequest {
                    params: TaskParams::Action {
                        app_ids: vec![instance.id],
                        action: Action::Restart,
                        playbook_path: "restart.yml".into(),
                        timeout_seconds: None,
                    },
                    server_id: Some(instance.server_id),
                    instance_id: Some(instance.id),
                },
                1,
            )
            .expect("insert task");
        store.mark_started(&task_id, 2).expect("mark started");
        store.checkpoint().expect("checkpoint");
    }

    let result = lifecycle::startup(&config).await.expect("startup after crash");

    let recovered = result.daemon.task_queue.store().get_task(&task_id).expect("get").expect("present");
    assert_eq!(recovered.status, TaskStatus::Failed);
    assert_eq!(recovered.error.as_deref(), Some("interrupted by restart"));
    assert!(!recovered.cancelled, "a crash-interrupted task is not the same as a cancelled one");

    let history = result.daemon.store.version_history_by_task(&task_id).expect("history by task");
    assert!(history.is_empty(), "an interrupted task must not leave a version history row");

    result.daemon.shutdown();
}

#[tokio::test]
async fn an_idempotent_immediate_update_is_requeued_instead_of_failed() {
    let dir = TempDir::new().expect("tempdir");
    let config = test_config(&dir);

    let catalog = fleet_core::CatalogEntry::builder().idempotent_update(true).build();
    let instance = Instance::builder().instance_name("crashy_2").catalog_id(catalog.id).build();
    let task_id = TaskId::new();

    {
        let store = WalStore::open(&config.wal_path, &config.snapshot_path).expect("open store");
        store.seed_catalog(catalog.clone()).expect("seed catalog");
        store.seed_instance(instance.clone()).expect("seed instance");
        store
            .insert_task(
                task_id,
                NewTaskRequest {
                    params: TaskParams::Update {
                        app_ids: vec![instance.id],
                        distr_url: "https://example.test/dist/app-1.2.3.tar.gz".into(),
                        mode: Mode::Immediate,
                        playbook_path: "update.yml".into(),
                        orchestrator_playbook: None,
                        drain_wait_time: None,
                        timeout_seconds: None,
                    },
                    server_id: Some(instance.server_id),
                    instance_id: Some(instance.id),
                },
                1,
            )
            .expect("insert task");
        store.mark_started(&task_id, 2).expect("mark started");
        store.checkpoint().expect("checkpoint");
    }

    let result = lifecycle::startup(&config).await.expect("startup after crash");

    let recovered = result.daemon.task_queue.store().get_task(&task_id).expect("get").expect("present");
    assert_eq!(recovered.status, TaskStatus::Pending);

    result.daemon.shutdown();
}
