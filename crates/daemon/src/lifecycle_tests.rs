// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tempfile::TempDir;

use fleet_core::{Action, CatalogEntryBuilder, InstanceBuilder, Mode, TaskParams, TaskStatus};
use fleet_storage::{NewTaskRequest, Store, WalStore};

use super::*;

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
async fn startup_binds_socket_and_acquires_lock() {
    let dir = TempDir::new().expect("tempdir");
    let config = test_config(&dir);

    let result = startup(&config).await.expect("startup");
    assert!(config.lock_path.exists());
    assert!(config.socket_path.exists());

    result.daemon.shutdown();
    assert!(!config.socket_path.exists());
}

#[tokio::test]
async fn startup_fails_when_lock_already_held() {
    let dir = TempDir::new().expect("tempdir");
    let config = test_config(&dir);

    let first = startup(&config).await.expect("first startup");
    let second = startup(&config).await;

    assert!(matches!(second, Err(LifecycleError::LockFailed(_))));
    // The lock owner's files must survive a failed competing startup.
    assert!(config.lock_path.exists());

    first.daemon.shutdown();
}

#[tokio::test]
async fn recovery_fails_an_interrupted_task_by_default() {
    let dir = TempDir::new().expect("tempdir");
    let config = test_config(&dir);
    let store = WalStore::open(&config.wal_path, &config.snapshot_path).expect("open store");

    let instance = InstanceBuilder::default().build();
    store.seed_instance(instance.clone()).expect("seed instance");

    let task = store
        .insert_task(
            fleet_core::TaskId::new(),
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
    store.mark_started(&task.id, 2).expect("mark started");

    let counts = recover_processing_tasks(&store, 5).expect("recover");
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.requeued, 0);

    let recovered = store.get_task(&task.id).expect("get").expect("present");
    assert_eq!(recovered.status, TaskStatus::Failed);
    assert_eq!(recovered.error.as_deref(), Some("interrupted by restart"));
    assert_eq!(recovered.completed_at, Some(5));
    assert!(recovered.started_at.unwrap_or(0) <= recovered.completed_at.unwrap_or(0));
}

#[tokio::test]
async fn recovery_requeues_an_idempotent_immediate_update() {
    let dir = TempDir::new().expect("tempdir");
    let config = test_config(&dir);
    let store = WalStore::open(&config.wal_path, &config.snapshot_path).expect("open store");

    let catalog = CatalogEntryBuilder::default().idempotent_update(true).build();
    store.seed_catalog(catalog.clone()).expect("seed catalog");
    let instance = InstanceBuilder::default().catalog_id(catalog.id).build();
    store.seed_instance(instance.clone()).expect("seed instance");

    let task = store
        .insert_task(
            fleet_core::TaskId::new(),
            NewTaskRequest {
                params: TaskParams::Update {
                    app_ids: vec![instance.id],
                    distr_url: "https://example.test/app-1.2.3.tar.gz".into(),
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
    store.mark_started(&task.id, 2).expect("mark started");

    let counts = recover_processing_tasks(&store, 5).expect("recover");
    assert_eq!(counts.requeued, 1);
    assert_eq!(counts.failed, 0);

    let recovered = store.get_task(&task.id).expect("get").expect("present");
    assert_eq!(recovered.status, TaskStatus::Pending);
}
