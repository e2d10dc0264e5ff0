// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for the end-to-end specs: a [`Coordinator`] wired to a
//! real [`WalStore`] under a scratch temp directory and a [`FakeAdapter`]
//! standing in for `ansible-playbook`.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::task::JoinHandle;

use fleet_adapters::FakeAdapter;
use fleet_core::FakeClock;
use fleet_daemon::{Config, Coordinator};
use fleet_storage::{TaskQueue, WalStore};

pub type TestCoordinator = Coordinator<WalStore, FakeAdapter, FakeClock>;

/// One scratch coordinator per test; `start()` spawns its worker pool.
/// Dropping the harness stops the queue and aborts the background tasks
/// so a failing assertion never leaves a worker spinning.
pub struct Harness {
    #[allow(dead_code)]
    dir: TempDir,
    pub store: Arc<WalStore>,
    pub adapter: Arc<FakeAdapter>,
    pub coordinator: Arc<TestCoordinator>,
    pub clock: FakeClock,
    workers: Vec<JoinHandle<()>>,
    sweep: Option<JoinHandle<()>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_worker_pool_size(2)
    }

    pub fn with_worker_pool_size(worker_pool_size: usize) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let store = Arc::new(
            WalStore::open(dir.path().join("fleet.wal"), dir.path().join("fleet.snapshot")).expect("open store"),
        );
        let queue = Arc::new(TaskQueue::new(Arc::clone(&store), false));
        let adapter = Arc::new(FakeAdapter::new());
        let clock = FakeClock::new();

        let config = Config {
            socket_path: dir.path().join("fleetd.sock"),
            lock_path: dir.path().join("fleetd.pid"),
            wal_path: dir.path().join("fleet.wal"),
            snapshot_path: dir.path().join("fleet.snapshot"),
            log_path: dir.path().join("fleetd.log"),
            state_dir: dir.path().to_path_buf(),
            worker_pool_size,
            default_update_playbook: "playbooks/update.yml".into(),
            night_restart_playbook: "playbooks/night_restart.yml".into(),
            docker_update_playbook: "playbooks/docker_update.yml".into(),
            action_playbook: "playbooks/lifecycle.yml".into(),
            task_progress_retention: Duration::from_secs(300),
            subprocess_kill_grace: Duration::from_millis(100),
            shutdown_grace: Duration::from_millis(200),
            serialize_per_server: false,
        };

        let coordinator = Coordinator::new(Arc::clone(&store), queue, Arc::clone(&adapter), clock.clone(), &config);

        Self { dir, store, adapter, coordinator, clock, workers: Vec::new(), sweep: None }
    }

    pub fn start(&mut self) {
        let (workers, sweep) = self.coordinator.start();
        self.workers = workers;
        self.sweep = Some(sweep);
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.coordinator.shutdown();
        for worker in &self.workers {
            worker.abort();
        }
        if let Some(sweep) = &self.sweep {
            sweep.abort();
        }
    }
}

/// Polls `condition` every 10ms until it returns `true` or `max_ms`
/// elapses, returning whether it converged. Used throughout instead of a
/// fixed sleep since worker dispatch timing isn't deterministic.
pub async fn wait_for(max_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let step = Duration::from_millis(10);
    let mut waited = 0u64;
    loop {
        if condition() {
            return true;
        }
        if waited >= max_ms {
            return false;
        }
        tokio::time::sleep(step).await;
        waited += step.as_millis() as u64;
    }
}

pub const SPEC_WAIT_MAX_MS: u64 = 2_000;
