// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup, crash recovery, and shutdown (spec.md §9's crash
//! recovery policy). Lock acquired first, socket bound last, cleanup run
//! on any startup failure except a lock already held by a running daemon.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use fleet_core::{Clock, Mode, SystemClock, Task, TaskStatus, TaskType};
use fleet_storage::{Store, StoreError, TaskQueue, WalStore};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The daemon's long-lived runtime state.
pub struct DaemonState {
    pub config: Config,
    #[allow(dead_code)]
    lock_file: File,
    pub store: Arc<WalStore>,
    pub task_queue: Arc<TaskQueue<WalStore>>,
}

/// Startup's two deliverables: the state plus the bound listener, kept
/// separate so main.rs decides when to spawn the accept loop.
pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // A lock failure means another daemon owns these files; don't
            // clean up state that isn't ours.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Acquire the lock first, with OpenOptions that don't truncate until
    // after the lock succeeds — truncating first would wipe a running
    // daemon's PID out from under it.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    if let Some(parent) = config.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = Arc::new(WalStore::open(&config.wal_path, &config.snapshot_path)?);
    let recovered = recover_processing_tasks(store.as_ref(), SystemClock.epoch_ms())?;
    if recovered.requeued > 0 || recovered.failed > 0 {
        info!(requeued = recovered.requeued, failed = recovered.failed, "recovered interrupted tasks");
    }

    let task_queue = Arc::new(TaskQueue::new(Arc::clone(&store), config.serialize_per_server));

    // Stale socket removed, and the socket bound, only after every other
    // validation step has passed.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(socket = %config.socket_path.display(), "daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            store,
            task_queue,
        },
        listener,
    })
}

struct RecoveryCounts {
    requeued: u32,
    failed: u32,
}

/// Tasks left `Processing` when the daemon last exited didn't finish;
/// there is no live process to reattach to. By default they're failed
/// loudly (spec.md §9). `CatalogEntry::idempotent_update` opts an update
/// task back into `Pending` instead, for instances whose playbooks are
/// safe to re-run from the top — immediate updates only, since a
/// `night-restart`/`deliver` task mid-drain can't be safely replayed blind.
fn recover_processing_tasks(store: &WalStore, now: u64) -> Result<RecoveryCounts, StoreError> {
    let mut counts = RecoveryCounts { requeued: 0, failed: 0 };
    let catalogs = store.all_catalogs()?;

    for task in store.processing_tasks()? {
        if should_requeue(store, &task, &catalogs)? {
            store.requeue_to_pending(&task.id)?;
            counts.requeued += 1;
        } else {
            store.finish_task(
                &task.id,
                TaskStatus::Failed,
                None,
                Some("interrupted by restart".to_string()),
                now,
            )?;
            counts.failed += 1;
        }
    }

    Ok(counts)
}

fn should_requeue(
    store: &WalStore,
    task: &Task,
    catalogs: &std::collections::HashMap<fleet_core::CatalogId, fleet_core::CatalogEntry>,
) -> Result<bool, StoreError> {
    if task.task_type() != TaskType::Update {
        return Ok(false);
    }
    let fleet_core::TaskParams::Update { mode, .. } = &task.params else {
        return Ok(false);
    };
    if *mode != Mode::Immediate {
        return Ok(false);
    }
    let Some(instance_id) = task.instance_id else {
        return Ok(false);
    };
    let Some(instance) = store.get_instance(&instance_id)? else {
        return Ok(false);
    };
    let Some(catalog_id) = instance.catalog_id else {
        return Ok(false);
    };
    Ok(catalogs.get(&catalog_id).map(|c| c.idempotent_update).unwrap_or(false))
}

impl DaemonState {
    /// Graceful shutdown: checkpoint storage, then remove the files that
    /// mark this daemon as live. The lock itself is released when
    /// `lock_file` drops.
    pub fn shutdown(&self) {
        info!("shutting down daemon");

        if let Err(e) = self.store.checkpoint() {
            warn!(error = %e, "failed to checkpoint store on shutdown");
        }

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!(error = %e, "failed to remove socket file");
            }
        }

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!(error = %e, "failed to remove lock file");
            }
        }

        info!("daemon shutdown complete");
    }
}

fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
