// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed persistence for Task, Instance, Server, Group, Catalog, and
//! VersionHistory (spec.md §2 Store, §3 Data Model).

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::Mutex;

use fleet_core::{
    CatalogEntry, CatalogId, Group, GroupId, Instance, InstanceId, Server, ServerId, Task,
    TaskId, TaskStatus, VersionFields, VersionHistoryEntry,
};

use crate::error::StoreError;
use crate::event::StorageEvent;
use crate::snapshot;
use crate::state::{MaterializedState, TaskFilter};
use crate::wal::Wal;

/// A new task to persist, independent of how its plan was derived —
/// decouples `fleet-storage` from `fleet-planner`'s `PlanItem` (the planner
/// crate depends on storage's types, not the other way around).
#[derive(Debug, Clone)]
pub struct NewTaskRequest {
    pub params: fleet_core::TaskParams,
    pub server_id: Option<ServerId>,
    pub instance_id: Option<InstanceId>,
}

/// Typed persistence for the fleet task pipeline's entities. Every
/// operation is a short, synchronous, mutex-guarded transaction (spec.md
/// §5): a WAL append plus an in-memory projection update, never a network
/// round-trip — so no lock is ever held across subprocess I/O.
pub trait Store: Send + Sync {
    fn insert_task(&self, id: TaskId, req: NewTaskRequest, created_at: u64) -> Result<Task, StoreError>;
    fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StoreError>;
    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError>;
    /// FIFO by `created_at`, tie-broken by ID; tasks whose `server_id` is in
    /// `excluded_servers` are skipped (per-server serialization, opt-in).
    fn next_pending_task_id(&self, excluded_servers: &[ServerId]) -> Result<Option<TaskId>, StoreError>;
    fn mark_started(&self, id: &TaskId, started_at: u64) -> Result<Option<Task>, StoreError>;
    fn assign_pid(&self, id: &TaskId, pid: Option<u32>) -> Result<(), StoreError>;
    fn finish_task(
        &self,
        id: &TaskId,
        status: TaskStatus,
        result: Option<String>,
        error: Option<String>,
        completed_at: u64,
    ) -> Result<(), StoreError>;
    /// Cancels a pending task. Returns `Ok(true)` if cancellation took
    /// effect, `Ok(false)` with no mutation if the task wasn't cancelable.
    fn cancel_pending(&self, id: &TaskId) -> Result<bool, StoreError>;
    /// Cancels a task regardless of phase: a `Pending` task is finished as
    /// `Failed` immediately (it never ran); a `Processing` task with a live
    /// pid is only flagged — the worker loop finalizes it once the
    /// signalled process exits. Returns `Ok(false)` if the task isn't
    /// cancelable (`Task::can_cancel`).
    fn request_cancel(&self, id: &TaskId) -> Result<bool, StoreError>;
    fn requeue_to_pending(&self, id: &TaskId) -> Result<(), StoreError>;

    fn seed_instance(&self, instance: Instance) -> Result<(), StoreError>;
    fn get_instance(&self, id: &InstanceId) -> Result<Option<Instance>, StoreError>;
    fn get_instances(&self, ids: &[InstanceId]) -> Result<Vec<Instance>, StoreError>;
    fn all_instances(&self) -> Result<Vec<Instance>, StoreError>;
    fn update_instance_version(&self, id: &InstanceId, fields: VersionFields) -> Result<(), StoreError>;

    fn seed_server(&self, server: Server) -> Result<(), StoreError>;
    fn get_server(&self, id: &ServerId) -> Result<Option<Server>, StoreError>;

    fn seed_group(&self, group: Group) -> Result<(), StoreError>;
    fn all_groups(&self) -> Result<HashMap<GroupId, Group>, StoreError>;

    fn seed_catalog(&self, entry: CatalogEntry) -> Result<(), StoreError>;
    fn all_catalogs(&self) -> Result<HashMap<CatalogId, CatalogEntry>, StoreError>;

    fn record_version_history(&self, entry: VersionHistoryEntry) -> Result<(), StoreError>;
    fn list_version_history(&self, instance_id: &InstanceId) -> Result<Vec<VersionHistoryEntry>, StoreError>;
    fn version_history_by_task(&self, task_id: &TaskId) -> Result<Vec<VersionHistoryEntry>, StoreError>;

    /// Every task left in `Processing`, for the startup recovery pass.
    fn processing_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// Forces a snapshot + WAL truncation checkpoint.
    fn checkpoint(&self) -> Result<(), StoreError>;
}

struct Inner {
    state: MaterializedState,
    wal: Wal,
}

/// The one backing `Store` implementation: WAL-plus-periodic-snapshot,
/// matching the teacher's `MaterializedState` + `Wal` + `Checkpointer`
/// design instead of introducing a SQL crate the teacher never depends on.
pub struct WalStore {
    inner: Mutex<Inner>,
    snapshot_path: PathBuf,
}

impl WalStore {
    pub fn open(wal_path: impl Into<PathBuf>, snapshot_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let wal_path = wal_path.into();
        let snapshot_path = snapshot_path.into();

        let mut state = snapshot::read_snapshot(&snapshot_path)?.unwrap_or_default();
        for event in Wal::replay(&wal_path)? {
            state.apply(&event);
        }
        let wal = Wal::open(&wal_path)?;

        Ok(Self {
            inner: Mutex::new(Inner { state, wal }),
            snapshot_path,
        })
    }

    fn record(&self, inner: &mut Inner, event: StorageEvent) -> Result<(), StoreError> {
        inner.wal.append(&event)?;
        inner.state.apply(&event);
        Ok(())
    }
}

impl Store for WalStore {
    fn insert_task(&self, id: TaskId, req: NewTaskRequest, created_at: u64) -> Result<Task, StoreError> {
        let task = Task::new(id, req.params, req.server_id, req.instance_id, created_at);
        let mut inner = self.inner.lock();
        self.record(&mut inner, StorageEvent::TaskEnqueued(Box::new(task.clone())))?;
        Ok(task)
    }

    fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.inner.lock().state.tasks.get(id).cloned())
    }

    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.lock();
        let mut tasks: Vec<Task> = inner
            .state
            .tasks
            .values()
            .filter(|t| MaterializedState::matches(t, filter))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.as_str().cmp(b.id.as_str())));
        Ok(tasks)
    }

    fn next_pending_task_id(&self, excluded_servers: &[ServerId]) -> Result<Option<TaskId>, StoreError> {
        let inner = self.inner.lock();
        let mut pending: Vec<&Task> = inner
            .state
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending && !t.cancelled)
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.as_str().cmp(b.id.as_str())));
        Ok(pending
            .into_iter()
            .find(|t| match &t.server_id {
                Some(server_id) => !excluded_servers.contains(server_id),
                None => true,
            })
            .map(|t| t.id))
    }

    fn mark_started(&self, id: &TaskId, started_at: u64) -> Result<Option<Task>, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.tasks.contains_key(id) {
            return Ok(None);
        }
        self.record(&mut inner, StorageEvent::TaskStarted { id: *id, started_at })?;
        Ok(inner.state.tasks.get(id).cloned())
    }

    fn assign_pid(&self, id: &TaskId, pid: Option<u32>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.record(&mut inner, StorageEvent::TaskPidAssigned { id: *id, pid })
    }

    fn finish_task(
        &self,
        id: &TaskId,
        status: TaskStatus,
        result: Option<String>,
        error: Option<String>,
        completed_at: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.record(
            &mut inner,
            StorageEvent::TaskFinished {
                id: *id,
                status,
                result,
                error,
                completed_at,
            },
        )
    }

    fn cancel_pending(&self, id: &TaskId) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        let cancelable = matches!(
            inner.state.tasks.get(id),
            Some(t) if t.status == TaskStatus::Pending && !t.cancelled
        );
        if !cancelable {
            return Ok(false);
        }
        self.record(
            &mut inner,
            StorageEvent::TaskCancelled {
                id: *id,
                error: "cancelled by user".into(),
            },
        )?;
        Ok(true)
    }

    fn request_cancel(&self, id: &TaskId) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        let Some(task) = inner.state.tasks.get(id).cloned() else {
            return Ok(false);
        };
        if !task.can_cancel() {
            return Ok(false);
        }
        match task.status {
            TaskStatus::Pending => {
                self.record(
                    &mut inner,
                    StorageEvent::TaskCancelled {
                        id: *id,
                        error: "cancelled by user".into(),
                    },
                )?;
            }
            _ => {
                self.record(&mut inner, StorageEvent::TaskCancelRequested { id: *id })?;
            }
        }
        Ok(true)
    }

    fn requeue_to_pending(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if let Some(task) = inner.state.tasks.get(id).cloned() {
            // A requeue is a fresh pending task record; started_at/pid are
            // cleared by replaying the enqueue event with the same id.
            let mut reset = task;
            reset.status = TaskStatus::Pending;
            reset.started_at = None;
            reset.pid = None;
            self.record(&mut inner, StorageEvent::TaskEnqueued(Box::new(reset)))?;
        }
        Ok(())
    }

    fn seed_instance(&self, instance: Instance) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.record(&mut inner, StorageEvent::InstanceSeeded(Box::new(instance)))
    }

    fn get_instance(&self, id: &InstanceId) -> Result<Option<Instance>, StoreError> {
        Ok(self.inner.lock().state.instances.get(id).cloned())
    }

    fn get_instances(&self, ids: &[InstanceId]) -> Result<Vec<Instance>, StoreError> {
        let inner = self.inner.lock();
        Ok(ids.iter().filter_map(|id| inner.state.instances.get(id).cloned()).collect())
    }

    fn all_instances(&self) -> Result<Vec<Instance>, StoreError> {
        Ok(self.inner.lock().state.instances.values().cloned().collect())
    }

    fn update_instance_version(&self, id: &InstanceId, fields: VersionFields) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.record(&mut inner, StorageEvent::InstanceVersionUpdated { id: *id, fields })
    }

    fn seed_server(&self, server: Server) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.record(&mut inner, StorageEvent::ServerSeeded(Box::new(server)))
    }

    fn get_server(&self, id: &ServerId) -> Result<Option<Server>, StoreError> {
        Ok(self.inner.lock().state.servers.get(id).cloned())
    }

    fn seed_group(&self, group: Group) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.record(&mut inner, StorageEvent::GroupSeeded(Box::new(group)))
    }

    fn all_groups(&self) -> Result<HashMap<GroupId, Group>, StoreError> {
        Ok(self.inner.lock().state.groups.clone())
    }

    fn seed_catalog(&self, entry: CatalogEntry) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.record(&mut inner, StorageEvent::CatalogSeeded(Box::new(entry)))
    }

    fn all_catalogs(&self) -> Result<HashMap<CatalogId, CatalogEntry>, StoreError> {
        Ok(self.inner.lock().state.catalogs.clone())
    }

    fn record_version_history(&self, entry: VersionHistoryEntry) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.record(&mut inner, StorageEvent::VersionHistoryRecorded(Box::new(entry)))
    }

    fn list_version_history(&self, instance_id: &InstanceId) -> Result<Vec<VersionHistoryEntry>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .state
            .version_history
            .iter()
            .filter(|e| &e.instance_id == instance_id)
            .cloned()
            .collect())
    }

    fn version_history_by_task(&self, task_id: &TaskId) -> Result<Vec<VersionHistoryEntry>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .state
            .version_history
            .iter()
            .filter(|e| e.task_id.as_ref() == Some(task_id))
            .cloned()
            .collect())
    }

    fn processing_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .inner
            .lock()
            .state
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Processing)
            .cloned()
            .collect())
    }

    fn checkpoint(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        snapshot::write_snapshot(&self.snapshot_path, &inner.state)?;
        inner.wal.truncate()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
