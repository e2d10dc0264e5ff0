// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable FIFO of pending tasks (spec.md §4.2): admission, dequeue,
//! mark-started, mark-finished, and cancel-pending, layered over [`Store`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use fleet_core::{ServerId, TaskId, TaskStatus};

use crate::error::StoreError;
use crate::state::TaskFilter;
use crate::store::{NewTaskRequest, Store};

/// Re-polled periodically even without a wake, so a lost notify (or a
/// spurious one, per spec.md §9) never wedges a worker forever.
const POLL_FALLBACK: Duration = Duration::from_millis(250);

/// Diagnostic returned when a cancel request didn't take effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    NotFound,
    NotCancelable(TaskStatus),
}

pub struct TaskQueue<S: Store> {
    store: Arc<S>,
    notify: Notify,
    shutting_down: AtomicBool,
    serialize_per_server: bool,
    in_flight_servers: Mutex<HashSet<ServerId>>,
}

impl<S: Store> TaskQueue<S> {
    pub fn new(store: Arc<S>, serialize_per_server: bool) -> Self {
        Self {
            store,
            notify: Notify::new(),
            shutting_down: AtomicBool::new(false),
            serialize_per_server,
            in_flight_servers: Mutex::new(HashSet::new()),
        }
    }

    /// Persists one task per request and wakes any blocked `dequeue`.
    pub fn enqueue(&self, requests: Vec<NewTaskRequest>, created_at: u64) -> Result<Vec<TaskId>, StoreError> {
        let mut ids = Vec::with_capacity(requests.len());
        for req in requests {
            let id = TaskId::new();
            let task = self.store.insert_task(id, req, created_at)?;
            ids.push(task.id);
        }
        self.notify.notify_waiters();
        Ok(ids)
    }

    /// Blocks until a pending task is available (or shutdown), atomically
    /// transitioning it to `Processing`. Tolerates spurious wakes by
    /// re-querying the Store, per spec.md §9.
    pub async fn dequeue(&self, started_at: impl Fn() -> u64) -> Option<fleet_core::Task> {
        loop {
            if self.shutting_down.load(Ordering::SeqCst) {
                return None;
            }

            let excluded: Vec<ServerId> = if self.serialize_per_server {
                self.in_flight_servers.lock().iter().copied().collect()
            } else {
                Vec::new()
            };

            if let Ok(Some(id)) = self.store.next_pending_task_id(&excluded) {
                if let Ok(Some(task)) = self.store.mark_started(&id, started_at()) {
                    if let Some(server_id) = task.server_id {
                        self.in_flight_servers.lock().insert(server_id);
                    }
                    return Some(task);
                }
            }

            tokio::select! {
                _ = self.notify.notified() => {}
                _ = tokio::time::sleep(POLL_FALLBACK) => {}
            }
        }
    }

    pub fn cancel_pending(&self, id: &TaskId) -> Result<CancelOutcome, StoreError> {
        let Some(task) = self.store.get_task(id)? else {
            return Ok(CancelOutcome::NotFound);
        };
        if task.cancelled || task.status != TaskStatus::Pending {
            return Ok(CancelOutcome::NotCancelable(task.status));
        }
        if self.store.cancel_pending(id)? {
            Ok(CancelOutcome::Cancelled)
        } else {
            Ok(CancelOutcome::NotCancelable(task.status))
        }
    }

    /// Cancels a task in either phase (spec.md §8's "cancel pending" and
    /// "cancel in-flight" scenarios). For a `Processing` task this only
    /// flags `cancelled`; the caller (the Executor) is responsible for
    /// signalling the live process via its `CancelRegistry`.
    pub fn request_cancel(&self, id: &TaskId) -> Result<CancelOutcome, StoreError> {
        let Some(task) = self.store.get_task(id)? else {
            return Ok(CancelOutcome::NotFound);
        };
        if !task.can_cancel() {
            return Ok(CancelOutcome::NotCancelable(task.status));
        }
        if self.store.request_cancel(id)? {
            Ok(CancelOutcome::Cancelled)
        } else {
            Ok(CancelOutcome::NotCancelable(task.status))
        }
    }

    /// Persists the final outcome and releases the task's server slot.
    pub fn finish(
        &self,
        id: &TaskId,
        status: TaskStatus,
        result: Option<String>,
        error: Option<String>,
        completed_at: u64,
    ) -> Result<(), StoreError> {
        if let Ok(Some(task)) = self.store.get_task(id) {
            if let Some(server_id) = task.server_id {
                self.in_flight_servers.lock().remove(&server_id);
            }
        }
        self.store.finish_task(id, status, result, error, completed_at)?;
        self.notify.notify_waiters();
        Ok(())
    }

    pub fn list(&self, filter: &TaskFilter) -> Result<Vec<fleet_core::Task>, StoreError> {
        self.store.list_tasks(filter)
    }

    pub fn get(&self, id: &TaskId) -> Result<Option<fleet_core::Task>, StoreError> {
        self.store.get_task(id)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Stops accepting new dequeues; wakes every blocked worker so they can
    /// observe the shutdown and exit their loop.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

#[cfg(test)]
#[path = "task_queue_tests.rs"]
mod tests;
