// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracks the live subprocess handle for each in-flight task, so
//! `Executor::cancel` can signal a process it doesn't otherwise have a
//! reference to (spec.md §4.3's cancel/timeout paths). Grounded on the
//! teacher's coop reaper-task handle table.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use fleet_adapters::PlaybookProcess;
use fleet_core::TaskId;

type ProcessHandle = Arc<AsyncMutex<Box<dyn PlaybookProcess>>>;

#[derive(Debug, Default)]
pub struct CancelRegistry {
    handles: Mutex<HashMap<TaskId, ProcessHandle>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, task_id: TaskId, process: Box<dyn PlaybookProcess>) -> ProcessHandle {
        let handle: ProcessHandle = Arc::new(AsyncMutex::new(process));
        self.handles.lock().insert(task_id, handle.clone());
        handle
    }

    pub fn unregister(&self, task_id: &TaskId) {
        self.handles.lock().remove(task_id);
    }

    /// Sends SIGTERM to the task's process, if it's still registered.
    /// Returns `false` if there is nothing to cancel (already finished).
    pub async fn terminate(&self, task_id: &TaskId) -> bool {
        let Some(handle) = self.handles.lock().get(task_id).cloned() else {
            return false;
        };
        let process = handle.lock().await;
        process.terminate().is_ok()
    }

    /// Sends SIGKILL to the task's process, if it's still registered.
    pub async fn kill(&self, task_id: &TaskId) -> bool {
        let Some(handle) = self.handles.lock().get(task_id).cloned() else {
            return false;
        };
        let process = handle.lock().await;
        process.kill().is_ok()
    }

    pub fn is_registered(&self, task_id: &TaskId) -> bool {
        self.handles.lock().contains_key(task_id)
    }
}

#[cfg(test)]
#[path = "cancel_registry_tests.rs"]
mod tests;
