// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Construction-time view over an update `Task` and the instances/server it
//! targets (spec.md §4.3.1), grounded on the original's
//! `UpdateTaskContextProvider`. Never mutated after construction.

use fleet_core::{AppType, Instance, Mode, Server, Task, TaskParams};

use crate::error::ExecuteError;

pub struct UpdateTaskContext {
    pub task: Task,
    pub instances: Vec<Instance>,
    pub server: Option<Server>,
    pub app_name: String,
    pub app_type: AppType,
    pub is_batch: bool,
    pub distr_url: String,
    pub playbook_path: String,
    pub orchestrator_playbook: Option<String>,
    pub mode: Mode,
}

impl UpdateTaskContext {
    /// Fails with `InvalidContext` when `instances` is empty or the task's
    /// params are missing `distr_url`/`playbook_path` — mirrors the
    /// original's `ValueError`s raised at the same seam.
    pub fn load(task: Task, instances: Vec<Instance>, server: Option<Server>) -> Result<Self, ExecuteError> {
        let TaskParams::Update {
            distr_url,
            playbook_path,
            orchestrator_playbook,
            mode,
            ..
        } = &task.params
        else {
            return Err(ExecuteError::InvalidContext(
                "UpdateTaskContext requires an Update task".into(),
            ));
        };

        if distr_url.is_empty() {
            return Err(ExecuteError::InvalidContext("distr_url is required".into()));
        }
        if playbook_path.is_empty() {
            return Err(ExecuteError::InvalidContext("playbook_path is required".into()));
        }
        let first = instances
            .first()
            .ok_or_else(|| ExecuteError::InvalidContext("no instances in batch".into()))?;

        let app_name = instances
            .iter()
            .map(|i| i.instance_name.clone())
            .collect::<Vec<_>>()
            .join(",");

        Ok(Self {
            app_name,
            app_type: first.app_type,
            is_batch: instances.len() > 1,
            distr_url: distr_url.clone(),
            playbook_path: playbook_path.clone(),
            orchestrator_playbook: orchestrator_playbook.clone(),
            mode: *mode,
            instances,
            server,
            task,
        })
    }

    /// Whether the spawned process should receive orchestrator-specific
    /// variables: the original's `should_use_orchestrator` predicate.
    pub fn wants_orchestrator(&self) -> bool {
        self.mode == Mode::Immediate
            && self.is_batch
            && self
                .orchestrator_playbook
                .as_deref()
                .is_some_and(|p| p != "none")
    }
}

#[cfg(test)]
#[path = "update_task_context_tests.rs"]
mod tests;
