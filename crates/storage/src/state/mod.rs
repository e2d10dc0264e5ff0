// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state, folded from the WAL's [`StorageEvent`] log.

mod types;

pub use types::TaskFilter;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use fleet_core::{
    CatalogEntry, CatalogId, Group, GroupId, Instance, InstanceId, Server, ServerId, Task,
    TaskId, TaskStatus, VersionHistoryEntry,
};

use crate::event::StorageEvent;

/// In-memory projection of every event applied so far.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub tasks: HashMap<TaskId, Task>,
    pub instances: HashMap<InstanceId, Instance>,
    pub servers: HashMap<ServerId, Server>,
    pub groups: HashMap<GroupId, Group>,
    pub catalogs: HashMap<CatalogId, CatalogEntry>,
    pub version_history: Vec<VersionHistoryEntry>,
}

impl MaterializedState {
    /// Apply one fact to the projection. Idempotent only insofar as the WAL
    /// itself is append-only and never replayed twice outside recovery.
    pub fn apply(&mut self, event: &StorageEvent) {
        match event {
            StorageEvent::InstanceSeeded(instance) => {
                self.instances.insert(instance.id, (**instance).clone());
            }
            StorageEvent::InstanceVersionUpdated { id, fields } => {
                if let Some(instance) = self.instances.get_mut(id) {
                    if fields.version.is_some() {
                        instance.version = fields.version.clone();
                    }
                    if fields.image.is_some() {
                        instance.image = fields.image.clone();
                    }
                    if fields.tag.is_some() {
                        instance.tag = fields.tag.clone();
                    }
                    if fields.distr_path.is_some() {
                        instance.distr_path = fields.distr_path.clone();
                    }
                }
            }
            StorageEvent::ServerSeeded(server) => {
                self.servers.insert(server.id, (**server).clone());
            }
            StorageEvent::GroupSeeded(group) => {
                self.groups.insert(group.id, (**group).clone());
            }
            StorageEvent::CatalogSeeded(catalog) => {
                self.catalogs.insert(catalog.id, (**catalog).clone());
            }
            StorageEvent::TaskEnqueued(task) => {
                self.tasks.insert(task.id, (**task).clone());
            }
            StorageEvent::TaskStarted { id, started_at } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.status = TaskStatus::Processing;
                    task.started_at = Some(*started_at);
                }
            }
            StorageEvent::TaskPidAssigned { id, pid } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.pid = *pid;
                }
            }
            StorageEvent::TaskFinished {
                id,
                status,
                result,
                error,
                completed_at,
            } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.status = *status;
                    task.result = result.clone();
                    task.error = error.clone();
                    task.completed_at = Some(*completed_at);
                    task.pid = None;
                }
            }
            StorageEvent::TaskCancelled { id, error } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.cancelled = true;
                    task.status = TaskStatus::Failed;
                    task.error = Some(error.clone());
                }
            }
            StorageEvent::TaskCancelRequested { id } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.cancelled = true;
                }
            }
            StorageEvent::VersionHistoryRecorded(entry) => {
                self.version_history.push((**entry).clone());
            }
        }
    }

    pub fn matches(task: &Task, filter: &TaskFilter) -> bool {
        if let Some(status) = filter.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(instance_id) = &filter.instance_id {
            if task.instance_id.as_ref() != Some(instance_id)
                && !task.params.app_ids().contains(instance_id)
            {
                return false;
            }
        }
        if let Some(server_id) = &filter.server_id {
            if task.server_id.as_ref() != Some(server_id) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
