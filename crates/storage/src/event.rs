// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only log of facts the materialized state is derived from.
//!
//! Mirrors the teacher's event-sourcing approach: events are facts about
//! what happened, state is derived by folding them in order.

use serde::{Deserialize, Serialize};

use fleet_core::{
    CatalogEntry, Group, Instance, Server, Task, TaskStatus, VersionFields, VersionHistoryEntry,
};
use fleet_core::{InstanceId, TaskId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StorageEvent {
    InstanceSeeded(Box<Instance>),
    InstanceVersionUpdated {
        id: InstanceId,
        fields: VersionFields,
    },
    ServerSeeded(Box<Server>),
    GroupSeeded(Box<Group>),
    CatalogSeeded(Box<CatalogEntry>),
    TaskEnqueued(Box<Task>),
    TaskStarted {
        id: TaskId,
        started_at: u64,
    },
    TaskPidAssigned {
        id: TaskId,
        pid: Option<u32>,
    },
    TaskFinished {
        id: TaskId,
        status: TaskStatus,
        result: Option<String>,
        error: Option<String>,
        completed_at: u64,
    },
    TaskCancelled {
        id: TaskId,
        error: String,
    },
    /// A cancel request against a `Processing` task: flags it so the
    /// worker loop finalizes it as `Failed` once the signalled process
    /// exits, without changing its status up front.
    TaskCancelRequested {
        id: TaskId,
    },
    VersionHistoryRecorded(Box<VersionHistoryEntry>),
}
