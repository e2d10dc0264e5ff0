// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only ledger of observed version transitions.

use serde::{Deserialize, Serialize};

use crate::id::{InstanceId, TaskId, VersionHistoryId};

/// Who (or what) observed and recorded the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedBy {
    User,
    Agent,
    System,
}

crate::simple_display! {
    ChangedBy {
        User => "user",
        Agent => "agent",
        System => "system",
    }
}

/// The fields that may transition on an instance and are worth recording.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFields {
    pub version: Option<String>,
    pub distr_path: Option<String>,
    pub tag: Option<String>,
    pub image: Option<String>,
}

impl VersionFields {
    pub fn differs_from(&self, other: &VersionFields) -> bool {
        self.version != other.version
            || self.distr_path != other.distr_path
            || self.tag != other.tag
            || self.image != other.image
    }
}

/// One append-only row: an instance's observed fields moved from `old` to
/// `new`. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionHistoryEntry {
    pub id: VersionHistoryId,
    pub instance_id: InstanceId,
    pub old: VersionFields,
    pub new: VersionFields,
    pub changed_at: u64,
    pub changed_by: ChangedBy,
    pub change_source: String,
    pub task_id: Option<TaskId>,
    pub notes: Option<String>,
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct VersionHistoryEntryBuilder => VersionHistoryEntry {
        set { id: VersionHistoryId = VersionHistoryId::new() }
        set { instance_id: InstanceId = InstanceId::new() }
        set { old: VersionFields = VersionFields::default() }
        set { new: VersionFields = VersionFields::default() }
        set { changed_at: u64 = 0 }
        set { changed_by: ChangedBy = ChangedBy::System }
        into { change_source: String = "manual" }
        option { task_id: TaskId = None }
        option { notes: String = None }
    }
}

#[cfg(test)]
#[path = "version_history_tests.rs"]
mod tests;
