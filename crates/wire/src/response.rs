// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use fleet_core::{Task, TaskId};

/// One host's row from a `PLAY RECAP` block, mirrored here rather than
/// imported from `fleet-engine` so the wire protocol stays a leaf
/// dependency of both the daemon and the CLI. `fleet-daemon` converts from
/// `fleet_engine::recap::PlayRecapEntry` when it builds a `GetTask` reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayRecapSummary {
    pub host: String,
    pub ok: u32,
    pub changed: u32,
    pub unreachable: u32,
    pub failed: u32,
    pub skipped: u32,
    pub rescued: u32,
    pub ignored: u32,
}

/// One deduplicated `TASK [...summary...]` message, mirrored from
/// `fleet_engine::recap::DisplaySummary` for the same reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplaySummary {
    pub task_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    /// A submission was accepted; the caller polls `GetTask`/`ListTasks`
    /// for progress.
    Submitted { task_ids: Vec<TaskId> },
    Task(Box<Task>),
    /// `GetTask`'s reply: the task plus, once `result` is populated, its
    /// parsed recap. Empty vectors before the task has produced output.
    TaskDetail {
        task: Box<Task>,
        play_recap: Vec<PlayRecapSummary>,
        display_summaries: Vec<DisplaySummary>,
    },
    TaskList(Vec<Task>),
    Cancelled { task_id: TaskId },
    Error { message: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
