// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable unit of work dispatched by the task pipeline.

use serde::{Deserialize, Serialize};

use crate::id::{InstanceId, ServerId, TaskId};

/// What kind of operation a task performs against its instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Update,
    Start,
    Stop,
    Restart,
}

crate::simple_display! {
    TaskType {
        Update => "update",
        Start => "start",
        Stop => "stop",
        Restart => "restart",
    }
}

/// Lifecycle status of a task. Advances monotonically:
/// `Pending -> Processing -> {Completed | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

crate::simple_display! {
    TaskStatus {
        Pending => "pending",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
    }
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// How an update should be carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Immediate,
    Deliver,
    NightRestart,
}

crate::simple_display! {
    Mode {
        Immediate => "immediate",
        Deliver => "deliver",
        NightRestart => "night-restart",
    }
}

/// A lifecycle action for start/stop/restart tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Start,
    Stop,
    Restart,
}

crate::simple_display! {
    Action {
        Start => "start",
        Stop => "stop",
        Restart => "restart",
    }
}

/// The schema-checked task parameter bag, discriminated on `task_type` so
/// the executor can pattern-match instead of string-probing a JSON blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task_type", rename_all = "snake_case")]
pub enum TaskParams {
    Update {
        app_ids: Vec<InstanceId>,
        distr_url: String,
        mode: Mode,
        playbook_path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        orchestrator_playbook: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        drain_wait_time: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_seconds: Option<u64>,
    },
    Action {
        app_ids: Vec<InstanceId>,
        action: Action,
        playbook_path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_seconds: Option<u64>,
    },
}

impl TaskParams {
    pub fn app_ids(&self) -> &[InstanceId] {
        match self {
            TaskParams::Update { app_ids, .. } => app_ids,
            TaskParams::Action { app_ids, .. } => app_ids,
        }
    }

    pub fn playbook_path(&self) -> &str {
        match self {
            TaskParams::Update { playbook_path, .. } => playbook_path,
            TaskParams::Action { playbook_path, .. } => playbook_path,
        }
    }

    pub fn task_type(&self) -> TaskType {
        match self {
            TaskParams::Update { .. } => TaskType::Update,
            TaskParams::Action { action, .. } => match action {
                Action::Start => TaskType::Start,
                Action::Stop => TaskType::Stop,
                Action::Restart => TaskType::Restart,
            },
        }
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        match self {
            TaskParams::Update { timeout_seconds, .. } => *timeout_seconds,
            TaskParams::Action { timeout_seconds, .. } => *timeout_seconds,
        }
    }
}

/// Durable record of one invocation of a playbook against one or more
/// instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub status: TaskStatus,
    pub params: TaskParams,
    pub server_id: Option<ServerId>,
    /// Anchor instance: the first instance of the batch.
    pub instance_id: Option<InstanceId>,
    pub created_at: u64,
    pub started_at: Option<u64>,
    pub completed_at: Option<u64>,
    pub result: Option<String>,
    pub error: Option<String>,
    pub current_step: Option<String>,
    pub pid: Option<u32>,
    pub cancelled: bool,
}

impl Task {
    pub fn new(id: TaskId, params: TaskParams, server_id: Option<ServerId>, anchor: Option<InstanceId>, created_at: u64) -> Self {
        Self {
            id,
            status: TaskStatus::Pending,
            params,
            server_id,
            instance_id: anchor,
            created_at,
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
            current_step: None,
            pid: None,
            cancelled: false,
        }
    }

    pub fn task_type(&self) -> TaskType {
        self.params.task_type()
    }

    /// Whether the task may currently be cancelled: pending and not already
    /// cancelled, or processing with a live pid.
    pub fn can_cancel(&self) -> bool {
        if self.cancelled {
            return false;
        }
        match self.status {
            TaskStatus::Pending => true,
            TaskStatus::Processing => self.pid.is_some(),
            _ => false,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct TaskBuilder => Task {
        set { id: TaskId = TaskId::new() }
        set { status: TaskStatus = TaskStatus::Pending }
        set { params: TaskParams = TaskParams::Action {
            app_ids: Vec::new(),
            action: Action::Start,
            playbook_path: String::new(),
            timeout_seconds: None,
        } }
        option { server_id: ServerId = None }
        option { instance_id: InstanceId = None }
        set { created_at: u64 = 0 }
        option { started_at: u64 = None }
        option { completed_at: u64 = None }
        option { result: String = None }
        option { error: String = None }
        option { current_step: String = None }
        option { pid: u32 = None }
        set { cancelled: bool = false }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
