// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seven operations of spec.md §6, as wire requests.

use serde::{Deserialize, Serialize};

use fleet_core::{InstanceId, Mode, ServerId, TaskId, TaskStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    SubmitUpdate {
        app_id: InstanceId,
        distr_url: String,
        mode: Mode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        orchestrator_playbook: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        drain_wait_time: Option<u64>,
    },
    SubmitBatchUpdate {
        app_ids: Vec<InstanceId>,
        distr_url: String,
        mode: Mode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        orchestrator_playbook: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        drain_wait_time: Option<u64>,
    },
    SubmitAction {
        app_id: InstanceId,
        action: fleet_core::Action,
    },
    SubmitBulkAction {
        app_ids: Vec<InstanceId>,
        action: fleet_core::Action,
    },
    ListTasks {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<TaskStatus>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instance_id: Option<InstanceId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        server_id: Option<ServerId>,
    },
    GetTask {
        task_id: TaskId,
    },
    CancelTask {
        task_id: TaskId,
    },
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
