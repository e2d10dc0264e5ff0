// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use fleet_core::{InstanceId, ServerId, TaskStatus};

/// Filter for `ListTasks` (spec.md §6): any combination of status,
/// instance, and server.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub instance_id: Option<InstanceId>,
    pub server_id: Option<ServerId>,
}
