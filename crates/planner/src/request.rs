// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use fleet_core::{InstanceId, Mode, ServerId};

/// Input to [`crate::plan::plan`]: the requested instances plus the common
/// parameters shared by the whole batch (spec.md §4.1).
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub app_ids: Vec<InstanceId>,
    pub mode: Mode,
    pub orchestrator_playbook: Option<String>,
    pub drain_wait_time: Option<u64>,
}

impl PlanRequest {
    /// An orchestrator playbook is "in use" when set to something other
    /// than the sentinel `"none"` (spec.md §4.1 grouping-key table).
    pub fn uses_orchestrator(&self) -> bool {
        matches!(&self.orchestrator_playbook, Some(p) if p != "none")
    }
}

/// One resolved task-to-be: a set of instances sharing a grouping key,
/// plus the playbook path and anchor server resolved for that key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    pub instance_ids: Vec<InstanceId>,
    pub playbook_path: String,
    pub server_id: Option<ServerId>,
    /// Comma-joined instance names, a plan-time convenience for the
    /// Coordinator to log with (spec.md §9's per-group, not per-instance,
    /// logging choice — see DESIGN.md).
    pub app_name: String,
}
