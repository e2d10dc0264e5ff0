// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The grouping key table of spec.md §4.1, reproduced exactly: one variant
//! per `(strategy, orchestrator-in-use)` combination the table enumerates.

use fleet_core::{BatchGroupingStrategy, GroupId, InstanceId, ServerId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    ByGroupWithServer(ServerId, String, GroupId),
    ByGroupOrchestrated(String, GroupId),
    ByServer(ServerId, String),
    ByServerOrchestrated(String),
    ByInstanceName(ServerId, String, String),
    ByInstanceNameOrchestrated(String, String),
    Instance(InstanceId),
}

impl GroupKey {
    pub fn resolve(
        strategy: BatchGroupingStrategy,
        uses_orchestrator: bool,
        server_id: ServerId,
        playbook_path: &str,
        group_id: Option<GroupId>,
        base_name: &str,
        instance_id: InstanceId,
    ) -> Self {
        match strategy {
            BatchGroupingStrategy::NoGrouping => GroupKey::Instance(instance_id),
            BatchGroupingStrategy::ByGroup => {
                // Instances with no group at all still use `by_group`
                // keying (spec.md §4.1: "or `by_group` if no group"); they
                // share one sentinel group id so ungrouped instances on the
                // same server/playbook still fold into one plan item.
                let group_id = group_id.unwrap_or_else(|| GroupId::from_string("grp-ungrouped"));
                if uses_orchestrator {
                    GroupKey::ByGroupOrchestrated(playbook_path.to_string(), group_id)
                } else {
                    GroupKey::ByGroupWithServer(server_id, playbook_path.to_string(), group_id)
                }
            }
            BatchGroupingStrategy::ByServer => {
                if uses_orchestrator {
                    GroupKey::ByServerOrchestrated(playbook_path.to_string())
                } else {
                    GroupKey::ByServer(server_id, playbook_path.to_string())
                }
            }
            BatchGroupingStrategy::ByInstanceName => {
                if uses_orchestrator {
                    GroupKey::ByInstanceNameOrchestrated(playbook_path.to_string(), base_name.to_string())
                } else {
                    GroupKey::ByInstanceName(server_id, playbook_path.to_string(), base_name.to_string())
                }
            }
        }
    }
}
