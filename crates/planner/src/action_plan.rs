// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch grouping for start/stop/restart actions. Reuses the same
//! [`GroupKey`] table as [`crate::plan::plan`] (spec.md §4.1's grouping
//! rules apply to any batch, not only updates) but with a flatter playbook
//! resolution: actions have no group/catalog override chain, only a
//! per-instance custom path, since spec.md names the override chain for
//! `DEFAULT_UPDATE_PLAYBOOK` specifically, not for lifecycle actions.

use std::collections::HashMap;

use indexmap::IndexMap;

use fleet_core::{Action, Group, GroupId, Instance, InstanceId, ServerId};

use crate::error::PlannerError;
use crate::key::GroupKey;
use crate::request::PlanItem;

/// Input to [`plan_action`]: the requested instances plus the action and
/// its resolved system-default playbook path.
#[derive(Debug, Clone)]
pub struct ActionPlanRequest {
    pub app_ids: Vec<InstanceId>,
    pub action: Action,
    pub playbook_path: String,
}

struct GroupAccumulator {
    server_id: ServerId,
    playbook_path: String,
    instance_ids: Vec<InstanceId>,
    names: Vec<String>,
}

pub fn plan_action(
    instances: &HashMap<InstanceId, Instance>,
    groups: &HashMap<GroupId, Group>,
    request: &ActionPlanRequest,
) -> Result<Vec<PlanItem>, PlannerError> {
    let mut resolved_instances = Vec::with_capacity(request.app_ids.len());
    for id in &request.app_ids {
        resolved_instances.push(instances.get(id).ok_or(PlannerError::NotFound(*id))?);
    }

    let mut by_key: IndexMap<GroupKey, GroupAccumulator> = IndexMap::new();

    for instance in resolved_instances {
        let group = instance.group_id.and_then(|id| groups.get(&id));
        let strategy = group
            .map(|g| g.batch_grouping_strategy)
            .unwrap_or(fleet_core::BatchGroupingStrategy::ByGroup);

        let playbook_path = instance
            .custom_playbook_path
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| request.playbook_path.clone());

        let key = GroupKey::resolve(
            strategy,
            false,
            instance.server_id,
            &playbook_path,
            instance.group_id,
            &instance.base_name(None),
            instance.id,
        );

        let entry = by_key.entry(key).or_insert_with(|| GroupAccumulator {
            server_id: instance.server_id,
            playbook_path: playbook_path.clone(),
            instance_ids: Vec::new(),
            names: Vec::new(),
        });
        entry.instance_ids.push(instance.id);
        entry.names.push(instance.instance_name.clone());
    }

    Ok(by_key
        .into_values()
        .map(|acc| PlanItem {
            instance_ids: acc.instance_ids,
            playbook_path: acc.playbook_path,
            server_id: Some(acc.server_id),
            app_name: acc.names.join(","),
        })
        .collect())
}

#[cfg(test)]
#[path = "action_plan_tests.rs"]
mod tests;
