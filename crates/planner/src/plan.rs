// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The GroupingPlanner (spec.md §4.1): a pure function from requested
//! instance IDs + common parameters to a list of task plans.

use std::collections::HashMap;

use indexmap::IndexMap;

use fleet_core::{AppType, CatalogEntry, CatalogId, Group, GroupId, Instance, InstanceId, Mode, ServerId};

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::key::GroupKey;
use crate::request::{PlanItem, PlanRequest};

struct GroupAccumulator {
    server_id: ServerId,
    playbook_path: String,
    instance_ids: Vec<InstanceId>,
    names: Vec<String>,
}

fn resolve_playbook_path(
    instance: &Instance,
    group: Option<&Group>,
    catalog: Option<&CatalogEntry>,
    config: &PlannerConfig,
    mode: Mode,
) -> String {
    if mode == Mode::NightRestart {
        return config.night_restart_playbook.clone();
    }
    if let Some(path) = &instance.custom_playbook_path {
        if !path.is_empty() {
            return path.clone();
        }
    }
    if let Some(group) = group {
        if let Some(path) = &group.update_playbook_path {
            if !path.is_empty() {
                return path.clone();
            }
        }
    }
    if let Some(catalog) = catalog {
        if let Some(path) = &catalog.default_playbook_path {
            if !path.is_empty() {
                return path.clone();
            }
        }
    }
    config.default_update_playbook.clone()
}

/// Validates and resolves every requested instance, then folds matching
/// instances into plan items by their strategy's grouping key.
pub fn plan(
    instances: &HashMap<InstanceId, Instance>,
    groups: &HashMap<GroupId, Group>,
    catalogs: &HashMap<CatalogId, CatalogEntry>,
    config: &PlannerConfig,
    request: &PlanRequest,
) -> Result<Vec<PlanItem>, PlannerError> {
    // Resolve every requested ID before validating anything else, matching
    // the original's two-step precedence: a full existence check over all
    // `app_ids` first, night-restart/docker validation only afterward.
    let mut resolved_instances = Vec::with_capacity(request.app_ids.len());
    for id in &request.app_ids {
        let instance = instances.get(id).ok_or(PlannerError::NotFound(*id))?;
        resolved_instances.push(instance);
    }

    if request.mode == Mode::NightRestart && resolved_instances.iter().any(|i| i.app_type == AppType::Docker) {
        return Err(PlannerError::BadRequest(
            "night-restart is not supported for docker instances".into(),
        ));
    }

    let uses_orchestrator = request.uses_orchestrator();
    let mut by_key: IndexMap<GroupKey, GroupAccumulator> = IndexMap::new();

    for instance in resolved_instances {
        let group = instance.group_id.and_then(|id| groups.get(&id));
        let catalog = instance.catalog_id.and_then(|id| catalogs.get(&id));
        let strategy = group
            .map(|g| g.batch_grouping_strategy)
            .unwrap_or(fleet_core::BatchGroupingStrategy::ByGroup);

        let playbook_path = resolve_playbook_path(instance, group, catalog, config, request.mode);
        let base_name = instance.base_name(catalog);

        let key = GroupKey::resolve(
            strategy,
            uses_orchestrator,
            instance.server_id,
            &playbook_path,
            instance.group_id,
            &base_name,
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
#[path = "plan_tests.rs"]
mod tests;
