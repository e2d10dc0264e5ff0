// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A rollout cohort carrying default playbook path and batching strategy.

use serde::{Deserialize, Serialize};

use crate::id::{CatalogId, GroupId};

/// How instances sharing a group are folded into task plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchGroupingStrategy {
    ByGroup,
    ByServer,
    ByInstanceName,
    NoGrouping,
}

crate::simple_display! {
    BatchGroupingStrategy {
        ByGroup => "by_group",
        ByServer => "by_server",
        ByInstanceName => "by_instance_name",
        NoGrouping => "no_grouping",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub catalog_id: Option<CatalogId>,
    pub artifact_list_url: Option<String>,
    pub artifact_extension: Option<String>,
    pub update_playbook_path: Option<String>,
    pub batch_grouping_strategy: BatchGroupingStrategy,
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct GroupBuilder => Group {
        set { id: GroupId = GroupId::new() }
        into { name: String = "rollout" }
        option { catalog_id: CatalogId = None }
        option { artifact_list_url: String = None }
        option { artifact_extension: String = None }
        option { update_playbook_path: String = None }
        set { batch_grouping_strategy: BatchGroupingStrategy = BatchGroupingStrategy::ByGroup }
    }
}
