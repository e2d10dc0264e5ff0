// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared defaults for a logical application, referenced by many instances
//! and groups.

use serde::{Deserialize, Serialize};

use crate::id::CatalogId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: CatalogId,
    pub name: String,
    pub default_playbook_path: Option<String>,
    pub default_artifact_url: Option<String>,
    pub default_artifact_extension: Option<String>,
    /// Opt-in carve-out for the crash-recovery policy (spec.md §9 Open
    /// Question): when true, an `update`/`immediate` task interrupted by a
    /// restart is re-queued to pending instead of failed.
    pub idempotent_update: bool,
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct CatalogEntryBuilder => CatalogEntry {
        set { id: CatalogId = CatalogId::new() }
        into { name: String = "jurws" }
        option { default_playbook_path: String = None }
        option { default_artifact_url: String = None }
        option { default_artifact_extension: String = None }
        set { idempotent_update: bool = false }
    }
}
