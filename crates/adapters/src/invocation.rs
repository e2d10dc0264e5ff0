// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The arguments a [`crate::PlaybookAdapter`] needs to spawn an
//! `ansible-playbook`-shaped process (spec.md §4.3 step 3/4).

/// A fully-resolved playbook invocation, built by `fleet-engine` from a
/// `Task` and its `UpdateTaskContext` before handing off to the adapter.
/// The adapter itself never inspects `vars` — it only serializes it onto
/// the `-e` flag — so the engine owns all ansible-variable shaping.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybookInvocation {
    pub playbook_path: String,
    pub inventory: String,
    pub vars: serde_json::Value,
}

impl PlaybookInvocation {
    pub fn new(
        playbook_path: impl Into<String>,
        inventory: impl Into<String>,
        vars: serde_json::Value,
    ) -> Self {
        Self {
            playbook_path: playbook_path.into(),
            inventory: inventory.into(),
            vars,
        }
    }
}
