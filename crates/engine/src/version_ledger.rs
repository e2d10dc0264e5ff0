// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `VersionLedger::record` (spec.md §4.4): writes an append-only history
//! row iff the instance's tracked fields actually changed. The only
//! consumer inside this crate is the Executor's post-success step; the
//! inventory-polling path that also calls this is external to this core
//! (spec.md §1 scope).

use tracing::warn;

use fleet_core::{ChangedBy, InstanceId, TaskId, VersionFields, VersionHistoryEntry, VersionHistoryId};
use fleet_storage::Store;

pub struct VersionLedger<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> VersionLedger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Writes a history row if `new` differs from `old`. Store failures are
    /// logged at `warn` and swallowed: a ledger write failure must never
    /// flip the owning task to `Failed` (spec.md §7).
    pub fn record(
        &self,
        instance_id: InstanceId,
        old: VersionFields,
        new: VersionFields,
        changed_by: ChangedBy,
        change_source: impl Into<String>,
        task_id: Option<TaskId>,
        changed_at: u64,
    ) {
        if !new.differs_from(&old) {
            return;
        }

        let entry = VersionHistoryEntry {
            id: VersionHistoryId::new(),
            instance_id,
            old,
            new,
            changed_at,
            changed_by,
            change_source: change_source.into(),
            task_id,
            notes: None,
        };

        if let Err(err) = self.store.record_version_history(entry) {
            warn!(%instance_id, error = %err, "version ledger write failed");
        }
    }
}

#[cfg(test)]
#[path = "version_ledger_tests.rs"]
mod tests;
