// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution-class errors from running a task to completion (spec.md §7).

use thiserror::Error;

use fleet_adapters::AdapterError;
use fleet_storage::StoreError;

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("failed to spawn playbook process: {0}")]
    Spawn(#[from] AdapterError),

    #[error("ansible-playbook exited with status {0}")]
    NonZeroExit(i32),

    #[error("task timed out after {0}s")]
    TimedOut(u64),

    #[error("task was cancelled")]
    Cancelled,

    #[error("no playbook path resolved for task")]
    NoPlaybookResolved,

    #[error("update context invalid: {0}")]
    InvalidContext(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
