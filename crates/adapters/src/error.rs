// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution-class errors from spawning and driving a playbook process
//! (spec.md §7's `ExecuteError` family, the subset owned by this crate).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to spawn playbook process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("failed to signal process {pid}: {source}")]
    Signal { pid: u32, source: nix::Error },

    #[error("process produced no pid before exiting")]
    NoPid,

    #[error("spawned process is missing a piped stdio handle")]
    MissingStdio,
}
