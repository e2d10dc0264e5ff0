// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transient-class errors from the persistence layer (spec.md §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt WAL entry at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("store busy, retried {attempts} times")]
    Busy { attempts: u32 },

    #[error("serialization failure: {0}")]
    Serde(#[from] serde_json::Error),
}
