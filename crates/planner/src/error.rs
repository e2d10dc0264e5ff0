// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation-class errors, surfaced synchronously at submission time
//! (spec.md §7). The planner performs no Store mutations, so every error
//! here means nothing was persisted.

use thiserror::Error;

use fleet_core::InstanceId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlannerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("instance not found: {0}")]
    NotFound(InstanceId),
}
