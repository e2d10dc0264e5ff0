// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-engine: the worker pool that drives queued tasks to completion
//! through a [`fleet_adapters::PlaybookAdapter`], plus the bits it leans
//! on — live progress, cancellation, version-history recording, and
//! Ansible output parsing.

pub mod cancel_registry;
pub mod error;
pub mod executor;
pub mod progress;
pub mod recap;
pub mod update_task_context;
pub mod version_ledger;

pub use cancel_registry::CancelRegistry;
pub use error::ExecuteError;
pub use executor::{Executor, ExecutorConfig, DEFAULT_RESULT_BUFFER_BYTES};
pub use progress::{BoundedRing, ProgressBus, ProgressEntry};
pub use recap::{parse_display_summaries, parse_play_recap, DisplaySummary, PlayRecapEntry};
pub use update_task_context::UpdateTaskContext;
pub use version_ledger::VersionLedger;
