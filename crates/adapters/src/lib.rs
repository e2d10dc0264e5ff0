// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-adapters: the seam between the task pipeline and the external
//! `ansible-playbook`-shaped process it invokes (spec.md §6 "Playbook
//! runner contract"). [`ProcessPlaybookAdapter`] is the real
//! implementation; [`FakeAdapter`] (feature `test-support`) is a
//! scriptable stand-in used throughout the rest of the workspace's tests.

pub mod error;
pub mod invocation;
pub mod process;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use error::AdapterError;
pub use invocation::PlaybookInvocation;
pub use process::{PlaybookAdapter, PlaybookProcess, ProcessPlaybookAdapter};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAdapter, ScriptedRun};
