// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A scriptable stand-in for [`crate::ProcessPlaybookAdapter`], used by
//! `fleet-engine` and `fleet-daemon` tests to drive cancellation, timeout,
//! and output-parsing scenarios without a real `ansible-playbook` binary.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::AdapterError;
use crate::invocation::PlaybookInvocation;
use crate::process::{PlaybookAdapter, PlaybookProcess};

/// One scripted outcome for a single `spawn` call.
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    pub pid: u32,
    pub lines: Vec<String>,
    pub outcome: RunOutcome,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The process exits with this code once its lines are drained.
    Exit(i32),
    /// The process never exits on its own; it only responds to
    /// `terminate`/`kill`, simulating a long-running playbook under
    /// cancellation or timeout.
    HangUntilSignalled,
}

impl ScriptedRun {
    pub fn completes(pid: u32, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            pid,
            lines: lines.into_iter().map(Into::into).collect(),
            outcome: RunOutcome::Exit(0),
        }
    }

    pub fn fails(pid: u32, code: i32, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            pid,
            lines: lines.into_iter().map(Into::into).collect(),
            outcome: RunOutcome::Exit(code),
        }
    }

    pub fn hangs(pid: u32, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            pid,
            lines: lines.into_iter().map(Into::into).collect(),
            outcome: RunOutcome::HangUntilSignalled,
        }
    }
}

/// Hands out queued [`ScriptedRun`]s in FIFO order, one per `spawn` call.
/// Also records every [`PlaybookInvocation`] it was asked to spawn, for
/// assertions on playbook path / inventory / vars shaping.
#[derive(Default)]
pub struct FakeAdapter {
    queue: Mutex<VecDeque<ScriptedRun>>,
    invocations: Mutex<Vec<PlaybookInvocation>>,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, run: ScriptedRun) {
        self.queue.lock().push_back(run);
    }

    pub fn invocations(&self) -> Vec<PlaybookInvocation> {
        self.invocations.lock().clone()
    }
}

#[async_trait]
impl PlaybookAdapter for FakeAdapter {
    async fn spawn(
        &self,
        invocation: PlaybookInvocation,
    ) -> Result<Box<dyn PlaybookProcess>, AdapterError> {
        self.invocations.lock().push(invocation);
        let run = self
            .queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| ScriptedRun::completes(0, Vec::<String>::new()));

        Ok(Box::new(FakeProcess {
            pid: run.pid,
            lines: run.lines.into(),
            outcome: run.outcome,
            signalled: Arc::new(Notify::new()),
            terminated: Mutex::new(false),
            killed: Mutex::new(false),
        }))
    }
}

struct FakeProcess {
    pid: u32,
    lines: VecDeque<String>,
    outcome: RunOutcome,
    signalled: Arc<Notify>,
    terminated: Mutex<bool>,
    killed: Mutex<bool>,
}

#[async_trait]
impl PlaybookProcess for FakeProcess {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    async fn next_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    async fn wait(&mut self) -> Result<i32, AdapterError> {
        match self.outcome {
            RunOutcome::Exit(code) => Ok(code),
            RunOutcome::HangUntilSignalled => {
                self.signalled.notified().await;
                if *self.killed.lock() {
                    Ok(137) // 128 + SIGKILL
                } else {
                    Ok(143) // 128 + SIGTERM
                }
            }
        }
    }

    fn terminate(&self) -> Result<(), AdapterError> {
        *self.terminated.lock() = true;
        if matches!(self.outcome, RunOutcome::HangUntilSignalled) {
            self.signalled.notify_waiters();
        }
        Ok(())
    }

    fn kill(&self) -> Result<(), AdapterError> {
        *self.killed.lock() = true;
        if matches!(self.outcome, RunOutcome::HangUntilSignalled) {
            self.signalled.notify_waiters();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
