// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The real [`PlaybookAdapter`]: shells out to `ansible-playbook` via
//! `tokio::process::Command` and exposes its stdout/stderr and lifecycle
//! through [`PlaybookProcess`] (spec.md §4.3 step 4, §6 "Playbook runner
//! contract").

use std::process::Stdio;

use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::error::AdapterError;
use crate::invocation::PlaybookInvocation;

/// Spawns a playbook process. The sole seam between `fleet-engine`'s worker
/// loop and the outside world, so tests substitute `FakeAdapter` here rather
/// than mocking `tokio::process` directly.
#[async_trait]
pub trait PlaybookAdapter: Send + Sync {
    async fn spawn(
        &self,
        invocation: PlaybookInvocation,
    ) -> Result<Box<dyn PlaybookProcess>, AdapterError>;
}

/// A running (or finished) playbook process. Line reads and termination are
/// exposed independently so the worker loop can stream output while a
/// separate cancellation path calls `terminate`/`kill` concurrently.
#[async_trait]
pub trait PlaybookProcess: Send {
    fn pid(&self) -> Option<u32>;

    /// Returns the next line of combined stdout/stderr, or `None` at EOF.
    async fn next_line(&mut self) -> Option<String>;

    /// Waits for the process to exit and returns its status code.
    async fn wait(&mut self) -> Result<i32, AdapterError>;

    /// Sends SIGTERM. Idempotent; a process that already exited is a no-op.
    fn terminate(&self) -> Result<(), AdapterError>;

    /// Sends SIGKILL. Used after `SUBPROCESS_KILL_GRACE_SECONDS` elapses
    /// without the process honoring `terminate`.
    fn kill(&self) -> Result<(), AdapterError>;
}

/// Spawns real `ansible-playbook` subprocesses.
#[derive(Debug, Default)]
pub struct ProcessPlaybookAdapter {
    /// Override for the `ansible-playbook` binary name, mainly for tests
    /// that want a real-but-fast subprocess (e.g. `true`/`false`).
    binary: String,
}

impl ProcessPlaybookAdapter {
    pub fn new() -> Self {
        Self {
            binary: "ansible-playbook".to_string(),
        }
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl PlaybookAdapter for ProcessPlaybookAdapter {
    async fn spawn(
        &self,
        invocation: PlaybookInvocation,
    ) -> Result<Box<dyn PlaybookProcess>, AdapterError> {
        let vars = serde_json::to_string(&invocation.vars).unwrap_or_default();

        let mut child = Command::new(&self.binary)
            .arg(&invocation.playbook_path)
            .arg("-i")
            .arg(&invocation.inventory)
            .arg("-e")
            .arg(vars)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let pid = child.id();
        let stdout = child.stdout.take().ok_or(AdapterError::MissingStdio)?;
        let stderr = child.stderr.take().ok_or(AdapterError::MissingStdio)?;

        Ok(Box::new(RealProcess {
            pid,
            child,
            stdout: BufReader::new(stdout).lines(),
            stderr: BufReader::new(stderr).lines(),
            stdout_done: false,
        }))
    }
}

struct RealProcess {
    pid: Option<u32>,
    child: Child,
    stdout: tokio::io::Lines<BufReader<tokio::process::ChildStdout>>,
    stderr: tokio::io::Lines<BufReader<tokio::process::ChildStderr>>,
    stdout_done: bool,
}

#[async_trait]
impl PlaybookProcess for RealProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    async fn next_line(&mut self) -> Option<String> {
        if !self.stdout_done {
            match self.stdout.next_line().await {
                Ok(Some(line)) => return Some(line),
                Ok(None) => self.stdout_done = true,
                Err(_) => self.stdout_done = true,
            }
        }
        match self.stderr.next_line().await {
            Ok(Some(line)) => Some(line),
            _ => None,
        }
    }

    async fn wait(&mut self) -> Result<i32, AdapterError> {
        let status = self.child.wait().await?;
        Ok(status.code().unwrap_or(-1))
    }

    fn terminate(&self) -> Result<(), AdapterError> {
        send_signal(self.pid, Signal::SIGTERM)
    }

    fn kill(&self) -> Result<(), AdapterError> {
        send_signal(self.pid, Signal::SIGKILL)
    }
}

fn send_signal(pid: Option<u32>, sig: Signal) -> Result<(), AdapterError> {
    let pid = pid.ok_or(AdapterError::NoPid)?;
    match signal::kill(Pid::from_raw(pid as i32), sig) {
        Ok(()) => Ok(()),
        Err(nix::Error::ESRCH) => Ok(()), // already exited
        Err(source) => Err(AdapterError::Signal { pid, source }),
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
