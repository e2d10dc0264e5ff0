// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory live progress for running tasks (spec.md §4.5). Entries are
//! swept `TASK_PROGRESS_RETENTION_SECONDS` after the owning task finishes,
//! so a client polling `GetTask` shortly after completion still sees the
//! final output.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use fleet_core::TaskId;

/// A capped FIFO of output lines; oldest lines are dropped once `capacity`
/// is exceeded so a runaway playbook can't grow memory unbounded.
#[derive(Debug, Clone, Default)]
pub struct BoundedRing {
    lines: VecDeque<String>,
    capacity: usize,
}

impl BoundedRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &String> {
        self.lines.iter()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressEntry {
    pub current_task: String,
    pub buffer: BoundedRing,
    /// Set once the worker calls `finish`; the sweep removes entries whose
    /// `finished_at` is more than the retention window in the past.
    pub finished_at: Option<u64>,
}

const DEFAULT_RING_CAPACITY: usize = 500;

/// Shared live-progress table, one entry per in-flight (or recently
/// finished) task.
#[derive(Debug, Default)]
pub struct ProgressBus {
    entries: Arc<Mutex<HashMap<TaskId, ProgressEntry>>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, task_id: TaskId) {
        self.entries.lock().insert(
            task_id,
            ProgressEntry {
                current_task: String::new(),
                buffer: BoundedRing::new(DEFAULT_RING_CAPACITY),
                finished_at: None,
            },
        );
    }

    pub fn push_line(&self, task_id: TaskId, line: String) {
        if let Some(entry) = self.entries.lock().get_mut(&task_id) {
            entry.buffer.push(line);
        }
    }

    /// Updates `current_task` from a `TASK [name]` header line.
    pub fn set_current_task(&self, task_id: TaskId, name: String) {
        if let Some(entry) = self.entries.lock().get_mut(&task_id) {
            entry.current_task = name;
        }
    }

    pub fn finish(&self, task_id: TaskId, now: u64) {
        if let Some(entry) = self.entries.lock().get_mut(&task_id) {
            entry.finished_at = Some(now);
        }
    }

    pub fn snapshot(&self, task_id: &TaskId) -> Option<ProgressEntry> {
        self.entries.lock().get(task_id).cloned()
    }

    /// Removes every entry that finished more than `retention_secs` ago.
    /// Called periodically by the Coordinator's sweep task.
    pub fn sweep(&self, now: u64, retention_secs: u64) {
        self.entries
            .lock()
            .retain(|_, entry| match entry.finished_at {
                Some(finished_at) => now.saturating_sub(finished_at) < retention_secs,
                None => true,
            });
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
