// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker pool (spec.md §4.3): `W` tokio tasks each dequeue a task,
//! drive it through a `PlaybookAdapter`, and persist the outcome. Steps 1-8
//! are implemented in [`Executor::run_task`] in the order spec.md lists them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use serde_json::json;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use fleet_adapters::{PlaybookAdapter, PlaybookInvocation, PlaybookProcess};
use fleet_core::{Action, AppType, ChangedBy, Clock, Mode, Task, TaskParams, TaskStatus, VersionFields};
use fleet_storage::{Store, TaskQueue};

use crate::cancel_registry::CancelRegistry;
use crate::error::ExecuteError;
use crate::progress::ProgressBus;
use crate::update_task_context::UpdateTaskContext;
use crate::version_ledger::VersionLedger;

/// Caps the accumulated `result` buffer so a runaway playbook can't grow
/// memory unbounded (spec.md §4.3 says "caps bound memory" without a
/// number; this sets it at 1 MiB).
pub const DEFAULT_RESULT_BUFFER_BYTES: usize = 1024 * 1024;
const TRUNCATION_MARKER: &str = "... [truncated]";

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub worker_pool_size: usize,
    pub result_buffer_bytes: usize,
    pub subprocess_kill_grace: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 4,
            result_buffer_bytes: DEFAULT_RESULT_BUFFER_BYTES,
            subprocess_kill_grace: Duration::from_secs(30),
        }
    }
}

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
fn task_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^TASK \[(.+?)\]").expect("constant regex pattern is valid"))
}

fn append_capped(buffer: &mut String, line: &str, cap: usize) {
    if buffer.len() >= cap {
        return;
    }
    if !buffer.is_empty() {
        buffer.push('\n');
    }
    buffer.push_str(line);
    if buffer.len() > cap {
        buffer.truncate(cap.saturating_sub(TRUNCATION_MARKER.len()));
        buffer.push_str(TRUNCATION_MARKER);
    }
}

pub struct Executor<S: Store, A: PlaybookAdapter, C: Clock> {
    store: Arc<S>,
    adapter: Arc<A>,
    queue: Arc<TaskQueue<S>>,
    cancel_registry: Arc<CancelRegistry>,
    progress: Arc<ProgressBus>,
    clock: C,
    config: ExecutorConfig,
    stopping: AtomicBool,
}

impl<S: Store + 'static, A: PlaybookAdapter + 'static, C: Clock + 'static> Executor<S, A, C> {
    pub fn new(
        store: Arc<S>,
        adapter: Arc<A>,
        queue: Arc<TaskQueue<S>>,
        progress: Arc<ProgressBus>,
        clock: C,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            store,
            adapter,
            queue,
            cancel_registry: Arc::new(CancelRegistry::new()),
            progress,
            clock,
            config,
            stopping: AtomicBool::new(false),
        }
    }

    pub fn cancel_registry(&self) -> &Arc<CancelRegistry> {
        &self.cancel_registry
    }

    /// Spawns `worker_pool_size` workers. Each runs until `TaskQueue::dequeue`
    /// returns `None` (shutdown).
    pub fn spawn_workers(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        (0..self.config.worker_pool_size)
            .map(|idx| {
                let this = Arc::clone(self);
                tokio::spawn(async move { this.worker_loop(idx).await })
            })
            .collect()
    }

    async fn worker_loop(&self, worker: usize) {
        while !self.stopping.load(Ordering::SeqCst) {
            let Some(task) = self.queue.dequeue(|| self.clock.epoch_ms()).await else {
                break;
            };
            info!(worker, task_id = %task.id, "dequeued task");
            self.run_task(task).await;
        }
    }

    /// Signals cancellation to a registered, in-flight process. The task's
    /// `cancelled` flag must already be set by `TaskQueue::request_cancel`
    /// before calling this — `run_task` checks it after the process exits.
    pub async fn cancel(&self, task_id: &fleet_core::TaskId) -> bool {
        if !self.cancel_registry.terminate(task_id).await {
            return false;
        }
        let registry = Arc::clone(&self.cancel_registry);
        let task_id = *task_id;
        let grace = self.config.subprocess_kill_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if registry.is_registered(&task_id) {
                registry.kill(&task_id).await;
            }
        });
        true
    }

    async fn run_task(&self, task: Task) {
        let now = self.clock.epoch_ms();

        if task.cancelled {
            let _ = self
                .queue
                .finish(&task.id, TaskStatus::Failed, None, Some("cancelled".into()), now);
            return;
        }

        let invocation = match self.build_invocation(&task) {
            Ok(inv) => inv,
            Err(err) => {
                warn!(task_id = %task.id, error = %err, "failed to build playbook invocation");
                let _ = self.queue.finish(
                    &task.id,
                    TaskStatus::Failed,
                    None,
                    Some(err.to_string()),
                    self.clock.epoch_ms(),
                );
                return;
            }
        };

        let process = match self.adapter.spawn(invocation).await {
            Ok(process) => process,
            Err(err) => {
                let _ = self.queue.finish(
                    &task.id,
                    TaskStatus::Failed,
                    None,
                    Some(err.to_string()),
                    self.clock.epoch_ms(),
                );
                return;
            }
        };

        let pid = process.pid();
        let _ = self.store.assign_pid(&task.id, pid);
        self.progress.start(task.id);
        let handle = self.cancel_registry.register(task.id, process);

        let timeout_secs = task.params.timeout_seconds();
        let (result, exit_code, timed_out) = self.drive_process(task.id, &handle, timeout_secs).await;

        self.cancel_registry.unregister(&task.id);
        self.progress.finish(task.id, self.clock.epoch_ms());

        let latest = self.store.get_task(&task.id).ok().flatten().unwrap_or(task);

        let (status, error) = if timed_out {
            (TaskStatus::Failed, Some("timed out".to_string()))
        } else if latest.cancelled {
            (TaskStatus::Failed, Some("cancelled".to_string()))
        } else {
            match exit_code {
                Some(0) => (TaskStatus::Completed, None),
                Some(code) => (
                    TaskStatus::Failed,
                    Some(format!("ansible-playbook exited with status {code}")),
                ),
                None => (TaskStatus::Failed, Some("process produced no exit status".to_string())),
            }
        };

        if status == TaskStatus::Completed {
            self.record_version_changes(&latest);
        }

        let _ = self
            .queue
            .finish(&latest.id, status, Some(result), error, self.clock.epoch_ms());
    }

    /// Streams output into the progress bus and the capped result buffer,
    /// racing the whole thing against the task's timeout if one is set.
    /// Returns `(result, exit_code, timed_out)`.
    async fn drive_process(
        &self,
        task_id: fleet_core::TaskId,
        handle: &Arc<AsyncMutex<Box<dyn PlaybookProcess>>>,
        timeout_secs: Option<u64>,
    ) -> (String, Option<i32>, bool) {
        let drain = self.drain_and_wait(task_id, handle);

        let Some(timeout_secs) = timeout_secs else {
            let (result, code) = drain.await;
            return (result, Some(code), false);
        };

        match tokio::time::timeout(Duration::from_secs(timeout_secs), drain).await {
            Ok((result, code)) => (result, Some(code), false),
            Err(_) => {
                {
                    let process = handle.lock().await;
                    let _ = process.terminate();
                }
                let grace = self.config.subprocess_kill_grace;
                let post_signal = {
                    let handle = Arc::clone(handle);
                    async move {
                        let mut process = handle.lock().await;
                        process.wait().await
                    }
                };
                match tokio::time::timeout(grace, post_signal).await {
                    Ok(Ok(code)) => (String::new(), Some(code), true),
                    _ => {
                        let process = handle.lock().await;
                        let _ = process.kill();
                        (String::new(), None, true)
                    }
                }
            }
        }
    }

    async fn drain_and_wait(
        &self,
        task_id: fleet_core::TaskId,
        handle: &Arc<AsyncMutex<Box<dyn PlaybookProcess>>>,
    ) -> (String, i32) {
        let mut result = String::new();
        loop {
            let line = {
                let mut process = handle.lock().await;
                process.next_line().await
            };
            let Some(line) = line else { break };

            append_capped(&mut result, &line, self.config.result_buffer_bytes);
            self.progress.push_line(task_id, line.clone());
            if let Some(caps) = task_header_re().captures(&line) {
                if let Some(name) = caps.get(1) {
                    self.progress.set_current_task(task_id, name.as_str().to_string());
                }
            }
        }

        let code = {
            let mut process = handle.lock().await;
            process.wait().await.unwrap_or(-1)
        };
        (result, code)
    }

    fn build_invocation(&self, task: &Task) -> Result<PlaybookInvocation, ExecuteError> {
        let playbook_path = task.params.playbook_path().to_string();
        if playbook_path.is_empty() {
            return Err(ExecuteError::NoPlaybookResolved);
        }

        let server = match task.server_id {
            Some(id) => self.store.get_server(&id)?,
            None => None,
        };
        let inventory = server.as_ref().map(|s| s.host.clone()).unwrap_or_else(|| "localhost,".into());

        let vars = match &task.params {
            TaskParams::Update {
                distr_url,
                mode,
                drain_wait_time,
                orchestrator_playbook,
                ..
            } => {
                let instances = self.store.get_instances(task.params.app_ids())?;
                let ctx = UpdateTaskContext::load(task.clone(), instances, server)?;
                let mut vars = json!({
                    "app_ids": task.params.app_ids(),
                    "distr_url": distr_url,
                    "mode": mode,
                    "drain_wait_time": drain_wait_time,
                });
                if ctx.wants_orchestrator() {
                    vars["orchestrator_playbook"] = json!(orchestrator_playbook);
                }
                vars
            }
            TaskParams::Action { app_ids, action, .. } => json!({
                "app_ids": app_ids,
                "action": action_name(*action),
            }),
        };

        Ok(PlaybookInvocation::new(playbook_path, inventory, vars))
    }

    /// Step 7: for each instance in the batch, derive a best-effort new
    /// version and record it if it changed. Recap parsing is a read-path
    /// concern (spec.md §4.3) and has no part here — every instance in a
    /// completed batch is considered, not just the ones a parsed recap
    /// happens to name.
    fn record_version_changes(&self, task: &Task) {
        if task.task_type() != fleet_core::TaskType::Update {
            return;
        }
        let TaskParams::Update { distr_url, .. } = &task.params else {
            return;
        };
        let ledger = VersionLedger::new(self.store.as_ref());
        let now = self.clock.epoch_ms();

        let Ok(instances) = self.store.get_instances(task.params.app_ids()) else {
            return;
        };

        for instance in instances {
            let old = VersionFields {
                version: instance.version.clone(),
                distr_path: instance.distr_path.clone(),
                tag: instance.tag.clone(),
                image: instance.image.clone(),
            };
            let new = derive_new_version(instance.app_type, distr_url, &old);
            if new.differs_from(&old) {
                let _ = self.store.update_instance_version(&instance.id, new.clone());
                ledger.record(instance.id, old, new, ChangedBy::User, "update_task", Some(task.id), now);
            }
        }
    }
}

fn action_name(action: Action) -> &'static str {
    match action {
        Action::Start => "start",
        Action::Stop => "stop",
        Action::Restart => "restart",
    }
}

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
fn version_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+\.\d+(?:\.\d+)?)").expect("constant regex pattern is valid"))
}

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
fn image_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<image>.+):(?P<tag>[^:/]+)$").expect("constant regex pattern is valid"))
}

/// Best-effort new version: regex-extracts a version-looking suffix from
/// `distr_url`, or an `image:tag` pair for docker instances.
fn derive_new_version(app_type: AppType, distr_url: &str, old: &VersionFields) -> VersionFields {
    if app_type == AppType::Docker {
        if let Some(caps) = image_tag_re().captures(distr_url) {
            return VersionFields {
                image: caps.name("image").map(|m| m.as_str().to_string()),
                tag: caps.name("tag").map(|m| m.as_str().to_string()),
                ..old.clone()
            };
        }
        return old.clone();
    }

    match version_suffix_re().captures(distr_url) {
        Some(caps) => VersionFields {
            version: caps.get(1).map(|m| m.as_str().to_string()),
            ..old.clone()
        },
        None => old.clone(),
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
