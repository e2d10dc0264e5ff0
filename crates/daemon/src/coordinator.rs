// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owns the task pipeline end to end: turns a wire request into a plan
//! (via `fleet-planner`), persists and queues the resulting tasks, and
//! answers reads by combining the `Store` with the `Executor`'s live
//! progress and Ansible output parsing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use fleet_adapters::PlaybookAdapter;
use fleet_core::{Action, Clock, Instance, InstanceId, Mode, Task, TaskId, TaskParams, TaskStatus};
use fleet_engine::{parse_display_summaries, parse_play_recap, Executor, ExecutorConfig, ProgressBus};
use fleet_planner::{plan, plan_action, ActionPlanRequest, PlanRequest, PlannerConfig};
use fleet_storage::{CancelOutcome, NewTaskRequest, Store, TaskFilter, TaskQueue};
use fleet_wire::{DisplaySummary, PlayRecapSummary};

use crate::config::Config;
use crate::error::CoordinatorError;

/// `GetTask`'s answer: the task record plus its Ansible output parsed on
/// read, never in the worker hot loop.
pub struct TaskDetail {
    pub task: Task,
    pub play_recap: Vec<PlayRecapSummary>,
    pub display_summaries: Vec<DisplaySummary>,
}

/// How often the progress sweep runs, independent of the retention window
/// itself (spec.md §4.5 names the retention; the sweep cadence is ours).
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

pub struct Coordinator<S: Store + 'static, A: PlaybookAdapter + 'static, C: Clock + 'static> {
    store: Arc<S>,
    queue: Arc<TaskQueue<S>>,
    executor: Arc<Executor<S, A, C>>,
    progress: Arc<ProgressBus>,
    clock: C,
    planner_config: PlannerConfig,
    action_playbook: String,
    progress_retention_secs: u64,
}

impl<S: Store + 'static, A: PlaybookAdapter + 'static, C: Clock + 'static> Coordinator<S, A, C> {
    pub fn new(store: Arc<S>, queue: Arc<TaskQueue<S>>, adapter: Arc<A>, clock: C, config: &Config) -> Arc<Self> {
        let progress = Arc::new(ProgressBus::new());
        let executor_config = ExecutorConfig {
            worker_pool_size: config.worker_pool_size,
            result_buffer_bytes: fleet_engine::DEFAULT_RESULT_BUFFER_BYTES,
            subprocess_kill_grace: config.subprocess_kill_grace,
        };
        let executor = Arc::new(Executor::new(
            Arc::clone(&store),
            adapter,
            Arc::clone(&queue),
            Arc::clone(&progress),
            clock.clone(),
            executor_config,
        ));

        Arc::new(Self {
            store,
            queue,
            executor,
            progress,
            clock,
            planner_config: config.planner_config(),
            action_playbook: config.action_playbook.clone(),
            progress_retention_secs: config.task_progress_retention.as_secs(),
        })
    }

    /// Spawns the worker pool plus the periodic progress sweep. Worker
    /// handles finish on their own once `shutdown` wakes them with an
    /// empty queue; the sweep loop runs forever and must be `abort`ed by
    /// the caller.
    pub fn start(self: &Arc<Self>) -> (Vec<JoinHandle<()>>, JoinHandle<()>) {
        let workers = self.executor.spawn_workers();
        let this = Arc::clone(self);
        let sweep = tokio::spawn(async move { this.sweep_loop().await });
        (workers, sweep)
    }

    async fn sweep_loop(&self) {
        loop {
            tokio::time::sleep(SWEEP_INTERVAL).await;
            self.progress.sweep(self.clock.epoch_ms(), self.progress_retention_secs);
        }
    }

    pub fn submit_update(
        &self,
        app_id: InstanceId,
        distr_url: String,
        mode: Mode,
        orchestrator_playbook: Option<String>,
        drain_wait_time: Option<u64>,
    ) -> Result<Vec<TaskId>, CoordinatorError> {
        self.submit_update_batch(vec![app_id], distr_url, mode, orchestrator_playbook, drain_wait_time)
    }

    pub fn submit_update_batch(
        &self,
        app_ids: Vec<InstanceId>,
        distr_url: String,
        mode: Mode,
        orchestrator_playbook: Option<String>,
        drain_wait_time: Option<u64>,
    ) -> Result<Vec<TaskId>, CoordinatorError> {
        let instances = self.instances_map()?;
        let groups = self.store.all_groups()?;
        let catalogs = self.store.all_catalogs()?;

        let request = PlanRequest {
            app_ids,
            mode,
            orchestrator_playbook: orchestrator_playbook.clone(),
            drain_wait_time,
        };
        let items = plan(&instances, &groups, &catalogs, &self.planner_config, &request)?;

        let requests = items
            .into_iter()
            .map(|item| {
                let instance_id = item.instance_ids.first().copied();
                NewTaskRequest {
                    params: TaskParams::Update {
                        app_ids: item.instance_ids,
                        distr_url: distr_url.clone(),
                        mode,
                        playbook_path: item.playbook_path,
                        orchestrator_playbook: orchestrator_playbook.clone(),
                        drain_wait_time,
                        timeout_seconds: None,
                    },
                    server_id: item.server_id,
                    instance_id,
                }
            })
            .collect();

        let ids = self.queue.enqueue(requests, self.clock.epoch_ms())?;
        info!(task_count = ids.len(), "submitted update batch");
        Ok(ids)
    }

    pub fn submit_action(&self, app_id: InstanceId, action: Action) -> Result<Vec<TaskId>, CoordinatorError> {
        self.submit_bulk_action(vec![app_id], action)
    }

    pub fn submit_bulk_action(&self, app_ids: Vec<InstanceId>, action: Action) -> Result<Vec<TaskId>, CoordinatorError> {
        let instances = self.instances_map()?;
        let groups = self.store.all_groups()?;

        let request = ActionPlanRequest {
            app_ids,
            action,
            playbook_path: self.action_playbook.clone(),
        };
        let items = plan_action(&instances, &groups, &request)?;

        let requests = items
            .into_iter()
            .map(|item| {
                let instance_id = item.instance_ids.first().copied();
                NewTaskRequest {
                    params: TaskParams::Action {
                        app_ids: item.instance_ids,
                        action,
                        playbook_path: item.playbook_path,
                        timeout_seconds: None,
                    },
                    server_id: item.server_id,
                    instance_id,
                }
            })
            .collect();

        let ids = self.queue.enqueue(requests, self.clock.epoch_ms())?;
        info!(task_count = ids.len(), action = %action, "submitted action batch");
        Ok(ids)
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, CoordinatorError> {
        Ok(self.queue.list(filter)?)
    }

    pub fn get_task(&self, id: &TaskId) -> Result<Option<TaskDetail>, CoordinatorError> {
        let Some(task) = self.queue.get(id)? else {
            return Ok(None);
        };
        let (play_recap, display_summaries) = match &task.result {
            Some(result) => (
                parse_play_recap(result).into_iter().map(recap_to_wire).collect(),
                parse_display_summaries(result).into_iter().map(display_to_wire).collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        Ok(Some(TaskDetail {
            task,
            play_recap,
            display_summaries,
        }))
    }

    pub async fn cancel_task(&self, id: &TaskId) -> Result<CancelOutcome, CoordinatorError> {
        let outcome = self.queue.request_cancel(id)?;
        if outcome == CancelOutcome::Cancelled {
            self.executor.cancel(id).await;
        }
        Ok(outcome)
    }

    /// Stops the worker pool from dequeuing further tasks. Call before
    /// `DaemonState::shutdown` so no new task starts mid-teardown.
    pub fn shutdown(&self) {
        self.queue.shutdown();
    }

    /// Full shutdown sequence (spec.md §4.6): stop accepting new
    /// dispatches, wait for every worker to finish its current task up to
    /// `deadline`, then forcibly cancel whatever is still in flight and
    /// fail it with `error = "shutdown"`. Workers that outlive the
    /// deadline are aborted so they can't race the forced finish with
    /// their own.
    pub async fn drain(&self, workers: Vec<JoinHandle<()>>, deadline: Duration) {
        self.shutdown();

        let deadline_at = Instant::now() + deadline;
        let mut timed_out = false;
        for mut handle in workers {
            if tokio::time::timeout_at(deadline_at, &mut handle).await.is_err() {
                handle.abort();
                timed_out = true;
            }
        }

        if timed_out {
            self.fail_remaining_processing_tasks().await;
        }
    }

    /// Cancels and fails every task still `Processing` after the shutdown
    /// deadline elapsed. The owning worker may already be aborted, so this
    /// is the only thing left to terminate the subprocess and persist an
    /// outcome for it.
    async fn fail_remaining_processing_tasks(&self) {
        let remaining = match self.store.processing_tasks() {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(error = %e, "failed to list processing tasks during shutdown");
                return;
            }
        };

        let registry = self.executor.cancel_registry();
        for task in remaining {
            registry.terminate(&task.id).await;
            registry.kill(&task.id).await;
            if let Err(e) =
                self.queue.finish(&task.id, TaskStatus::Failed, task.result.clone(), Some("shutdown".to_string()), self.clock.epoch_ms())
            {
                warn!(task_id = %task.id, error = %e, "failed to finish task during shutdown");
            }
        }
    }

    fn instances_map(&self) -> Result<HashMap<InstanceId, Instance>, CoordinatorError> {
        Ok(self.store.all_instances()?.into_iter().map(|i| (i.id, i)).collect())
    }
}

fn recap_to_wire(entry: fleet_engine::PlayRecapEntry) -> PlayRecapSummary {
    PlayRecapSummary {
        host: entry.host,
        ok: entry.ok,
        changed: entry.changed,
        unreachable: entry.unreachable,
        failed: entry.failed,
        skipped: entry.skipped,
        rescued: entry.rescued,
        ignored: entry.ignored,
    }
}

fn display_to_wire(entry: fleet_engine::DisplaySummary) -> DisplaySummary {
    DisplaySummary {
        task_name: entry.task_name,
        content: entry.content,
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
