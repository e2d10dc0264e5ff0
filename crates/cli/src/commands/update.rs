// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `update` / `batch-update` / `action` / `bulk-action`: the four
//! submission operations of spec.md §6.

use clap::Args;

use fleet_core::{Action, InstanceId, Mode};
use fleet_wire::{Request, Response};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{print_submitted, OutputFormat};

#[derive(Args)]
pub struct UpdateArgs {
    /// Instance ID to update (e.g. ins-xxxxxxxxxxxxxxxxxxx)
    pub app_id: String,
    /// URL of the new artifact (distribution archive or docker image:tag)
    pub distr_url: String,
    /// How the update should be carried out
    #[arg(long, value_parser = parse_mode, default_value = "immediate")]
    pub mode: Mode,
    /// Orchestrator playbook to use instead of the direct per-host playbook
    #[arg(long)]
    pub orchestrator_playbook: Option<String>,
    /// Seconds to wait for in-flight requests to drain before updating
    #[arg(long)]
    pub drain_wait_time: Option<u64>,
}

#[derive(Args)]
pub struct BatchUpdateArgs {
    /// Instance ID to update (repeat for each instance in the batch)
    #[arg(long = "app-id", required = true)]
    pub app_ids: Vec<String>,
    /// URL of the new artifact (distribution archive or docker image:tag)
    pub distr_url: String,
    #[arg(long, value_parser = parse_mode, default_value = "immediate")]
    pub mode: Mode,
    #[arg(long)]
    pub orchestrator_playbook: Option<String>,
    #[arg(long)]
    pub drain_wait_time: Option<u64>,
}

#[derive(Args)]
pub struct ActionArgs {
    /// Instance ID
    pub app_id: String,
    /// Lifecycle action
    #[arg(value_parser = parse_action)]
    pub action: Action,
}

#[derive(Args)]
pub struct BulkActionArgs {
    /// Instance ID (repeat for each instance in the batch)
    #[arg(long = "app-id", required = true)]
    pub app_ids: Vec<String>,
    /// Lifecycle action
    #[arg(value_parser = parse_action)]
    pub action: Action,
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    match s {
        "immediate" => Ok(Mode::Immediate),
        "deliver" => Ok(Mode::Deliver),
        "night-restart" => Ok(Mode::NightRestart),
        other => Err(format!("unknown mode {other:?} (expected immediate, deliver, or night-restart)")),
    }
}

fn parse_action(s: &str) -> Result<Action, String> {
    match s {
        "start" => Ok(Action::Start),
        "stop" => Ok(Action::Stop),
        "restart" => Ok(Action::Restart),
        other => Err(format!("unknown action {other:?} (expected start, stop, or restart)")),
    }
}

pub async fn run_update(args: UpdateArgs, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    let request = Request::SubmitUpdate {
        app_id: InstanceId::from(args.app_id.as_str()),
        distr_url: args.distr_url,
        mode: args.mode,
        orchestrator_playbook: args.orchestrator_playbook,
        drain_wait_time: args.drain_wait_time,
    };
    submit(client, request, format).await
}

pub async fn run_batch_update(args: BatchUpdateArgs, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    let request = Request::SubmitBatchUpdate {
        app_ids: args.app_ids.iter().map(|s| InstanceId::from(s.as_str())).collect(),
        distr_url: args.distr_url,
        mode: args.mode,
        orchestrator_playbook: args.orchestrator_playbook,
        drain_wait_time: args.drain_wait_time,
    };
    submit(client, request, format).await
}

pub async fn run_action(args: ActionArgs, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    let request = Request::SubmitAction { app_id: InstanceId::from(args.app_id.as_str()), action: args.action };
    submit(client, request, format).await
}

pub async fn run_bulk_action(args: BulkActionArgs, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    let request = Request::SubmitBulkAction {
        app_ids: args.app_ids.iter().map(|s| InstanceId::from(s.as_str())).collect(),
        action: args.action,
    };
    submit(client, request, format).await
}

async fn submit(client: &DaemonClient, request: Request, format: OutputFormat) -> Result<(), ExitError> {
    match client.send_checked(&request).await? {
        Response::Submitted { task_ids } => {
            print_submitted(&task_ids, format);
            Ok(())
        }
        other => Err(ExitError::new(1, format!("unexpected response: {other:?}"))),
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
