// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `task list` / `task show` / `task cancel`: the read and cancellation
//! operations of spec.md §6.

use clap::{Args, Subcommand};

use fleet_core::{InstanceId, ServerId, TaskId, TaskStatus};
use fleet_wire::{Request, Response};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{print_cancelled, print_task_detail, print_task_list, OutputFormat};

#[derive(Subcommand)]
pub enum TaskCommand {
    /// List tasks, optionally filtered
    List(ListArgs),
    /// Show one task's full detail, including parsed playbook output
    Show(ShowArgs),
    /// Cancel a task
    Cancel(CancelArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, value_parser = parse_status)]
    pub status: Option<TaskStatus>,
    /// Filter by instance
    #[arg(long)]
    pub instance_id: Option<String>,
    /// Filter by server
    #[arg(long)]
    pub server_id: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub task_id: String,
}

#[derive(Args)]
pub struct CancelArgs {
    pub task_id: String,
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    match s {
        "pending" => Ok(TaskStatus::Pending),
        "processing" => Ok(TaskStatus::Processing),
        "completed" => Ok(TaskStatus::Completed),
        "failed" => Ok(TaskStatus::Failed),
        other => Err(format!("unknown status {other:?} (expected pending, processing, completed, or failed)")),
    }
}

pub async fn run(cmd: TaskCommand, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    match cmd {
        TaskCommand::List(args) => run_list(args, client, format).await,
        TaskCommand::Show(args) => run_show(args, client, format).await,
        TaskCommand::Cancel(args) => run_cancel(args, client, format).await,
    }
}

async fn run_list(args: ListArgs, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    let request = Request::ListTasks {
        status: args.status,
        instance_id: args.instance_id.map(|s| InstanceId::from(s.as_str())),
        server_id: args.server_id.map(|s| ServerId::from(s.as_str())),
    };
    match client.send_checked(&request).await? {
        Response::TaskList(tasks) => {
            print_task_list(&tasks, format);
            Ok(())
        }
        other => Err(ExitError::new(1, format!("unexpected response: {other:?}"))),
    }
}

async fn run_show(args: ShowArgs, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    let request = Request::GetTask { task_id: TaskId::from(args.task_id.as_str()) };
    match client.send_checked(&request).await? {
        Response::TaskDetail { task, play_recap, display_summaries } => {
            print_task_detail(&task, &play_recap, &display_summaries, format);
            Ok(())
        }
        other => Err(ExitError::new(1, format!("unexpected response: {other:?}"))),
    }
}

async fn run_cancel(args: CancelArgs, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    let task_id = TaskId::from(args.task_id.as_str());
    let request = Request::CancelTask { task_id };
    match client.send_checked(&request).await? {
        Response::Cancelled { task_id } => {
            print_cancelled(task_id, format);
            Ok(())
        }
        other => Err(ExitError::new(1, format!("unexpected response: {other:?}"))),
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
