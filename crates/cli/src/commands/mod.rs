// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations: each maps directly onto one spec.md §6
//! operation, via [`crate::client::DaemonClient`].

pub mod task;
pub mod update;

use clap::Subcommand;

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Subcommand)]
pub enum Command {
    /// Submit an update for a single instance
    Update(update::UpdateArgs),
    /// Submit an update for a batch of instances, grouped per their group's strategy
    BatchUpdate(update::BatchUpdateArgs),
    /// Start, stop, or restart a single instance
    Action(update::ActionArgs),
    /// Start, stop, or restart a batch of instances
    BulkAction(update::BulkActionArgs),
    /// Task queue operations
    #[command(subcommand)]
    Task(task::TaskCommand),
}

impl Command {
    pub async fn run(self, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
        match self {
            Command::Update(args) => update::run_update(args, client, format).await,
            Command::BatchUpdate(args) => update::run_batch_update(args, client, format).await,
            Command::Action(args) => update::run_action(args, client, format).await,
            Command::BulkAction(args) => update::run_bulk_action(args, client, format).await,
            Command::Task(cmd) => task::run(cmd, client, format).await,
        }
    }
}
