// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetctl`: thin CLI client for the fleet control plane daemon.

use clap::Parser;

use fleet_cli::client::DaemonClient;
use fleet_cli::color;
use fleet_cli::commands::Command;
use fleet_cli::exit_error::ExitError;
use fleet_cli::output::OutputFormat;

/// Fleet application lifecycle control plane
#[derive(Parser)]
#[command(name = "fleetctl", version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")), styles = color::styles())]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(exit) = run(cli).await {
        eprintln!("fleetctl: {exit}");
        std::process::exit(exit.code);
    }
}

async fn run(cli: Cli) -> Result<(), ExitError> {
    let client = DaemonClient::discover()?;
    cli.command.run(&client, cli.format).await
}
