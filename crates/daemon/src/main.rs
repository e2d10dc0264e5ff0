// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetd`: the long-running fleet control-plane daemon.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fleet_adapters::ProcessPlaybookAdapter;
use fleet_core::SystemClock;
use fleet_daemon::{lifecycle, Config, Coordinator};

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("fleetd: failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let _log_guard = init_logging(&config);

    let startup_result = match lifecycle::startup(&config).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "daemon startup failed");
            std::process::exit(1);
        }
    };

    let daemon = startup_result.daemon;
    let listener = startup_result.listener;

    let adapter = Arc::new(ProcessPlaybookAdapter::new());
    let coordinator = Coordinator::new(
        Arc::clone(&daemon.store),
        Arc::clone(&daemon.task_queue),
        adapter,
        SystemClock,
        &daemon.config,
    );

    let (workers, sweep) = coordinator.start();
    let accept_handle = tokio::spawn(fleet_daemon::serve(listener, Arc::clone(&coordinator)));

    wait_for_shutdown_signal().await;
    info!("shutdown signal received");

    accept_handle.abort();
    sweep.abort();
    coordinator.drain(workers, daemon.config.shutdown_grace).await;

    daemon.shutdown();
}

fn init_logging(config: &Config) -> tracing_appender::non_blocking::WorkerGuard {
    let filter = EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let log_dir = config.log_path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let _ = std::fs::create_dir_all(log_dir);
    let file_name = config.log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("fleetd.log"));
    let appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(non_blocking).with_ansi(false).init();

    guard
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sig) => sig,
        Err(e) => {
            error!(error = %e, "failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
