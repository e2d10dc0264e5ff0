// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: state-directory discovery plus the environment
//! variables spec.md §6 names as the operator-facing knobs.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Daemon configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub log_path: PathBuf,

    pub worker_pool_size: usize,
    pub default_update_playbook: String,
    pub night_restart_playbook: String,
    pub docker_update_playbook: String,
    pub action_playbook: String,
    pub task_progress_retention: Duration,
    pub subprocess_kill_grace: Duration,
    pub shutdown_grace: Duration,
    pub serialize_per_server: bool,
}

impl Config {
    /// Loads configuration for the user-level daemon: fixed paths under
    /// `FLEET_STATE_DIR` (or the XDG state directory), one daemon per host.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = state_dir()?;

        Ok(Self {
            socket_path: state_dir.join("fleetd.sock"),
            lock_path: state_dir.join("fleetd.pid"),
            wal_path: state_dir.join("fleet.wal"),
            snapshot_path: state_dir.join("fleet.snapshot"),
            log_path: state_dir.join("fleetd.log"),
            state_dir,

            worker_pool_size: env_usize("WORKER_POOL_SIZE", 4),
            default_update_playbook: env_string("DEFAULT_UPDATE_PLAYBOOK", "playbooks/update.yml"),
            night_restart_playbook: env_string("NIGHT_RESTART_PLAYBOOK", "playbooks/night_restart.yml"),
            docker_update_playbook: env_string("DOCKER_UPDATE_PLAYBOOK", "playbooks/docker_update.yml"),
            action_playbook: env_string("ACTION_PLAYBOOK", "playbooks/lifecycle.yml"),
            task_progress_retention: Duration::from_secs(env_u64("TASK_PROGRESS_RETENTION_SECONDS", 300)),
            subprocess_kill_grace: Duration::from_secs(env_u64("SUBPROCESS_KILL_GRACE_SECONDS", 30)),
            shutdown_grace: Duration::from_secs(env_u64("SHUTDOWN_GRACE_SECONDS", 30)),
            serialize_per_server: env_bool("SERIALIZE_PER_SERVER", false),
        })
    }

    pub fn planner_config(&self) -> fleet_planner::PlannerConfig {
        fleet_planner::PlannerConfig {
            default_update_playbook: self.default_update_playbook.clone(),
            night_restart_playbook: self.night_restart_playbook.clone(),
            docker_update_playbook: self.docker_update_playbook.clone(),
        }
    }
}

/// Resolve state directory: `FLEET_STATE_DIR` > `XDG_STATE_HOME/fleet` >
/// `~/.local/state/fleet`.
fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("FLEET_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = dirs::state_dir() {
        return Ok(dir.join("fleet"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/fleet"))
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).ok().filter(|s| !s.is_empty()).unwrap_or_else(|| default.to_string())
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
