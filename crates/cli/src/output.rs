// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text and JSON rendering of wire responses.

use clap::ValueEnum;
use fleet_core::Task;
use fleet_wire::{DisplaySummary, PlayRecapSummary};

use crate::color;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Renders the acknowledgement of a submission: one or more task IDs.
pub fn print_submitted(task_ids: &[fleet_core::TaskId], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            if task_ids.len() == 1 {
                println!("Submitted {}", color::literal(task_ids[0].as_str()));
            } else {
                println!("{} {}", color::header("Submitted"), color::context(&format!("{} task(s)", task_ids.len())));
                for id in task_ids {
                    println!("  {}", color::literal(id.as_str()));
                }
            }
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({ "task_ids": task_ids });
            println!("{}", serde_json::to_string_pretty(&obj).unwrap_or_default());
        }
    }
}

/// Renders a single task row for `fleetctl task list`.
pub fn print_task_list(tasks: &[Task], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            if tasks.is_empty() {
                println!("No tasks");
                return;
            }
            println!(
                "{:<24} {:<10} {:<10} {:<12} {}",
                color::header("TASK"),
                color::header("TYPE"),
                color::header("STATUS"),
                color::header("CREATED"),
                color::header("ANCHOR"),
            );
            for task in tasks {
                println!(
                    "{:<24} {:<10} {:<10} {:<12} {}",
                    color::literal(task.id.as_str()),
                    task.task_type(),
                    status_label(task),
                    format_time_ago(task.created_at),
                    task.instance_id.map(|i| i.as_str().to_string()).unwrap_or_else(|| "-".into()),
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(tasks).unwrap_or_default());
        }
    }
}

/// Renders one task's full detail, including parsed recap/summary output
/// once `result` has been populated (spec.md §6 `GetTask`).
pub fn print_task_detail(
    task: &Task,
    play_recap: &[PlayRecapSummary],
    display_summaries: &[DisplaySummary],
    format: OutputFormat,
) {
    match format {
        OutputFormat::Text => {
            println!("{}  {}", color::header("task"), color::literal(task.id.as_str()));
            println!("  type:     {}", task.task_type());
            println!("  status:   {}", status_label(task));
            println!("  created:  {}", format_time_ago(task.created_at));
            if let Some(started) = task.started_at {
                println!("  started:  {}", format_time_ago(started));
            }
            if let Some(completed) = task.completed_at {
                println!("  finished: {}", format_time_ago(completed));
            }
            if let Some(step) = &task.current_step {
                println!("  step:     {}", step);
            }
            if let Some(error) = &task.error {
                println!("  error:    {}", error);
            }
            if task.cancelled {
                println!("  {}", color::muted("(cancelled)"));
            }
            if !play_recap.is_empty() {
                println!("\n{}", color::header("PLAY RECAP"));
                for r in play_recap {
                    println!(
                        "  {:<24} ok={} changed={} unreachable={} failed={} skipped={} rescued={} ignored={}",
                        r.host, r.ok, r.changed, r.unreachable, r.failed, r.skipped, r.rescued, r.ignored,
                    );
                }
            }
            if !display_summaries.is_empty() {
                println!("\n{}", color::header("summary"));
                for s in display_summaries {
                    println!("  {}: {}", s.task_name, s.content);
                }
            }
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "task": task,
                "play_recap": play_recap,
                "display_summaries": display_summaries,
            });
            println!("{}", serde_json::to_string_pretty(&obj).unwrap_or_default());
        }
    }
}

pub fn print_cancelled(task_id: fleet_core::TaskId, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("Cancelled {}", color::literal(task_id.as_str())),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "task_id": task_id })).unwrap_or_default());
        }
    }
}

fn status_label(task: &Task) -> String {
    if task.cancelled && !task.status.is_terminal() {
        color::muted("cancelling")
    } else {
        task.status.to_string()
    }
}

/// Format a millisecond epoch timestamp as relative time (e.g. "5s", "2m").
pub fn format_time_ago(epoch_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(epoch_ms);
    let elapsed_secs = now_ms.saturating_sub(epoch_ms) / 1000;
    format_elapsed(elapsed_secs)
}

fn format_elapsed(secs: u64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86400)
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
