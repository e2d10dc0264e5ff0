// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ansible output parsing (spec.md §4.3 "parsing rules"), grounded on the
//! original's `parse_ansible_summary` and `parse_display_summary_tasks`
//! (`app/api/tasks_routes.py`), including its content-hash dedup of
//! repeated `debug` output. Parsing happens on read (`GetTask`), never in
//! the worker hot loop.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

/// One host's line from the `PLAY RECAP` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRecapEntry {
    pub host: String,
    pub ok: u32,
    pub changed: u32,
    pub unreachable: u32,
    pub failed: u32,
    pub skipped: u32,
    pub rescued: u32,
    pub ignored: u32,
}

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
fn recap_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^(?P<host>\S+)\s*:\s*
            ok=(?P<ok>\d+)\s+
            changed=(?P<changed>\d+)\s+
            unreachable=(?P<unreachable>\d+)\s+
            failed=(?P<failed>\d+)
            (?:\s+skipped=(?P<skipped>\d+))?
            (?:\s+rescued=(?P<rescued>\d+))?
            (?:\s+ignored=(?P<ignored>\d+))?
            \s*$
            ",
        )
        .expect("constant regex pattern is valid")
    })
}

fn field(caps: &regex::Captures, name: &str) -> u32 {
    caps.name(name).and_then(|m| m.as_str().parse().ok()).unwrap_or(0)
}

/// Extracts every host row from a `PLAY RECAP` block anywhere in `output`.
/// Lines outside the recap section (no `ok=`/`changed=` fields) are
/// ignored, so this can be called on the full captured result buffer.
/// `skipped`/`rescued`/`ignored` are optional per spec.md's grammar —
/// older Ansible versions only ever emit the first four fields.
pub fn parse_play_recap(output: &str) -> Vec<PlayRecapEntry> {
    output
        .lines()
        .filter_map(|line| {
            let caps = recap_line_re().captures(line.trim())?;
            Some(PlayRecapEntry {
                host: caps.name("host")?.as_str().to_string(),
                ok: field(&caps, "ok"),
                changed: field(&caps, "changed"),
                unreachable: field(&caps, "unreachable"),
                failed: field(&caps, "failed"),
                skipped: field(&caps, "skipped"),
                rescued: field(&caps, "rescued"),
                ignored: field(&caps, "ignored"),
            })
        })
        .collect()
}

/// One deduplicated `TASK [...summary...]` message, mirroring the
/// original's `parse_display_summary_tasks` result shape: a display name
/// (the task name, with the host appended when it isn't `localhost`) and
/// the rendered `msg` content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySummary {
    pub task_name: String,
    pub content: String,
}

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
fn direct_summary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)TASK \[([^\]]*[Ss]ummary[^\]]*)\] \*+\s*\n(?:ok|changed): \[([^\]]+)\] => \{\s*\n\s*"msg":\s*(.+?)\n\}"#,
        )
        .expect("constant regex pattern is valid")
    })
}

/// The escaped variant (`\n` in place of real newlines) that shows up when
/// an `include_tasks` block re-logs its own captured output.
#[allow(clippy::expect_used)]
fn escaped_summary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)TASK \[([^\]]*[Ss]ummary[^\]]*)\] \*+\\n(?:ok|changed): \[([^\]]+)\] => \{\\n\s*\\"msg\\":\s*(.+?)(?:\\n\}|"\s*\])"#,
        )
        .expect("constant regex pattern is valid")
    })
}

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
fn quoted_string_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]*)""#).expect("constant regex pattern is valid"))
}

/// Renders a raw `msg` payload the way the original's `_parse_msg_content`
/// does: an array-shaped `msg` becomes its quoted strings joined by `\n`, a
/// single quoted string is unquoted and its `\n` escapes restored, anything
/// else passes through unchanged. Falsy (empty) content is dropped, as the
/// original's `if content:` check does.
fn parse_msg_content(raw: &str) -> Option<String> {
    let msg = raw.trim();
    let content = if msg.starts_with('[') {
        let lines: Vec<&str> = quoted_string_re().captures_iter(msg).filter_map(|c| c.get(1)).map(|m| m.as_str()).collect();
        lines.join("\n")
    } else if msg.starts_with('"') {
        msg.trim_matches('"').replace("\\n", "\n")
    } else {
        msg.to_string()
    };
    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}

fn push_summary(seen: &mut HashSet<[u8; 32]>, summaries: &mut Vec<DisplaySummary>, task_name: &str, host: &str, content: String) {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    if !seen.insert(digest) {
        return;
    }
    let task_name = if host == "localhost" {
        task_name.to_string()
    } else {
        format!("{task_name} ({host})")
    };
    summaries.push(DisplaySummary { task_name, content });
}

/// Locates `TASK [...summary...] ***` blocks followed by an `ok`/`changed`
/// line and a `"msg":` payload (spec.md §4.3), in both the direct and
/// escaped forms a nested `include_tasks` can produce, deduplicating by
/// content hash.
pub fn parse_display_summaries(output: &str) -> Vec<DisplaySummary> {
    if output.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut summaries = Vec::new();

    for caps in direct_summary_re().captures_iter(output) {
        let task_name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let host = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let msg = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
        if let Some(content) = parse_msg_content(msg) {
            push_summary(&mut seen, &mut summaries, task_name, host, content);
        }
    }

    for caps in escaped_summary_re().captures_iter(output) {
        let task_name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let host = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let raw = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
        let unescaped = raw.replace("\\n", "\n").replace("\\\"", "\"");
        if let Some(content) = parse_msg_content(&unescaped) {
            push_summary(&mut seen, &mut summaries, task_name, host, content);
        }
    }

    summaries
}

#[cfg(test)]
#[path = "recap_tests.rs"]
mod tests;
