// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SAMPLE_OUTPUT: &str = r#"
PLAY [update] *****************************************************

TASK [deploy] ******************************************************
changed: [host-a]

PLAY RECAP *********************************************************
host-a                     : ok=5    changed=2    unreachable=0    failed=0    skipped=1    rescued=0    ignored=0
host-b                     : ok=3    changed=0    unreachable=0    failed=1    skipped=0    rescued=0    ignored=0
"#;

#[test]
fn parses_every_host_row_in_the_recap_block() {
    let entries = parse_play_recap(SAMPLE_OUTPUT);
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[0],
        PlayRecapEntry {
            host: "host-a".into(),
            ok: 5,
            changed: 2,
            unreachable: 0,
            failed: 0,
            skipped: 1,
            rescued: 0,
            ignored: 0,
        }
    );
    assert_eq!(entries[1].host, "host-b");
    assert_eq!(entries[1].failed, 1);
}

#[test]
fn ignores_lines_outside_the_recap_block() {
    let entries = parse_play_recap("TASK [deploy] **\nchanged: [host-a]\n");
    assert!(entries.is_empty());
}

#[test]
fn treats_skipped_rescued_and_ignored_as_optional() {
    let output = "host-a                     : ok=5    changed=2    unreachable=0    failed=0\n";
    let entries = parse_play_recap(output);
    assert_eq!(
        entries[0],
        PlayRecapEntry {
            host: "host-a".into(),
            ok: 5,
            changed: 2,
            unreachable: 0,
            failed: 0,
            skipped: 0,
            rescued: 0,
            ignored: 0,
        }
    );
}

#[test]
fn treats_only_skipped_as_present() {
    let output = "host-a                     : ok=5    changed=2    unreachable=0    failed=0    skipped=3\n";
    let entries = parse_play_recap(output);
    assert_eq!(entries[0].skipped, 3);
    assert_eq!(entries[0].rescued, 0);
    assert_eq!(entries[0].ignored, 0);
}

const DIRECT_SUMMARY_OUTPUT: &str =
    "TASK [Display summary] ***************************\nok: [localhost] => {\n    \"msg\": \"Deployed version 1.2.3\"\n}\n";

#[test]
fn parses_a_direct_display_summary_block() {
    let summaries = parse_display_summaries(DIRECT_SUMMARY_OUTPUT);
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].task_name, "Display summary");
    assert_eq!(summaries[0].content, "Deployed version 1.2.3");
}

#[test]
fn appends_the_host_when_it_is_not_localhost() {
    let output = "TASK [Display summary] ***\nchanged: [host-a] => {\n    \"msg\": \"Restarted service\"\n}\n";
    let summaries = parse_display_summaries(output);
    assert_eq!(summaries[0].task_name, "Display summary (host-a)");
}

#[test]
fn ignores_ok_lines_not_inside_a_summary_task_block() {
    let output = "TASK [deploy] ***\nok: [host-a] => \"Deployed version 1.2.3\"\n";
    let summaries = parse_display_summaries(output);
    assert!(summaries.is_empty());
}

#[test]
fn joins_array_shaped_msg_content_with_newlines() {
    let output =
        "TASK [Rollout summary] ***\nok: [localhost] => {\n    \"msg\": [\n        \"line one\",\n        \"line two\"\n    ]\n}\n";
    let summaries = parse_display_summaries(output);
    assert_eq!(summaries[0].content, "line one\nline two");
}

#[test]
fn dedups_identical_summary_blocks_by_content() {
    let output = format!("{DIRECT_SUMMARY_OUTPUT}\n{DIRECT_SUMMARY_OUTPUT}");
    let summaries = parse_display_summaries(&output);
    assert_eq!(summaries.len(), 1);
}

#[test]
fn parses_the_escaped_form_from_a_re_logged_include_tasks_block() {
    let output = r#"TASK [Display summary] ***\nok: [localhost] => {\n    \"msg\": \"Deployed version 1.2.3\"\n}"#;
    let summaries = parse_display_summaries(output);
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].content, "Deployed version 1.2.3");
}

#[test]
fn empty_output_yields_no_summaries() {
    assert!(parse_display_summaries("").is_empty());
}
