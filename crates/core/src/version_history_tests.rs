// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn differs_from_detects_version_change() {
    let old = VersionFields {
        version: Some("1.79.2".into()),
        ..Default::default()
    };
    let new = VersionFields {
        version: Some("1.80.0".into()),
        ..Default::default()
    };
    assert!(new.differs_from(&old));
}

#[test]
fn differs_from_is_false_for_identical_fields() {
    let fields = VersionFields {
        version: Some("1.79.2".into()),
        tag: Some("stable".into()),
        ..Default::default()
    };
    assert!(!fields.differs_from(&fields.clone()));
}

#[test]
fn differs_from_detects_image_or_tag_change_with_unchanged_version() {
    let old = VersionFields {
        image: Some("registry/jurws".into()),
        tag: Some("1.79.2".into()),
        ..Default::default()
    };
    let new = VersionFields {
        tag: Some("1.80.0".into()),
        ..old.clone()
    };
    assert!(new.differs_from(&old));
}

#[test]
fn entry_builder_sets_expected_authorship() {
    let entry = VersionHistoryEntry::builder()
        .changed_by(ChangedBy::Agent)
        .change_source("polling")
        .build();
    assert_eq!(entry.changed_by, ChangedBy::Agent);
    assert_eq!(entry.change_source, "polling");
    assert!(entry.task_id.is_none());
}
