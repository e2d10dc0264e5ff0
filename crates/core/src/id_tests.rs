// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn new_ids_carry_the_type_prefix() {
    let id = TaskId::new();
    assert!(id.as_str().starts_with(TaskId::PREFIX));
}

#[test]
fn new_ids_are_unique() {
    assert_ne!(TaskId::new(), TaskId::new());
}

#[test]
fn from_string_round_trips() {
    let id = InstanceId::from_string("ins-abcdefghijklmnopqrs");
    assert_eq!(id.as_str(), "ins-abcdefghijklmnopqrs");
    assert_eq!(InstanceId::from(id.as_str()), id);
    assert_eq!(InstanceId::from(id.as_str().to_string()), id);
}

#[test]
fn suffix_strips_the_prefix() {
    let id = ServerId::from_string("srv-xyz");
    assert_eq!(id.suffix(), "xyz");
}

#[test]
fn suffix_falls_back_to_full_string_without_prefix() {
    let id = ServerId::from_string("no-prefix-here");
    assert_eq!(id.suffix(), "no-prefix-here");
}

#[test]
fn short_truncates_the_suffix() {
    let id = GroupId::from_string("grp-abcdefghij");
    assert_eq!(id.short(4), "abcd");
}

#[test]
fn short_returns_full_suffix_when_shorter_than_n() {
    let id = GroupId::from_string("grp-ab");
    assert_eq!(id.short(10), "ab");
}

#[test]
fn equality_against_str_slices() {
    let id = CatalogId::from_string("cat-foo");
    assert_eq!(id, "cat-foo");
    assert_eq!(id, *"cat-foo".to_string().as_str());
}

#[test]
fn hash_map_lookup_via_borrow() {
    let mut map: HashMap<VersionHistoryId, u32> = HashMap::new();
    let id = VersionHistoryId::from_string("vhx-1");
    map.insert(id, 7);
    assert_eq!(map.get(&id), Some(&7));
    assert_eq!(map.get("vhx-1"), Some(&7));
}

#[test]
fn deref_exposes_str_methods() {
    let id = TaskId::from_string("tsk-abc");
    assert!(id.ends_with("abc"));
}

#[test]
fn is_empty_reflects_default_construction() {
    let id = TaskId::from_string("");
    assert!(id.is_empty());
    assert!(!TaskId::new().is_empty());
}
