// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic zstd-compressed snapshot of [`MaterializedState`], so recovery
//! doesn't have to replay the WAL from the beginning of time.

use std::fs;
use std::path::Path;

use crate::error::StoreError;
use crate::state::MaterializedState;

pub fn write_snapshot(path: impl AsRef<Path>, state: &MaterializedState) -> Result<(), StoreError> {
    let json = serde_json::to_vec(state)?;
    let compressed = zstd::encode_all(json.as_slice(), 3).map_err(StoreError::Io)?;
    let tmp = path.as_ref().with_extension("tmp");
    fs::write(&tmp, compressed)?;
    fs::rename(&tmp, path.as_ref())?;
    Ok(())
}

pub fn read_snapshot(path: impl AsRef<Path>) -> Result<Option<MaterializedState>, StoreError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let compressed = fs::read(path)?;
    let json = zstd::decode_all(compressed.as_slice()).map_err(StoreError::Io)?;
    let state = serde_json::from_slice(&json)?;
    Ok(Some(state))
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
