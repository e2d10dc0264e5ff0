// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log: one JSON-encoded [`StorageEvent`] per line.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::event::StorageEvent;

pub struct Wal {
    path: PathBuf,
    file: File,
}

impl Wal {
    /// Opens (creating if absent) the WAL file for appending.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Replays every well-formed event in `path`, in order. A missing file
    /// replays as empty (fresh boot, nothing persisted yet).
    pub fn replay(path: impl AsRef<Path>) -> Result<Vec<StorageEvent>, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for (offset, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: StorageEvent = serde_json::from_str(&line).map_err(|e| StoreError::Corrupt {
                offset: offset as u64,
                reason: e.to_string(),
            })?;
            events.push(event);
        }
        Ok(events)
    }

    /// Appends one event as a single line and fsyncs it durably.
    pub fn append(&mut self, event: &StorageEvent) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Truncates the WAL to empty, called right after a successful
    /// checkpoint snapshot makes every prior event redundant.
    pub fn truncate(&mut self) -> Result<(), StoreError> {
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
