// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracked-file repository.
//!
//! The single shared mutable structure of the system. All mutation is
//! serialized behind one mutex; readers get owned snapshots and must
//! re-fetch by id through the state machine before writing.

use freight_core::{FileId, FileStatus, TrackedFile};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record {0} already present")]
    Duplicate(FileId),

    #[error("an active record already exists for {0}")]
    ActiveExists(String),

    #[error("unknown record {0}")]
    Unknown(FileId),
}

#[derive(Default)]
pub struct FileRepository {
    files: Mutex<HashMap<FileId, TrackedFile>>,
}

impl FileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record.
    ///
    /// Fails if the id is taken or if another record for the same path is
    /// still active — a path may only ever have one active record.
    pub fn add(&self, record: TrackedFile) -> Result<(), RepositoryError> {
        let mut files = self.files.lock();
        if files.contains_key(&record.id) {
            return Err(RepositoryError::Duplicate(record.id));
        }
        if record.status.is_active() {
            let clash = files
                .values()
                .any(|f| f.status.is_active() && f.file_path == record.file_path);
            if clash {
                return Err(RepositoryError::ActiveExists(
                    record.file_path.display().to_string(),
                ));
            }
        }
        files.insert(record.id, record);
        Ok(())
    }

    pub fn get(&self, id: FileId) -> Option<TrackedFile> {
        self.files.lock().get(&id).cloned()
    }

    /// Stable snapshot of every record, usable without holding the lock.
    pub fn get_all(&self) -> Vec<TrackedFile> {
        self.files.lock().values().cloned().collect()
    }

    /// Replace the record bound to `record.id`.
    pub fn update(&self, record: TrackedFile) -> Result<(), RepositoryError> {
        let mut files = self.files.lock();
        match files.get_mut(&record.id) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(RepositoryError::Unknown(record.id)),
        }
    }

    /// Remove a record. Used by age-based cleanup only.
    pub fn evict(&self, id: FileId) -> Option<TrackedFile> {
        self.files.lock().remove(&id)
    }

    /// The active record for a path, if one exists.
    ///
    /// Terminal records for the same path are history and do not count;
    /// a path whose records are all terminal is eligible for a fresh one.
    pub fn active_by_path(&self, path: &Path) -> Option<TrackedFile> {
        self.files
            .lock()
            .values()
            .find(|f| f.status.is_active() && f.file_path == path)
            .cloned()
    }

    /// Whether the scanner should skip a path entirely this cycle.
    ///
    /// True iff the path's active record is in `SpaceError` and still
    /// inside the cooldown window.
    pub fn should_skip(&self, path: &Path, now_ms: u64, cooldown: Duration) -> bool {
        let files = self.files.lock();
        let Some(record) = files
            .values()
            .find(|f| f.status.is_active() && f.file_path == path)
        else {
            return false;
        };
        if record.status != FileStatus::SpaceError {
            return false;
        }
        match record.space_error_at {
            Some(at) => now_ms.saturating_sub(at) < cooldown.as_millis() as u64,
            None => false,
        }
    }

    /// Evict aged terminal records.
    ///
    /// Terminal records older than `keep_hours` go first; if more than
    /// `max_completed` completed records remain, the oldest completions
    /// are dropped. Returns the number of evicted records.
    pub fn evict_aged(&self, now_ms: u64, keep_hours: u64, max_completed: usize) -> usize {
        let mut files = self.files.lock();
        let cutoff = now_ms.saturating_sub(keep_hours * 3_600_000);

        let aged: Vec<FileId> = files
            .values()
            .filter(|f| f.status.is_terminal() && terminal_at(f) < cutoff)
            .map(|f| f.id)
            .collect();
        let mut evicted = aged.len();
        for id in aged {
            files.remove(&id);
        }

        let mut completed: Vec<(FileId, u64)> = files
            .values()
            .filter(|f| f.status == FileStatus::Completed)
            .map(|f| (f.id, terminal_at(f)))
            .collect();
        if completed.len() > max_completed {
            completed.sort_by_key(|(_, at)| *at);
            let excess = completed.len() - max_completed;
            for (id, _) in completed.into_iter().take(excess) {
                files.remove(&id);
                evicted += 1;
            }
        }

        evicted
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

/// Best timestamp for when a record reached its terminal state.
fn terminal_at(file: &TrackedFile) -> u64 {
    file.completed_at.unwrap_or(file.discovered_at)
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
