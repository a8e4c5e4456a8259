// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File state machine.
//!
//! The only writer of tracked-file records. Validates transitions against
//! the status graph, applies field patches together with the timestamp
//! invariants, and publishes a status event for every change. Transitions
//! for one file are totally ordered by the repository lock.

use crate::bus::EventBus;
use crate::repository::{FileRepository, RepositoryError};
use freight_core::{Clock, Event, FileId, FilePatch, FileStatus, TrackedFile};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("unknown file {0}")]
    UnknownFile(FileId),

    #[error("illegal transition {from} -> {to}")]
    IllegalTransition { from: FileStatus, to: FileStatus },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct StateMachine<C: Clock> {
    repo: Arc<FileRepository>,
    bus: EventBus,
    clock: C,
}

impl<C: Clock> StateMachine<C> {
    pub fn new(repo: Arc<FileRepository>, bus: EventBus, clock: C) -> Self {
        Self { repo, bus, clock }
    }

    pub fn repository(&self) -> &Arc<FileRepository> {
        &self.repo
    }

    /// Create a freshly discovered record and publish its creation event.
    pub fn create(&self, path: &Path, size: u64) -> Result<TrackedFile, TransitionError> {
        let now = self.clock.epoch_ms();
        let record = TrackedFile::discovered(path, size, now);
        self.repo.add(record.clone())?;
        info!(
            file_id = %record.id,
            path = %path.display(),
            size,
            "file discovered"
        );
        self.bus.publish(Event::FileStatusChanged {
            file_id: record.id,
            file_path: record.file_path.clone(),
            old_status: None,
            new_status: FileStatus::Discovered,
            timestamp: now,
        });
        Ok(record)
    }

    /// Move a record along one edge of the status graph.
    ///
    /// Validates the edge, applies the patch and the timestamp rules,
    /// writes the record back and publishes the status event. Illegal
    /// edges return an error without mutating anything.
    pub fn transition(
        &self,
        id: FileId,
        new_status: FileStatus,
        patch: FilePatch,
    ) -> Result<TrackedFile, TransitionError> {
        let mut record = self.repo.get(id).ok_or(TransitionError::UnknownFile(id))?;
        let old_status = record.status;
        if !old_status.can_transition_to(new_status) {
            return Err(TransitionError::IllegalTransition {
                from: old_status,
                to: new_status,
            });
        }

        let now = self.clock.epoch_ms();
        patch.apply(&mut record);
        record.status = new_status;

        match new_status {
            FileStatus::Copying | FileStatus::GrowingCopy => {
                record.started_copying_at = Some(now);
            }
            FileStatus::Completed => {
                record.completed_at = Some(now);
            }
            FileStatus::SpaceError => {
                record.space_error_at = Some(now);
            }
            _ => {}
        }
        // A retry is scheduled iff the record sits in a waiting state.
        if !matches!(
            new_status,
            FileStatus::WaitingForSpace | FileStatus::WaitingForNetwork
        ) {
            record.retry_info = None;
        }

        self.repo.update(record.clone())?;
        info!(
            file_id = %id,
            path = %record.file_path.display(),
            from = %old_status,
            to = %new_status,
            "status transition"
        );
        self.bus.publish(Event::FileStatusChanged {
            file_id: id,
            file_path: record.file_path.clone(),
            old_status: Some(old_status),
            new_status,
            timestamp: now,
        });
        Ok(record)
    }

    /// Record a scanner-level size observation without a transition.
    ///
    /// Size updates between growth checks are bookkeeping, not lifecycle
    /// changes, so no status event is published.
    pub fn record_size(&self, id: FileId, size: u64) -> Result<(), TransitionError> {
        let mut record = self.repo.get(id).ok_or(TransitionError::UnknownFile(id))?;
        if record.file_size != size {
            debug!(
                file_id = %id,
                old_size = record.file_size,
                new_size = size,
                "source size changed"
            );
            record.previous_file_size = Some(record.file_size);
            record.file_size = size;
            self.repo.update(record)?;
        }
        Ok(())
    }

    /// Apply growth-tracking fields without a transition or event.
    pub fn record_growth(&self, id: FileId, patch: FilePatch) -> Result<(), TransitionError> {
        let mut record = self.repo.get(id).ok_or(TransitionError::UnknownFile(id))?;
        patch.apply(&mut record);
        self.repo.update(record)?;
        Ok(())
    }

    /// Record copy progress and publish a progress event.
    pub fn record_progress(
        &self,
        id: FileId,
        bytes_copied: u64,
        total_bytes: u64,
        copy_speed_mbps: f64,
    ) -> Result<(), TransitionError> {
        let mut record = self.repo.get(id).ok_or(TransitionError::UnknownFile(id))?;
        debug_assert!(
            bytes_copied <= total_bytes.max(record.file_size),
            "bytes_copied exceeds file size"
        );
        record.bytes_copied = bytes_copied;
        record.copy_progress = if total_bytes == 0 {
            0.0
        } else {
            (bytes_copied as f64 / total_bytes as f64 * 100.0).min(100.0)
        };
        self.repo.update(record)?;
        self.bus.publish(Event::FileCopyProgress {
            file_id: id,
            bytes_copied,
            total_bytes,
            copy_speed_mbps,
            timestamp: self.clock.epoch_ms(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;
