// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain events published on the engine's event bus.
//!
//! Serializes with `{"type": "event:name", ...fields}` format. The event
//! log is the only history the system keeps; there is no per-record
//! journal and nothing is persisted.

use crate::file::{FileId, FileStatus};
use crate::storage::{StorageInfo, StorageKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Phase of a network mount attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountPhase {
    Attempt,
    Succeeded,
    Failed,
    NotConfigured,
}

crate::simple_display! {
    MountPhase {
        Attempt => "attempt",
        Succeeded => "succeeded",
        Failed => "failed",
        NotConfigured => "not_configured",
    }
}

/// Events emitted by the lifecycle core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A record changed status. `old_status` is `None` for the creation
    /// event of a freshly discovered record.
    #[serde(rename = "file:status_changed")]
    FileStatusChanged {
        file_id: FileId,
        file_path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_status: Option<FileStatus>,
        new_status: FileStatus,
        /// Epoch milliseconds
        timestamp: u64,
    },

    /// Copy progress crossed the configured percent granularity.
    #[serde(rename = "file:progress")]
    FileCopyProgress {
        file_id: FileId,
        bytes_copied: u64,
        total_bytes: u64,
        copy_speed_mbps: f64,
        /// Epoch milliseconds
        timestamp: u64,
    },

    /// A monitored directory changed status.
    #[serde(rename = "storage:status_changed")]
    StorageStatusChanged {
        kind: StorageKind,
        info: StorageInfo,
    },

    /// A network mount attempt progressed.
    #[serde(rename = "storage:mount")]
    MountStatusChanged {
        phase: MountPhase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        share_url: Option<String>,
        target_path: PathBuf,
    },

    /// The scanner was paused or resumed.
    #[serde(rename = "scanner:status_changed")]
    ScannerStatusChanged {
        running: bool,
        /// Epoch milliseconds
        timestamp: u64,
    },
}

impl Event {
    /// The file id this event concerns, if any.
    pub fn file_id(&self) -> Option<FileId> {
        match self {
            Event::FileStatusChanged { file_id, .. } | Event::FileCopyProgress { file_id, .. } => {
                Some(*file_id)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
