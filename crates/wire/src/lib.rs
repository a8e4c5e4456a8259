// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! freight-wire: DTOs for the control surface.
//!
//! The HTTP/WebSocket layer is an external collaborator; these are the
//! message shapes it exchanges with the daemon. Everything here is a
//! projection of core types — no behavior.

use freight_core::{Event, FileStatus, MountPhase, StorageInfo, StorageKind, StorageStatus, TrackedFile};
use freight_engine::{QueueStatus, StatsSnapshot};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-file projection for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSnapshot {
    pub id: String,
    pub file_path: PathBuf,
    pub file_name: String,
    pub status: FileStatus,
    pub file_size: u64,
    pub bytes_copied: u64,
    pub copy_progress: f64,
    pub growth_rate_mbps: f64,
    pub discovered_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_copying_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<&TrackedFile> for FileSnapshot {
    fn from(file: &TrackedFile) -> Self {
        Self {
            id: file.id.to_string(),
            file_path: file.file_path.clone(),
            file_name: file.file_name(),
            status: file.status,
            file_size: file.file_size,
            bytes_copied: file.bytes_copied,
            copy_progress: file.copy_progress,
            growth_rate_mbps: file.growth_rate_mbps,
            discovered_at: file.discovered_at,
            started_copying_at: file.started_copying_at,
            completed_at: file.completed_at,
            retry_count: file.retry_count,
            error_message: file.error_message.clone(),
        }
    }
}

/// Storage projection with the HTTP severity mapping the storage
/// endpoints use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageDto {
    pub kind: StorageKind,
    pub info: StorageInfo,
}

impl StorageDto {
    pub fn new(kind: StorageKind, info: StorageInfo) -> Self {
        Self { kind, info }
    }

    /// HTTP status the storage endpoints answer with for this state.
    pub fn suggested_http_status(&self) -> u16 {
        match self.info.status {
            StorageStatus::Ok => 200,
            StorageStatus::Unknown => 202,
            StorageStatus::Warning => 507,
            StorageStatus::Error | StorageStatus::Critical => 503,
        }
    }
}

/// Scanner state for the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerStatus {
    pub running: bool,
}

/// One-shot aggregate served at startup to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialState {
    pub files: Vec<FileSnapshot>,
    pub statistics: StatsSnapshot,
    pub storage: Vec<StorageDto>,
    pub scanner: ScannerStatus,
}

/// Messages broadcast to UI clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiMessage {
    FileUpdate {
        file: FileSnapshot,
    },
    FileProgressUpdate {
        file_id: String,
        bytes_copied: u64,
        total_bytes: u64,
        progress_percent: f64,
        copy_speed_mbps: f64,
    },
    ScannerStatus {
        running: bool,
    },
    StorageUpdate {
        kind: StorageKind,
        info: StorageInfo,
    },
    MountStatus {
        phase: MountPhase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        share_url: Option<String>,
        target_path: PathBuf,
    },
}

impl UiMessage {
    /// Project a domain event into its broadcast message. Status-change
    /// events need the full record, which the presentation layer keeps.
    pub fn from_event(event: &Event, file: Option<&TrackedFile>) -> Option<Self> {
        match event {
            Event::FileStatusChanged { .. } => {
                file.map(|f| UiMessage::FileUpdate { file: f.into() })
            }
            Event::FileCopyProgress {
                file_id,
                bytes_copied,
                total_bytes,
                copy_speed_mbps,
                ..
            } => Some(UiMessage::FileProgressUpdate {
                file_id: file_id.to_string(),
                bytes_copied: *bytes_copied,
                total_bytes: *total_bytes,
                progress_percent: if *total_bytes == 0 {
                    0.0
                } else {
                    *bytes_copied as f64 / *total_bytes as f64 * 100.0
                },
                copy_speed_mbps: *copy_speed_mbps,
            }),
            Event::ScannerStatusChanged { running, .. } => {
                Some(UiMessage::ScannerStatus { running: *running })
            }
            Event::StorageStatusChanged { kind, info } => Some(UiMessage::StorageUpdate {
                kind: *kind,
                info: info.clone(),
            }),
            Event::MountStatusChanged { phase, share_url, target_path } => {
                Some(UiMessage::MountStatus {
                    phase: *phase,
                    share_url: share_url.clone(),
                    target_path: target_path.clone(),
                })
            }
        }
    }
}

/// Queue projection re-exported for the control surface.
pub type QueueStatusDto = QueueStatus;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
