// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracked file identity, status graph, and transition patches.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a tracked file record.
    ///
    /// A record id is assigned when the scanner first sights a path and is
    /// never reused. A path that is rediscovered after its record reached a
    /// terminal state gets a fresh id.
    pub struct FileId("fil-");
}

/// Lifecycle status of a tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Seen on disk; stability not yet established
    Discovered,
    /// Size increasing; below the minimum-size threshold for live copy
    Growing,
    /// Size increasing and large enough to begin a live (tailing) copy
    ReadyToStartGrowing,
    /// Size stable long enough; eligible for normal copy
    Ready,
    /// Admitted to the copy queue, not yet picked up
    InQueue,
    /// Normal copy in progress
    Copying,
    /// Live copy in progress (source still growing)
    GrowingCopy,
    /// Insufficient destination space; retry scheduled
    WaitingForSpace,
    /// Destination unreachable; resume pending recovery
    WaitingForNetwork,
    /// Space check exhausted its retries; cooldown armed
    SpaceError,
    /// Copy succeeded, source deleted, destination published
    Completed,
    /// Terminal failure; not retried without re-discovery
    Failed,
    /// Source file no longer exists; preserved as history
    Removed,
}

crate::simple_display! {
    FileStatus {
        Discovered => "discovered",
        Growing => "growing",
        ReadyToStartGrowing => "ready_to_start_growing",
        Ready => "ready",
        InQueue => "in_queue",
        Copying => "copying",
        GrowingCopy => "growing_copy",
        WaitingForSpace => "waiting_for_space",
        WaitingForNetwork => "waiting_for_network",
        SpaceError => "space_error",
        Completed => "completed",
        Failed => "failed",
        Removed => "removed",
    }
}

impl FileStatus {
    /// Terminal states never transition again for the lifetime of the record.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Removed)
    }

    /// Active states are everything except the terminal ones. At most one
    /// record per path may be active at any time.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// True while a copy is writing to the destination.
    pub fn is_copying(self) -> bool {
        matches!(self, Self::Copying | Self::GrowingCopy)
    }

    /// Legal outgoing edges of the status graph.
    pub fn successors(self) -> &'static [FileStatus] {
        use FileStatus::*;
        match self {
            Discovered => &[Growing, ReadyToStartGrowing, Ready, Removed],
            Growing => &[ReadyToStartGrowing, Ready, Removed, Failed],
            ReadyToStartGrowing => &[InQueue, Removed, Failed],
            Ready => &[InQueue, Removed, Failed],
            InQueue => &[
                Copying,
                GrowingCopy,
                WaitingForSpace,
                WaitingForNetwork,
                Failed,
                Removed,
            ],
            Copying => &[Completed, Failed, Removed, WaitingForNetwork],
            GrowingCopy => &[Completed, Failed, Removed, WaitingForNetwork],
            WaitingForSpace => &[InQueue, SpaceError, Removed, Failed],
            WaitingForNetwork => &[InQueue, Failed, Removed],
            SpaceError => &[InQueue, Removed],
            Completed | Failed | Removed => &[],
        }
    }

    /// Whether the edge `self -> next` is in the status graph.
    pub fn can_transition_to(self, next: FileStatus) -> bool {
        self.successors().contains(&next)
    }
}

/// Why a retry is scheduled for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryKind {
    Space,
    Network,
}

crate::simple_display! {
    RetryKind {
        Space => "space",
        Network => "network",
    }
}

/// A scheduled retry attached to a waiting record.
///
/// Present iff a retry is currently scheduled; cleared on every transition
/// into a non-waiting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryInfo {
    pub reason: String,
    pub kind: RetryKind,
    /// Epoch milliseconds when the retry fires.
    pub scheduled_at: u64,
}

/// The central entity: one sighting-to-terminal lifecycle of a source file.
///
/// Mutated only through the engine's state machine; all timestamps are
/// epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedFile {
    pub id: FileId,
    pub file_path: PathBuf,
    pub status: FileStatus,
    /// Last observed source size in bytes
    pub file_size: u64,
    /// Source size at the previous growth check
    pub previous_file_size: Option<u64>,
    /// Observed growth rate in MB/s (0.0 until two observations exist)
    pub growth_rate_mbps: f64,
    /// Source size at first sighting
    pub first_seen_size: u64,
    /// Since when the size has been unchanged
    pub growth_stable_since: Option<u64>,
    /// When the growth classifier last observed this record
    pub last_growth_check: Option<u64>,
    /// Bytes written in the current copy attempt (0 before copying)
    pub bytes_copied: u64,
    /// Percent (0–100) of the current copy
    pub copy_progress: f64,
    pub discovered_at: u64,
    pub started_copying_at: Option<u64>,
    pub completed_at: Option<u64>,
    /// When the most recent space failure was recorded on this record
    pub space_error_at: Option<u64>,
    /// Retry attempts consumed
    pub retry_count: u32,
    pub retry_info: Option<RetryInfo>,
    /// Last observed failure reason
    pub error_message: Option<String>,
}

impl TrackedFile {
    /// Create a freshly discovered record.
    pub fn discovered(path: impl Into<PathBuf>, size: u64, now_ms: u64) -> Self {
        Self {
            id: FileId::new(),
            file_path: path.into(),
            status: FileStatus::Discovered,
            file_size: size,
            previous_file_size: None,
            growth_rate_mbps: 0.0,
            first_seen_size: size,
            growth_stable_since: None,
            last_growth_check: None,
            bytes_copied: 0,
            copy_progress: 0.0,
            discovered_at: now_ms,
            started_copying_at: None,
            completed_at: None,
            space_error_at: None,
            retry_count: 0,
            retry_info: None,
            error_message: None,
        }
    }

    /// File name portion of the tracked path, lossy-rendered for display.
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Field updates applied together with a status transition (or on their
/// own via the state machine's patch-only paths).
///
/// `None` leaves a field untouched. Optional record fields use dedicated
/// set/clear methods so a patch can distinguish "leave alone" from
/// "clear".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilePatch {
    pub file_size: Option<u64>,
    pub previous_file_size: Option<u64>,
    pub growth_rate_mbps: Option<f64>,
    pub growth_stable_since: Option<Option<u64>>,
    pub last_growth_check: Option<u64>,
    pub bytes_copied: Option<u64>,
    pub copy_progress: Option<f64>,
    pub retry_count: Option<u32>,
    pub retry_info: Option<Option<RetryInfo>>,
    pub error_message: Option<Option<String>>,
}

impl FilePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, bytes: u64) -> Self {
        self.file_size = Some(bytes);
        self
    }

    pub fn previous_size(mut self, bytes: u64) -> Self {
        self.previous_file_size = Some(bytes);
        self
    }

    pub fn growth_rate(mut self, mbps: f64) -> Self {
        self.growth_rate_mbps = Some(mbps);
        self
    }

    pub fn stable_since(mut self, at_ms: u64) -> Self {
        self.growth_stable_since = Some(Some(at_ms));
        self
    }

    pub fn clear_stable_since(mut self) -> Self {
        self.growth_stable_since = Some(None);
        self
    }

    pub fn growth_checked(mut self, at_ms: u64) -> Self {
        self.last_growth_check = Some(at_ms);
        self
    }

    pub fn bytes_copied(mut self, bytes: u64) -> Self {
        self.bytes_copied = Some(bytes);
        self
    }

    pub fn progress(mut self, percent: f64) -> Self {
        self.copy_progress = Some(percent);
        self
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = Some(count);
        self
    }

    pub fn retry(mut self, info: RetryInfo) -> Self {
        self.retry_info = Some(Some(info));
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(Some(message.into()));
        self
    }

    /// Apply the patch to a record. Status, timestamps and retry-info
    /// clearing are handled by the state machine, not here.
    pub fn apply(&self, file: &mut TrackedFile) {
        if let Some(v) = self.file_size {
            file.file_size = v;
        }
        if let Some(v) = self.previous_file_size {
            file.previous_file_size = Some(v);
        }
        if let Some(v) = self.growth_rate_mbps {
            file.growth_rate_mbps = v;
        }
        if let Some(v) = self.growth_stable_since {
            file.growth_stable_since = v;
        }
        if let Some(v) = self.last_growth_check {
            file.last_growth_check = Some(v);
        }
        if let Some(v) = self.bytes_copied {
            file.bytes_copied = v;
        }
        if let Some(v) = self.copy_progress {
            file.copy_progress = v;
        }
        if let Some(v) = self.retry_count {
            file.retry_count = v;
        }
        if let Some(ref v) = self.retry_info {
            file.retry_info = v.clone();
        }
        if let Some(ref v) = self.error_message {
            file.error_message = v.clone();
        }
    }
}

crate::builder! {
    pub struct TrackedFileBuilder => TrackedFile {
        into {
            file_path: PathBuf = "/src/test.mxf",
        }
        set {
            status: FileStatus = FileStatus::Discovered,
            file_size: u64 = 1024,
            previous_file_size: Option<u64> = None,
            growth_rate_mbps: f64 = 0.0,
            first_seen_size: u64 = 1024,
            growth_stable_since: Option<u64> = None,
            last_growth_check: Option<u64> = None,
            bytes_copied: u64 = 0,
            copy_progress: f64 = 0.0,
            discovered_at: u64 = 1_000_000,
            started_copying_at: Option<u64> = None,
            completed_at: Option<u64> = None,
            space_error_at: Option<u64> = None,
            retry_count: u32 = 0,
            retry_info: Option<RetryInfo> = None,
            error_message: Option<String> = None,
        }
        computed {
            id: FileId = FileId::new(),
        }
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
