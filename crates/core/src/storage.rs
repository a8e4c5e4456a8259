// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage health model shared by the monitor, the space arbiter and the
//! control surface.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Which monitored directory a check or event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Source,
    Destination,
}

crate::simple_display! {
    StorageKind {
        Source => "source",
        Destination => "destination",
    }
}

/// Health classification of a monitored directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageStatus {
    Ok,
    /// Free space below the warning threshold
    Warning,
    /// Inaccessible or write test failed
    Error,
    /// Free space below the critical threshold
    Critical,
    /// No completed check yet
    Unknown,
}

crate::simple_display! {
    StorageStatus {
        Ok => "ok",
        Warning => "warning",
        Error => "error",
        Critical => "critical",
        Unknown => "unknown",
    }
}

impl StorageStatus {
    /// The destination is unusable for new copies in these states.
    pub fn is_problematic(self) -> bool {
        matches!(self, Self::Error | Self::Critical)
    }
}

/// Snapshot of one monitored directory, produced by a storage check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageInfo {
    pub path: PathBuf,
    pub is_accessible: bool,
    pub has_write_access: bool,
    pub free_space_gb: f64,
    pub total_space_gb: f64,
    pub used_space_gb: f64,
    pub status: StorageStatus,
    pub warning_threshold_gb: f64,
    pub critical_threshold_gb: f64,
    pub last_checked: chrono::DateTime<chrono::Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StorageInfo {
    /// The first-check placeholder before any probe has completed.
    pub fn unknown(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_accessible: false,
            has_write_access: false,
            free_space_gb: 0.0,
            total_space_gb: 0.0,
            used_space_gb: 0.0,
            status: StorageStatus::Unknown,
            warning_threshold_gb: 0.0,
            critical_threshold_gb: 0.0,
            last_checked: chrono::Utc::now(),
            error_message: None,
        }
    }

    pub fn free_bytes(&self) -> u64 {
        (self.free_space_gb * BYTES_PER_GB) as u64
    }
}

/// Outcome of a pre-copy space decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceCheckResult {
    pub has_space: bool,
    pub available_bytes: u64,
    pub required_bytes: u64,
    pub file_size_bytes: u64,
    pub safety_margin_bytes: u64,
    pub reason: String,
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
