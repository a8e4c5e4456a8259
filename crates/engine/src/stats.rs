// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer statistics, fed by the workers and read by the control
//! surface. Counters only; the per-file truth lives in the repository.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
struct StatsInner {
    files_copied: u64,
    bytes_copied: u64,
    files_failed: u64,
    peak_rate_mbps: f64,
    last_completed_at: Option<u64>,
}

#[derive(Debug, Default)]
pub struct TransferStats {
    inner: Mutex<StatsInner>,
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_files_copied: u64,
    pub total_bytes_copied: u64,
    pub total_files_failed: u64,
    pub total_gb_copied: f64,
    /// Percentage of attempts that completed, 100.0 when nothing ran yet.
    pub success_rate: f64,
    pub peak_transfer_rate_mbps: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_at: Option<u64>,
}

impl TransferStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, bytes: u64, elapsed_secs: f64, completed_at_ms: u64) {
        let mut inner = self.inner.lock();
        inner.files_copied += 1;
        inner.bytes_copied += bytes;
        inner.last_completed_at = Some(completed_at_ms);
        if elapsed_secs > 0.0 {
            let rate = bytes as f64 / (1024.0 * 1024.0) / elapsed_secs;
            if rate > inner.peak_rate_mbps {
                inner.peak_rate_mbps = rate;
            }
        }
    }

    pub fn record_failure(&self) {
        self.inner.lock().files_failed += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock();
        let attempts = inner.files_copied + inner.files_failed;
        StatsSnapshot {
            total_files_copied: inner.files_copied,
            total_bytes_copied: inner.bytes_copied,
            total_files_failed: inner.files_failed,
            total_gb_copied: inner.bytes_copied as f64 / (1024.0 * 1024.0 * 1024.0),
            success_rate: if attempts == 0 {
                100.0
            } else {
                inner.files_copied as f64 / attempts as f64 * 100.0
            },
            peak_transfer_rate_mbps: inner.peak_rate_mbps,
            last_completed_at: inner.last_completed_at,
        }
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
