// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Growth classification.
//!
//! Pure function of (record, stat observation): decides whether a
//! `Discovered`/`Growing` file is still being written, big enough to tail
//! live, or stable enough for a normal copy. All growth bookkeeping lives
//! on the record itself so classification needs no side table.
//!
//! Records in any other status are never classified — the scanner cannot
//! bounce a file out of an active pipeline.

use freight_core::{FilePatch, FileStatus, TrackedFile};

/// What the scanner saw when it statted the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Size(u64),
    /// Stat failed with not-found
    Missing,
    /// Any other stat error
    Errored(String),
}

/// Classifier decision: a recommended status (if it differs from the
/// record's) plus the growth-field bookkeeping to record either way.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub next: Option<FileStatus>,
    pub patch: FilePatch,
}

impl Verdict {
    fn keep(patch: FilePatch) -> Self {
        Self { next: None, patch }
    }

    fn go(status: FileStatus, patch: FilePatch) -> Self {
        Self { next: Some(status), patch }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GrowthConfig {
    /// Minimum size before a still-growing file is tailed live.
    pub min_size_bytes: u64,
    /// How long the size must hold still before a normal copy.
    pub stability_timeout_ms: u64,
}

/// Classify one `Discovered` or `Growing` record.
///
/// Callers must not pass records in other states; the returned status is
/// relative to the record's current one (`next == None` keeps it).
pub fn classify(
    file: &TrackedFile,
    obs: Observation,
    now_ms: u64,
    cfg: &GrowthConfig,
) -> Verdict {
    debug_assert!(
        matches!(file.status, FileStatus::Discovered | FileStatus::Growing),
        "classifier called on {}",
        file.status
    );

    let size = match obs {
        Observation::Missing => {
            return Verdict::go(FileStatus::Removed, FilePatch::new());
        }
        Observation::Errored(message) => {
            return Verdict::go(FileStatus::Failed, FilePatch::new().error(message));
        }
        Observation::Size(size) => size,
    };

    // First observation: start the stability window, recommend no move.
    if file.last_growth_check.is_none() {
        let patch = FilePatch::new()
            .previous_size(size)
            .stable_since(now_ms)
            .growth_checked(now_ms);
        return Verdict::keep(patch);
    }

    if size > file.file_size {
        // Still being written. Restart the stability window and decide
        // whether it is big enough to tail live.
        let patch = FilePatch::new()
            .previous_size(file.file_size)
            .size(size)
            .growth_rate(growth_rate_mbps(file, size, now_ms))
            .clear_stable_since()
            .growth_checked(now_ms);
        let next = if size >= cfg.min_size_bytes {
            FileStatus::ReadyToStartGrowing
        } else {
            FileStatus::Growing
        };
        return Verdict::go(next, patch);
    }

    // Size unchanged (or shrunk, which we treat the same): run the
    // stability window.
    let mut patch = FilePatch::new().growth_checked(now_ms);
    if size != file.file_size {
        patch = patch.previous_size(file.file_size).size(size);
    }
    match file.growth_stable_since {
        None => Verdict::keep(patch.stable_since(now_ms)),
        Some(since) if now_ms.saturating_sub(since) >= cfg.stability_timeout_ms => {
            Verdict::go(FileStatus::Ready, patch)
        }
        Some(_) => Verdict::keep(patch),
    }
}

/// Average growth rate in MB/s since first sighting.
fn growth_rate_mbps(file: &TrackedFile, current_size: u64, now_ms: u64) -> f64 {
    let elapsed_ms = now_ms.saturating_sub(file.discovered_at);
    if elapsed_ms == 0 {
        return 0.0;
    }
    let grown = current_size.saturating_sub(file.first_seen_size) as f64;
    (grown / (1024.0 * 1024.0)) / (elapsed_ms as f64 / 1000.0)
}

#[cfg(test)]
#[path = "growth_tests.rs"]
mod tests;
