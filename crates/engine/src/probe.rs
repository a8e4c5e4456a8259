// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage probing: the blocking filesystem checks behind the monitor.
//!
//! Each probe ensures the directory exists, measures free/total space via
//! `fs2`, and proves write access by creating and deleting a uniquely
//! suffixed test file. Every step is bounded so a dead network mount
//! cannot wedge the monitor loop.

use freight_core::{StorageInfo, StorageStatus};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Bound for directory existence/creation on a possibly dead mount.
pub const DIR_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Bound for the space measurement and write test together.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub path: PathBuf,
    pub warning_threshold_gb: f64,
    pub critical_threshold_gb: f64,
    pub test_file_prefix: String,
}

/// Probe a directory, classifying the result against the thresholds.
///
/// Blocking work runs on the tokio blocking pool; the async caller only
/// waits, bounded by the step timeouts.
pub async fn probe(cfg: ProbeConfig) -> StorageInfo {
    let path = cfg.path.clone();
    let ensure = {
        let path = path.clone();
        tokio::task::spawn_blocking(move || std::fs::create_dir_all(&path))
    };
    match tokio::time::timeout(DIR_CHECK_TIMEOUT, ensure).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => {
            return inaccessible(&cfg, format!("directory unavailable: {e}"));
        }
        Ok(Err(join_error)) => {
            return inaccessible(&cfg, format!("directory check failed: {join_error}"));
        }
        Err(_) => {
            return inaccessible(&cfg, "directory check timed out".to_string());
        }
    }

    let blocking_cfg = cfg.clone();
    let measured = tokio::time::timeout(
        PROBE_TIMEOUT,
        tokio::task::spawn_blocking(move || measure(&blocking_cfg)),
    )
    .await;
    match measured {
        Ok(Ok(info)) => info,
        Ok(Err(join_error)) => inaccessible(&cfg, format!("probe failed: {join_error}")),
        Err(_) => inaccessible(&cfg, "storage probe timed out".to_string()),
    }
}

fn measure(cfg: &ProbeConfig) -> StorageInfo {
    let (free, total) = match (
        fs2::available_space(&cfg.path),
        fs2::total_space(&cfg.path),
    ) {
        (Ok(free), Ok(total)) => (free, total),
        (Err(e), _) | (_, Err(e)) => {
            return inaccessible(cfg, format!("space measurement failed: {e}"));
        }
    };

    let has_write_access = match write_test(&cfg.path, &cfg.test_file_prefix) {
        Ok(()) => true,
        Err(e) => {
            debug!(path = %cfg.path.display(), error = %e, "write test failed");
            false
        }
    };

    let free_gb = free as f64 / BYTES_PER_GB;
    let total_gb = total as f64 / BYTES_PER_GB;
    let status = if !has_write_access {
        StorageStatus::Error
    } else if free_gb < cfg.critical_threshold_gb {
        StorageStatus::Critical
    } else if free_gb < cfg.warning_threshold_gb {
        StorageStatus::Warning
    } else {
        StorageStatus::Ok
    };

    StorageInfo {
        path: cfg.path.clone(),
        is_accessible: true,
        has_write_access,
        free_space_gb: free_gb,
        total_space_gb: total_gb,
        used_space_gb: (total_gb - free_gb).max(0.0),
        status,
        warning_threshold_gb: cfg.warning_threshold_gb,
        critical_threshold_gb: cfg.critical_threshold_gb,
        last_checked: chrono::Utc::now(),
        error_message: if has_write_access {
            None
        } else {
            Some("write test failed".to_string())
        },
    }
}

/// Create and remove a uniquely named file to prove write access.
fn write_test(dir: &Path, prefix: &str) -> std::io::Result<()> {
    let name = format!("{}{}", prefix, nanoid::nanoid!(8));
    let test_path = dir.join(name);
    std::fs::write(&test_path, b"freight storage probe")?;
    std::fs::remove_file(&test_path)?;
    Ok(())
}

fn inaccessible(cfg: &ProbeConfig, message: String) -> StorageInfo {
    StorageInfo {
        path: cfg.path.clone(),
        is_accessible: false,
        has_write_access: false,
        free_space_gb: 0.0,
        total_space_gb: 0.0,
        used_space_gb: 0.0,
        status: StorageStatus::Error,
        warning_threshold_gb: cfg.warning_threshold_gb,
        critical_threshold_gb: cfg.critical_threshold_gb,
        last_checked: chrono::Utc::now(),
        error_message: Some(message),
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
