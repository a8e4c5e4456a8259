// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

fn cfg(path: PathBuf, warning_gb: f64, critical_gb: f64) -> ProbeConfig {
    ProbeConfig {
        path,
        warning_threshold_gb: warning_gb,
        critical_threshold_gb: critical_gb,
        test_file_prefix: ".freight_test_".into(),
    }
}

#[tokio::test]
async fn writable_directory_probes_ok() {
    let dir = TempDir::new().unwrap();
    let info = probe(cfg(dir.path().to_path_buf(), 0.0, 0.0)).await;
    assert!(info.is_accessible);
    assert!(info.has_write_access);
    assert_eq!(info.status, StorageStatus::Ok);
    assert!(info.total_space_gb > 0.0);
    assert!(info.free_space_gb <= info.total_space_gb);
    assert!(info.error_message.is_none());
}

#[tokio::test]
async fn probe_creates_missing_directory() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("nested").join("dst");
    let info = probe(cfg(target.clone(), 0.0, 0.0)).await;
    assert!(info.is_accessible);
    assert!(target.is_dir());
}

#[tokio::test]
async fn probe_leaves_no_test_file_behind() {
    let dir = TempDir::new().unwrap();
    probe(cfg(dir.path().to_path_buf(), 0.0, 0.0)).await;
    let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "probe left {leftovers:?}");
}

#[tokio::test]
async fn low_space_classifies_warning_and_critical() {
    let dir = TempDir::new().unwrap();
    // Real free space is far below these absurd thresholds.
    let info = probe(cfg(dir.path().to_path_buf(), f64::MAX, 0.0)).await;
    assert_eq!(info.status, StorageStatus::Warning);

    let info = probe(cfg(dir.path().to_path_buf(), f64::MAX, f64::MAX)).await;
    assert_eq!(info.status, StorageStatus::Critical);
}

#[cfg(unix)]
#[tokio::test]
async fn unwritable_directory_is_error() {
    use std::os::unix::fs::PermissionsExt;
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("readonly");
    std::fs::create_dir(&target).unwrap();
    std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o555)).unwrap();

    let info = probe(cfg(target.clone(), 0.0, 0.0)).await;
    // Skip the assertion when running as root, which ignores mode bits.
    if !info.has_write_access {
        assert_eq!(info.status, StorageStatus::Error);
        assert!(info.error_message.is_some());
    }

    std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755)).unwrap();
}
