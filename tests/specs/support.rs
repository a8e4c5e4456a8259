// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for the scenario tests.

use freight_core::Settings;
use freight_daemon::lifecycle::{startup, Daemon};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub struct Harness {
    pub dir: TempDir,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub daemon: Option<Daemon>,
}

impl Harness {
    /// Fast-cadence settings: 1 s polling, 1 s stability, growing files
    /// tailed from 1 MB with a 2 s growth timeout.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(tune: impl FnOnce(&mut Settings)) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let source = dir.path().join("src");
        let destination = dir.path().join("dst");
        std::fs::create_dir_all(&source).expect("source dir");

        let mut settings = Settings::builder()
            .source_directory(&source)
            .destination_directory(&destination)
            .polling_interval_seconds(1)
            .file_stable_time_seconds(1)
            .storage_check_interval_seconds(3600)
            .growing_file_min_size_mb(1)
            .build();
        tune(&mut settings);

        let config_path = dir.path().join("freight.toml");
        std::fs::write(&config_path, toml::to_string(&settings).expect("toml"))
            .expect("write config");

        let daemon = startup(config_path, settings).await.expect("startup");
        Self { dir, source, destination, daemon: Some(daemon) }
    }

    pub fn control(&self) -> &freight_daemon::ControlHandle<freight_core::SystemClock> {
        &self.daemon.as_ref().expect("daemon running").control
    }

    pub fn write_source(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.source.join(name);
        std::fs::write(&path, data).expect("write source");
        path
    }

    /// Wait until `predicate` holds, with a generous bound.
    pub async fn wait_for(&self, what: &str, predicate: impl Fn() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
        while !predicate() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {what}"
            );
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    pub fn published(&self, name: &str) -> PathBuf {
        self.destination.join(name)
    }

    pub async fn stop(mut self) {
        if let Some(daemon) = self.daemon.take() {
            daemon.shutdown().await;
        }
    }
}

pub fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
