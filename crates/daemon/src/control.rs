// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control handle: the operations the HTTP layer calls.
//!
//! The HTTP/WebSocket transport is an external collaborator; everything
//! it can do to the daemon goes through this handle.

use crate::lifecycle::RestartSignal;
use freight_core::{Clock, Settings, SettingsError, StorageKind};
use freight_engine::{
    CopyQueue, FailedJob, FileRepository, QueueStatus, ScannerGate, StatsSnapshot, StorageMonitor,
    TransferStats,
};
use freight_wire::{FileSnapshot, InitialState, ScannerStatus, StorageDto};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct ControlHandle<C: Clock> {
    config_path: PathBuf,
    settings: RwLock<Arc<Settings>>,
    repo: Arc<FileRepository>,
    queue: Arc<CopyQueue>,
    gate: Arc<ScannerGate<C>>,
    monitor: Arc<StorageMonitor<C>>,
    stats: Arc<TransferStats>,
    restart: RestartSignal,
}

impl<C: Clock> ControlHandle<C> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config_path: PathBuf,
        settings: Arc<Settings>,
        repo: Arc<FileRepository>,
        queue: Arc<CopyQueue>,
        gate: Arc<ScannerGate<C>>,
        monitor: Arc<StorageMonitor<C>>,
        stats: Arc<TransferStats>,
        restart: RestartSignal,
    ) -> Self {
        Self {
            config_path,
            settings: RwLock::new(settings),
            repo,
            queue,
            gate,
            monitor,
            stats,
            restart,
        }
    }

    /// Current configuration snapshot.
    pub fn settings_snapshot(&self) -> Arc<Settings> {
        self.settings.read().clone()
    }

    /// Re-read the settings file. The new snapshot is returned and kept
    /// for `settings_snapshot`; running tasks pick it up on restart.
    pub fn reload_settings(&self) -> Result<Arc<Settings>, SettingsError> {
        let reloaded = Arc::new(Settings::load(&self.config_path)?);
        *self.settings.write() = reloaded.clone();
        info!(path = %self.config_path.display(), "settings reloaded");
        Ok(reloaded)
    }

    /// Schedule a graceful restart after `delay`.
    pub fn schedule_restart(&self, delay: Duration) {
        self.restart.schedule(delay);
    }

    pub fn pause_scanner(&self) {
        self.gate.pause();
    }

    pub fn resume_scanner(&self) {
        self.gate.resume();
    }

    pub fn scanner_status(&self) -> ScannerStatus {
        ScannerStatus { running: self.gate.is_running() }
    }

    pub fn source_storage(&self) -> Option<StorageDto> {
        self.monitor
            .source_info()
            .map(|info| StorageDto::new(StorageKind::Source, info))
    }

    pub fn destination_storage(&self) -> Option<StorageDto> {
        self.monitor
            .destination_info()
            .map(|info| StorageDto::new(StorageKind::Destination, info))
    }

    pub fn trigger_storage_check(&self, kind: StorageKind) {
        self.monitor.trigger_check(kind);
    }

    pub fn queue_status(&self) -> QueueStatus {
        self.queue.status()
    }

    pub fn failed_jobs(&self) -> Vec<FailedJob> {
        self.queue.failed_jobs()
    }

    pub fn clear_failed_jobs(&self) -> usize {
        self.queue.clear_failed_jobs()
    }

    pub fn statistics(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// One-shot aggregate for UI startup.
    pub fn initial_state(&self) -> InitialState {
        let mut files: Vec<FileSnapshot> =
            self.repo.get_all().iter().map(FileSnapshot::from).collect();
        files.sort_by(|a, b| b.discovered_at.cmp(&a.discovered_at));

        let storage = [
            self.source_storage(),
            self.destination_storage(),
        ]
        .into_iter()
        .flatten()
        .collect();

        InitialState {
            files,
            statistics: self.stats.snapshot(),
            storage,
            scanner: self.scanner_status(),
        }
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
