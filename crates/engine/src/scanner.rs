// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source-tree scanner.
//!
//! Walks the source directory on a polling interval, creates records for
//! new `.mxf` files, feeds `Discovered`/`Growing` records through the
//! growth classifier, and evicts aged history. Pausable: while paused the
//! loop does no I/O at all.

use crate::bus::EventBus;
use crate::growth::{self, GrowthConfig, Observation};
use crate::repository::FileRepository;
use crate::state_machine::StateMachine;
use freight_core::{Clock, Event, FileStatus, Settings, TrackedFile};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const WATCHED_EXTENSION: &str = "mxf";
const ERROR_BACKOFF: std::time::Duration = std::time::Duration::from_secs(5);

/// Shared pause/resume switch for the scanner.
///
/// Flipping the gate publishes `scanner:status_changed`; the scanner task
/// itself only observes the watch channel.
pub struct ScannerGate<C: Clock> {
    sender: watch::Sender<bool>,
    bus: EventBus,
    clock: C,
}

impl<C: Clock> ScannerGate<C> {
    pub fn new(bus: EventBus, clock: C) -> Self {
        let (sender, _) = watch::channel(true);
        Self { sender, bus, clock }
    }

    pub fn pause(&self) {
        if self.sender.send_replace(false) {
            info!("scanner paused");
            self.bus.publish(Event::ScannerStatusChanged {
                running: false,
                timestamp: self.clock.epoch_ms(),
            });
        }
    }

    pub fn resume(&self) {
        if !self.sender.send_replace(true) {
            info!("scanner resumed");
            self.bus.publish(Event::ScannerStatusChanged {
                running: true,
                timestamp: self.clock.epoch_ms(),
            });
        }
    }

    pub fn is_running(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

pub struct Scanner<C: Clock> {
    settings: Arc<Settings>,
    state_machine: Arc<StateMachine<C>>,
    gate: Arc<ScannerGate<C>>,
    clock: C,
}

impl<C: Clock> Scanner<C> {
    pub fn new(
        settings: Arc<Settings>,
        state_machine: Arc<StateMachine<C>>,
        gate: Arc<ScannerGate<C>>,
        clock: C,
    ) -> Self {
        Self { settings, state_machine, gate, clock }
    }

    /// Scanner loop: scan, classify, evict, sleep. Errors inside one
    /// iteration are logged and the loop continues after a short delay.
    pub async fn run(self, cancel: CancellationToken) {
        let mut gate_rx = self.gate.subscribe();
        info!(
            source = %self.settings.source_directory.display(),
            interval_s = self.settings.polling_interval_seconds,
            stability_s = self.settings.file_stable_time_seconds,
            "scanner started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }
            // While paused, wait for the gate without touching the disk.
            if !*gate_rx.borrow() {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    result = gate_rx.changed() => {
                        if result.is_err() {
                            break;
                        }
                        continue;
                    }
                }
            }

            let sleep = match self.scan_iteration().await {
                Ok(stats) => {
                    debug!(
                        seen = stats.seen,
                        created = stats.created,
                        evicted = stats.evicted,
                        "scan iteration complete"
                    );
                    self.settings.polling_interval()
                }
                Err(e) => {
                    error!(error = %e, "scan iteration failed");
                    ERROR_BACKOFF
                }
            };

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(sleep) => {}
                _ = gate_rx.changed() => {}
            }
        }
        info!("scanner stopped");
    }

    async fn scan_iteration(&self) -> std::io::Result<ScanStats> {
        let now = self.clock.epoch_ms();
        let repo = self.state_machine.repository();
        let mut stats = ScanStats::default();

        let paths = self.walk_source().await?;
        stats.seen = paths.len();

        for path in &paths {
            if repo.should_skip(path, now, self.settings.space_error_cooldown()) {
                debug!(path = %path.display(), "path in space-error cooldown, skipping");
                continue;
            }
            match repo.active_by_path(path) {
                None => {
                    if self.discover(path).await {
                        stats.created += 1;
                    }
                }
                Some(record) => self.observe_existing(&record).await,
            }
        }

        self.classify_pending(repo, now).await;

        stats.evicted = repo.evict_aged(
            now,
            self.settings.keep_completed_files_hours,
            self.settings.max_completed_files_in_memory,
        );
        Ok(stats)
    }

    /// Walk the source tree collecting watched files.
    async fn walk_source(&self) -> std::io::Result<Vec<PathBuf>> {
        let root = &self.settings.source_directory;
        if !tokio::fs::try_exists(root).await.unwrap_or(false) {
            debug!(root = %root.display(), "source directory does not exist");
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        let mut pending = VecDeque::from([root.clone()]);
        while let Some(dir) = pending.pop_front() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "cannot read directory");
                    continue;
                }
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = match entry.file_type().await {
                    Ok(t) => t,
                    Err(_) => continue,
                };
                if file_type.is_dir() {
                    pending.push_back(path);
                } else if self.is_watched_file(&path) {
                    found.push(path);
                }
            }
        }
        Ok(found)
    }

    fn is_watched_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let watched_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(WATCHED_EXTENSION));
        watched_ext && !is_ignored_name(name, &self.settings.storage_test_file_prefix)
    }

    /// Stat a new path and create its record. Zero-byte files are not
    /// admitted; they are picked up once they have content.
    async fn discover(&self, path: &Path) -> bool {
        let size = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "stat failed during discovery");
                return false;
            }
        };
        if size == 0 {
            debug!(path = %path.display(), "skipping empty file");
            return false;
        }
        match self.state_machine.create(path, size) {
            Ok(_) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not create record");
                false
            }
        }
    }

    /// Record size changes on active records that the classifier does
    /// not manage. The record's status is never touched here.
    async fn observe_existing(&self, record: &TrackedFile) {
        if matches!(record.status, FileStatus::Discovered | FileStatus::Growing) {
            return; // The classification pass stats these itself.
        }
        if let Ok(meta) = tokio::fs::metadata(&record.file_path).await {
            if meta.len() != record.file_size {
                if let Err(e) = self.state_machine.record_size(record.id, meta.len()) {
                    warn!(file_id = %record.id, error = %e, "size update failed");
                }
            }
        }
    }

    /// Run the growth classifier over every `Discovered`/`Growing`
    /// record and request the recommended transitions.
    async fn classify_pending(&self, repo: &Arc<FileRepository>, now: u64) {
        let cfg = GrowthConfig {
            min_size_bytes: self.settings.growing_min_size_bytes(),
            stability_timeout_ms: self.settings.stability_timeout().as_millis() as u64,
        };
        let candidates: Vec<_> = repo
            .get_all()
            .into_iter()
            .filter(|f| matches!(f.status, FileStatus::Discovered | FileStatus::Growing))
            .collect();

        for record in candidates {
            let obs = match tokio::fs::metadata(&record.file_path).await {
                Ok(meta) => Observation::Size(meta.len()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Observation::Missing,
                Err(e) => Observation::Errored(e.to_string()),
            };
            let verdict = growth::classify(&record, obs, now, &cfg);
            let result = match verdict.next {
                Some(next) if next != record.status => {
                    self.state_machine.transition(record.id, next, verdict.patch).map(|_| ())
                }
                _ => self.state_machine.record_growth(record.id, verdict.patch),
            };
            if let Err(e) = result {
                // A worker or the arbiter may have raced us; log and move on.
                debug!(file_id = %record.id, error = %e, "classifier update not applied");
            }
        }
    }
}

fn is_ignored_name(name: &str, test_prefix: &str) -> bool {
    name.starts_with(test_prefix)
        || name == ".DS_Store"
        || name.starts_with("._")
        || name.starts_with('.')
}

#[derive(Debug, Default)]
struct ScanStats {
    seen: usize,
    created: usize,
    evicted: usize,
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
