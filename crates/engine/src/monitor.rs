// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage monitor.
//!
//! Polls source and destination health on an interval, attempts the
//! platform network mount when the destination disappears, and publishes
//! status and mount events. Destination loss pauses the copy queue;
//! recovery resumes it and re-admits records parked in
//! `WaitingForNetwork`.
//!
//! The monitor and the queue reference each other; the composition root
//! builds both and installs the queue handle afterwards.

use crate::bus::EventBus;
use crate::probe::{self, ProbeConfig};
use crate::queue::{CopyJob, CopyQueue};
use crate::state_machine::StateMachine;
use freight_core::{
    Clock, Event, FilePatch, FileStatus, MountPhase, Settings, StorageInfo, StorageKind,
    StorageStatus,
};
use freight_adapters::MountAdapter;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Default)]
struct CachedState {
    source: Option<StorageInfo>,
    destination: Option<StorageInfo>,
}

struct Pipeline<C: Clock> {
    queue: Arc<CopyQueue>,
    state_machine: Arc<StateMachine<C>>,
}

pub struct StorageMonitor<C: Clock> {
    settings: Arc<Settings>,
    bus: EventBus,
    mounter: Arc<dyn MountAdapter>,
    state: Mutex<CachedState>,
    pipeline: OnceLock<Pipeline<C>>,
    nudge_tx: mpsc::Sender<StorageKind>,
    nudge_rx: Mutex<Option<mpsc::Receiver<StorageKind>>>,
}

impl<C: Clock> StorageMonitor<C> {
    pub fn new(settings: Arc<Settings>, bus: EventBus, mounter: Arc<dyn MountAdapter>) -> Self {
        let (nudge_tx, nudge_rx) = mpsc::channel(8);
        Self {
            settings,
            bus,
            mounter,
            state: Mutex::new(CachedState::default()),
            pipeline: OnceLock::new(),
            nudge_tx,
            nudge_rx: Mutex::new(Some(nudge_rx)),
        }
    }

    /// Install the queue/state-machine handles. Called once by the
    /// composition root after both sides exist.
    pub fn set_pipeline(&self, queue: Arc<CopyQueue>, state_machine: Arc<StateMachine<C>>) {
        if self.pipeline.set(Pipeline { queue, state_machine }).is_err() {
            warn!("monitor pipeline installed twice, keeping the first");
        }
    }

    /// Most recent completed source snapshot.
    pub fn source_info(&self) -> Option<StorageInfo> {
        self.state.lock().source.clone()
    }

    /// Most recent completed destination snapshot.
    pub fn destination_info(&self) -> Option<StorageInfo> {
        self.state.lock().destination.clone()
    }

    /// Request an out-of-band re-check of one directory.
    pub fn trigger_check(&self, kind: StorageKind) {
        if self.nudge_tx.try_send(kind).is_err() {
            debug!(%kind, "immediate-check request dropped, one already pending");
        }
    }

    /// Monitor loop. Checks both directories immediately, then on the
    /// configured interval, with nudges jumping the wait.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut nudges = match self.nudge_rx.lock().take() {
            Some(rx) => rx,
            None => {
                warn!("storage monitor started twice");
                return;
            }
        };
        let interval = self.settings.storage_check_interval();
        info!(interval_s = interval.as_secs(), "storage monitor started");

        loop {
            self.check(StorageKind::Source).await;
            self.check(StorageKind::Destination).await;

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
                nudge = nudges.recv() => {
                    if let Some(kind) = nudge {
                        debug!(%kind, "immediate storage check requested");
                        self.check(kind).await;
                    }
                }
            }
        }
        info!("storage monitor stopped");
    }

    async fn check(&self, kind: StorageKind) {
        let cfg = self.probe_config(kind);
        let mut info = probe::probe(cfg.clone()).await;

        if kind == StorageKind::Destination && !info.is_accessible {
            if let Some(recovered) = self.try_mount(&cfg).await {
                info = recovered;
            }
        }

        self.apply_check_result(kind, info);
    }

    fn probe_config(&self, kind: StorageKind) -> ProbeConfig {
        match kind {
            StorageKind::Source => ProbeConfig {
                path: self.settings.source_directory.clone(),
                warning_threshold_gb: self.settings.source_warning_threshold_gb,
                critical_threshold_gb: self.settings.source_critical_threshold_gb,
                test_file_prefix: self.settings.storage_test_file_prefix.clone(),
            },
            StorageKind::Destination => ProbeConfig {
                path: self.settings.destination_directory.clone(),
                warning_threshold_gb: self.settings.destination_warning_threshold_gb,
                critical_threshold_gb: self.settings.destination_critical_threshold_gb,
                test_file_prefix: self.settings.storage_test_file_prefix.clone(),
            },
        }
    }

    /// Attempt the platform mount for an inaccessible destination.
    /// Returns a fresh probe result when the mount produced one.
    async fn try_mount(&self, cfg: &ProbeConfig) -> Option<StorageInfo> {
        let configured =
            self.settings.enable_auto_mount && self.settings.network_share_url.is_some();
        if !configured {
            self.bus.publish(Event::MountStatusChanged {
                phase: MountPhase::NotConfigured,
                share_url: None,
                target_path: cfg.path.clone(),
            });
            return None;
        }
        let share_url = self.settings.network_share_url.clone()?;

        info!(%share_url, target = %cfg.path.display(), "attempting network mount");
        self.bus.publish(Event::MountStatusChanged {
            phase: MountPhase::Attempt,
            share_url: Some(share_url.clone()),
            target_path: cfg.path.clone(),
        });

        let mounted = match self.mounter.attempt_mount(&share_url).await {
            Ok(result) => result,
            Err(error) => {
                warn!(%share_url, %error, "mount attempt errored");
                false
            }
        };
        let verification = self.mounter.verify_mount(&cfg.path).await;
        let usable = mounted && verification.mounted && verification.accessible;

        self.bus.publish(Event::MountStatusChanged {
            phase: if usable { MountPhase::Succeeded } else { MountPhase::Failed },
            share_url: Some(share_url.clone()),
            target_path: cfg.path.clone(),
        });

        if usable {
            info!(%share_url, "mount succeeded, re-checking storage");
            Some(probe::probe(cfg.clone()).await)
        } else {
            None
        }
    }

    /// Fold a completed check into the cache, publishing the status
    /// change and driving queue admission.
    pub(crate) fn apply_check_result(&self, kind: StorageKind, info: StorageInfo) {
        let old_status = {
            let mut state = self.state.lock();
            let slot = match kind {
                StorageKind::Source => &mut state.source,
                StorageKind::Destination => &mut state.destination,
            };
            let old = slot.as_ref().map(|i| i.status);
            *slot = Some(info.clone());
            old
        };

        if old_status != Some(info.status) {
            info!(
                %kind,
                old = %old_status.map(|s| s.to_string()).unwrap_or_else(|| "none".into()),
                new = %info.status,
                free_gb = info.free_space_gb,
                "storage status changed"
            );
            self.bus.publish(Event::StorageStatusChanged { kind, info: info.clone() });
        }

        if kind == StorageKind::Destination {
            self.drive_admission(old_status, info.status);
        }
    }

    fn drive_admission(&self, old: Option<StorageStatus>, new: StorageStatus) {
        let Some(pipeline) = self.pipeline.get() else {
            return;
        };
        let was_problematic = old.is_some_and(|s| s.is_problematic());

        if new.is_problematic() && !was_problematic {
            pipeline.queue.pause();
        } else if !new.is_problematic() && new == StorageStatus::Ok && was_problematic {
            pipeline.queue.resume();
            self.readmit_network_waiters(pipeline);
        }
    }

    /// Destination recovered: everything parked on the network comes
    /// back into the queue.
    fn readmit_network_waiters(&self, pipeline: &Pipeline<C>) {
        let waiting: Vec<_> = pipeline
            .state_machine
            .repository()
            .get_all()
            .into_iter()
            .filter(|f| f.status == FileStatus::WaitingForNetwork)
            .collect();
        if waiting.is_empty() {
            return;
        }
        info!(count = waiting.len(), "re-admitting network waiters after recovery");
        for record in waiting {
            match pipeline.state_machine.transition(
                record.id,
                FileStatus::InQueue,
                FilePatch::new(),
            ) {
                Ok(updated) => {
                    pipeline.queue.push(CopyJob {
                        file_id: updated.id,
                        file_path: updated.file_path.clone(),
                        file_size: updated.file_size,
                        is_growing: false,
                    });
                }
                Err(error) => {
                    warn!(file_id = %record.id, %error, "network waiter re-admission failed");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
