// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup wiring, supervision, shutdown.
//!
//! The composition root builds every engine piece, resolves the
//! monitor/queue cycle by installing the queue handle after both exist,
//! and spawns all long-running tasks under one cancellation token.

use crate::control::ControlHandle;
use crate::presentation::Presentation;
use freight_adapters::platform_mounter;
use freight_core::{Settings, SettingsError, SystemClock};
use freight_engine::{
    CopyEngine, CopyQueue, EventBus, FileRepository, FlatLayout, QueueProducer, Scanner,
    ScannerGate, SpaceArbiter, StateMachine, StorageMonitor, TransferStats, WorkerDeps, WorkerPool,
};
use fs2::FileExt;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Exit code asking the process manager to start a fresh instance.
pub const RESTART_EXIT_CODE: i32 = 75;

const QUEUE_CAPACITY: usize = 1024;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("failed to acquire pid lock at {0}: daemon already running?")]
    LockFailed(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Requests a graceful restart of the whole process.
#[derive(Clone)]
pub struct RestartSignal {
    cancel: CancellationToken,
    requested: Arc<AtomicBool>,
}

impl RestartSignal {
    fn new(cancel: CancellationToken) -> Self {
        Self { cancel, requested: Arc::new(AtomicBool::new(false)) }
    }

    /// Flag a restart and cancel the daemon after `delay`.
    pub fn schedule(&self, delay: Duration) {
        info!(delay_s = delay.as_secs(), "restart scheduled");
        let signal = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            signal.requested.store(true, Ordering::SeqCst);
            signal.cancel.cancel();
        });
    }

    pub fn restart_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// A running daemon and the handles the control surface needs.
pub struct Daemon {
    pub control: Arc<ControlHandle<SystemClock>>,
    pub presentation: Arc<Presentation>,
    queue: Arc<CopyQueue>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    restart: RestartSignal,
    pid_path: PathBuf,
    // NOTE(lifetime): held to keep the exclusive pid lock; released on drop
    #[allow(dead_code)]
    pid_lock: File,
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon").field("pid_path", &self.pid_path).finish_non_exhaustive()
    }
}

/// Build and start every component. The scanner rebuilds all state by
/// re-observing the source tree; nothing is loaded from disk.
pub async fn startup(config_path: PathBuf, settings: Settings) -> Result<Daemon, LifecycleError> {
    let pid_path = crate::env::pid_path(&config_path);
    let pid_lock = acquire_pid_lock(&pid_path)?;

    let settings = Arc::new(settings);
    let clock = SystemClock;
    let cancel = CancellationToken::new();
    let bus = EventBus::default();
    let repo = Arc::new(FileRepository::new());
    let state_machine = Arc::new(StateMachine::new(repo.clone(), bus.clone(), clock));
    let queue = Arc::new(CopyQueue::new(QUEUE_CAPACITY));
    let gate = Arc::new(ScannerGate::new(bus.clone(), clock));
    let stats = Arc::new(TransferStats::new());

    let mounter = platform_mounter(&settings);
    let monitor = Arc::new(StorageMonitor::new(settings.clone(), bus.clone(), mounter));
    monitor.set_pipeline(queue.clone(), state_machine.clone());

    let engine = Arc::new(CopyEngine::new(
        settings.clone(),
        state_machine.clone(),
        Arc::new(FlatLayout),
    ));
    let arbiter = Arc::new(SpaceArbiter::new(
        settings.clone(),
        state_machine.clone(),
        queue.clone(),
        clock,
        cancel.clone(),
    ));
    let presentation = Arc::new(Presentation::new(&state_machine, bus.clone()));

    let mut tasks = Vec::new();
    tasks.push(tokio::spawn(
        monitor.clone().run(cancel.clone()),
    ));
    tasks.push(tokio::spawn(
        QueueProducer::new(queue.clone(), state_machine.clone(), bus.clone()).run(cancel.clone()),
    ));
    tasks.push(tokio::spawn(
        Scanner::new(settings.clone(), state_machine.clone(), gate.clone(), clock)
            .run(cancel.clone()),
    ));
    tasks.push(tokio::spawn(presentation.clone().run(cancel.clone())));

    let pool = WorkerPool::new(WorkerDeps {
        settings: settings.clone(),
        queue: queue.clone(),
        state_machine: state_machine.clone(),
        engine,
        arbiter,
        monitor: monitor.clone(),
        stats: stats.clone(),
        clock,
    });
    tasks.extend(pool.spawn(cancel.clone()));

    let restart = RestartSignal::new(cancel.clone());
    let control = Arc::new(ControlHandle::new(
        config_path,
        settings,
        repo,
        queue.clone(),
        gate,
        monitor,
        stats,
        restart.clone(),
    ));

    info!("freightd started");
    Ok(Daemon {
        control,
        presentation,
        queue,
        cancel,
        tasks,
        restart,
        pid_path,
        pid_lock,
    })
}

/// Wait for a shutdown signal (or a scheduled restart), then stop all
/// tasks. Returns the process exit code.
pub async fn run(daemon: Daemon) -> i32 {
    wait_for_shutdown(&daemon.cancel).await;
    let restart = daemon.restart.restart_requested();
    daemon.shutdown().await;
    if restart {
        RESTART_EXIT_CODE
    } else {
        0
    }
}

impl Daemon {
    /// Stop every task, bounded by a grace period, and release the pid
    /// lock.
    pub async fn shutdown(self) {
        info!("shutting down");
        self.cancel.cancel();
        self.queue.close();

        let joins = async {
            for task in self.tasks {
                let _ = task.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_GRACE, joins).await.is_err() {
            warn!("some tasks did not stop within the grace period");
        }

        if self.pid_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.pid_path) {
                warn!(path = %self.pid_path.display(), error = %e, "failed to remove pid file");
            }
        }
        info!("shutdown complete");
    }

    /// Cancellation token shared by every task (used by tests).
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

async fn wait_for_shutdown(cancel: &CancellationToken) {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(e) => {
                warn!(error = %e, "cannot install SIGTERM handler");
                cancel.cancelled().await;
                return;
            }
        };
        tokio::select! {
            () = cancel.cancelled() => {}
            _ = tokio::signal::ctrl_c() => info!("interrupt received"),
            _ = sigterm.recv() => info!("SIGTERM received"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::select! {
            () = cancel.cancelled() => {}
            _ = tokio::signal::ctrl_c() => info!("interrupt received"),
        }
    }
}

fn acquire_pid_lock(path: &PathBuf) -> Result<File, LifecycleError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path)?;
    file.try_lock_exclusive()
        .map_err(|_| LifecycleError::LockFailed(path.clone()))?;
    let _ = writeln!(file, "{}", std::process::id());
    Ok(file)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
