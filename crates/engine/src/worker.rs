// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Copy workers.
//!
//! Each worker pulls a job, gates on destination health and space,
//! drives the copy engine, and converts the outcome into a state
//! transition. Errors never escape a worker; they are classified and
//! recorded.

use crate::classifier::{classify_copy_error, ClassifyCtx};
use crate::copy::{CopyEngine, CopyError};
use crate::monitor::StorageMonitor;
use crate::queue::{CopyJob, CopyQueue, FailedJob};
use crate::space::{check_space, SpaceArbiter};
use crate::state_machine::StateMachine;
use crate::stats::TransferStats;
use freight_core::{Clock, FilePatch, FileStatus, RetryInfo, RetryKind, Settings};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct WorkerPool<C: Clock> {
    deps: Arc<WorkerDeps<C>>,
}

pub struct WorkerDeps<C: Clock> {
    pub settings: Arc<Settings>,
    pub queue: Arc<CopyQueue>,
    pub state_machine: Arc<StateMachine<C>>,
    pub engine: Arc<CopyEngine<C>>,
    pub arbiter: Arc<SpaceArbiter<C>>,
    pub monitor: Arc<StorageMonitor<C>>,
    pub stats: Arc<TransferStats>,
    pub clock: C,
}

impl<C: Clock> WorkerPool<C> {
    pub fn new(deps: WorkerDeps<C>) -> Self {
        Self { deps: Arc::new(deps) }
    }

    /// Spawn the configured number of workers.
    pub fn spawn(&self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        let count = self.deps.settings.max_concurrent_copies.max(1);
        info!(workers = count, "starting copy workers");
        (0..count)
            .map(|index| {
                let deps = self.deps.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move { worker_loop(index, deps, cancel).await })
            })
            .collect()
    }
}

async fn worker_loop<C: Clock>(index: usize, deps: Arc<WorkerDeps<C>>, cancel: CancellationToken) {
    debug!(worker = index, "worker started");
    loop {
        let job = tokio::select! {
            () = cancel.cancelled() => break,
            job = deps.queue.pop() => match job {
                Some(job) => job,
                None => break,
            },
        };
        process(&deps, job, &cancel).await;
    }
    debug!(worker = index, "worker stopped");
}

async fn process<C: Clock>(deps: &WorkerDeps<C>, job: CopyJob, cancel: &CancellationToken) {
    // Destination gate: a job picked up while the destination is down
    // parks on the network; the monitor re-admits it on recovery.
    let dest_info = deps.monitor.destination_info();
    if dest_info.as_ref().is_some_and(|i| i.status.is_problematic()) {
        let reason = "destination unavailable".to_string();
        let info = RetryInfo {
            reason: reason.clone(),
            kind: RetryKind::Network,
            scheduled_at: deps.clock.epoch_ms(),
        };
        if let Err(error) = deps.state_machine.transition(
            job.file_id,
            FileStatus::WaitingForNetwork,
            FilePatch::new().retry(info).error(reason),
        ) {
            warn!(file_id = %job.file_id, %error, "could not park job on network");
        }
        return;
    }

    // Pre-copy space check.
    if deps.arbiter.enabled() {
        let result = check_space(job.file_size, dest_info.as_ref(), &deps.settings);
        if !result.has_space {
            info!(file_id = %job.file_id, reason = %result.reason, "space check failed");
            deps.arbiter.handle_insufficient(&job, &result);
            return;
        }
    }

    let target = if job.is_growing {
        FileStatus::GrowingCopy
    } else {
        FileStatus::Copying
    };
    let record = match deps.state_machine.transition(
        job.file_id,
        target,
        FilePatch::new().bytes_copied(0).progress(0.0),
    ) {
        Ok(record) => record,
        Err(error) => {
            // The record was removed or failed while queued.
            debug!(file_id = %job.file_id, %error, "job no longer runnable");
            return;
        }
    };
    info!(
        file_id = %job.file_id,
        path = %record.file_path.display(),
        growing = job.is_growing,
        "copy started"
    );

    let started = Instant::now();
    match deps.engine.execute(&job, cancel).await {
        Ok(bytes) => {
            let elapsed = started.elapsed().as_secs_f64();
            deps.stats.record_success(bytes, elapsed, deps.clock.epoch_ms());
            if let Err(error) = deps.state_machine.transition(
                job.file_id,
                FileStatus::Completed,
                FilePatch::new().size(bytes).bytes_copied(bytes).progress(100.0),
            ) {
                warn!(file_id = %job.file_id, %error, "completion transition failed");
            }
        }
        Err(CopyError::Cancelled) => {
            debug!(file_id = %job.file_id, "copy cancelled during shutdown");
        }
        Err(error) => {
            let source_exists = tokio::fs::try_exists(&job.file_path).await.unwrap_or(false);
            let outcome = classify_copy_error(&ClassifyCtx {
                error: &error,
                source_exists,
                destination_status: deps.monitor.destination_info().map(|i| i.status),
            });
            warn!(
                file_id = %job.file_id,
                %error,
                outcome = %outcome.status,
                reason = %outcome.reason,
                "copy failed"
            );
            if outcome.status == FileStatus::Failed {
                deps.stats.record_failure();
                deps.queue.record_failed(FailedJob {
                    file_id: job.file_id,
                    file_path: job.file_path.clone(),
                    error: outcome.reason.clone(),
                    failed_at: deps.clock.epoch_ms(),
                });
            }
            if let Err(error) = deps.state_machine.transition(
                job.file_id,
                outcome.status,
                FilePatch::new().error(outcome.reason),
            ) {
                warn!(file_id = %job.file_id, %error, "failure transition rejected");
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
