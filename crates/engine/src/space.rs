// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Space arbitration.
//!
//! Pre-copy space decisions against the monitor's cached destination
//! snapshot, plus the retry ladder: `WaitingForSpace` with a scheduled
//! re-admission, escalating to `SpaceError` (and its cooldown) once the
//! retry budget is spent.

use crate::queue::{CopyJob, CopyQueue};
use crate::state_machine::StateMachine;
use freight_core::{
    Clock, FilePatch, FileStatus, RetryInfo, RetryKind, Settings, SpaceCheckResult, StorageInfo,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Decide whether the destination can take a file of `file_size` bytes.
///
/// Pure function of the cached snapshot and the configured margins, so
/// the policy is testable without a filesystem.
pub fn check_space(
    file_size: u64,
    dest_info: Option<&StorageInfo>,
    settings: &Settings,
) -> SpaceCheckResult {
    let Some(info) = dest_info else {
        return SpaceCheckResult {
            has_space: false,
            available_bytes: 0,
            required_bytes: file_size,
            file_size_bytes: file_size,
            safety_margin_bytes: 0,
            reason: "storage information unavailable - monitoring may not be running".into(),
        };
    };

    if !info.is_accessible {
        let detail = info.error_message.as_deref().unwrap_or("unknown error");
        return SpaceCheckResult {
            has_space: false,
            available_bytes: 0,
            required_bytes: file_size,
            file_size_bytes: file_size,
            safety_margin_bytes: 0,
            reason: format!("destination not accessible: {detail}"),
        };
    }

    let available = info.free_bytes();
    let safety_margin = settings.copy_safety_margin_bytes();
    let min_after = settings.minimum_free_after_copy_bytes();
    let required = file_size + safety_margin + min_after;
    let has_space = available >= required;

    let reason = if has_space {
        format!(
            "sufficient space: {:.1}GB available, {:.1}GB required for {:.1}GB file",
            available as f64 / GB,
            required as f64 / GB,
            file_size as f64 / GB,
        )
    } else {
        format!(
            "insufficient space: {:.1}GB available, {:.1}GB required (shortage: {:.1}GB)",
            available as f64 / GB,
            required as f64 / GB,
            (required - available) as f64 / GB,
        )
    };

    SpaceCheckResult {
        has_space,
        available_bytes: available,
        required_bytes: required,
        file_size_bytes: file_size,
        safety_margin_bytes: safety_margin,
        reason,
    }
}

/// Schedules space retries and the space-error cooldown re-admission.
pub struct SpaceArbiter<C: Clock> {
    settings: Arc<Settings>,
    state_machine: Arc<StateMachine<C>>,
    queue: Arc<CopyQueue>,
    clock: C,
    cancel: CancellationToken,
}

impl<C: Clock> SpaceArbiter<C> {
    pub fn new(
        settings: Arc<Settings>,
        state_machine: Arc<StateMachine<C>>,
        queue: Arc<CopyQueue>,
        clock: C,
        cancel: CancellationToken,
    ) -> Self {
        Self { settings, state_machine, queue, clock, cancel }
    }

    pub fn enabled(&self) -> bool {
        self.settings.enable_pre_copy_space_check
    }

    /// Handle a failed space check for a dequeued job.
    ///
    /// Moves the record to `WaitingForSpace` and schedules the retry;
    /// once the budget is exhausted the record lands in `SpaceError` with
    /// the scanner cooldown armed, and re-admission is scheduled after
    /// the cooldown.
    pub fn handle_insufficient(&self, job: &CopyJob, result: &SpaceCheckResult) {
        let Some(record) = self.state_machine.repository().get(job.file_id) else {
            return;
        };
        let attempts = record.retry_count + 1;
        let delay = self.settings.space_retry_delay();
        let info = RetryInfo {
            reason: result.reason.clone(),
            kind: RetryKind::Space,
            scheduled_at: self.clock.epoch_ms() + delay.as_millis() as u64,
        };

        let waiting = self.state_machine.transition(
            job.file_id,
            FileStatus::WaitingForSpace,
            FilePatch::new()
                .retry_count(attempts)
                .retry(info)
                .error(result.reason.clone()),
        );
        if let Err(error) = waiting {
            warn!(file_id = %job.file_id, %error, "could not enter waiting-for-space");
            return;
        }

        if attempts > self.settings.max_space_retries {
            self.escalate_to_space_error(job, attempts);
        } else {
            info!(
                file_id = %job.file_id,
                attempt = attempts,
                max = self.settings.max_space_retries,
                delay_s = delay.as_secs(),
                "space retry scheduled"
            );
            self.spawn_retry(job.clone(), delay);
        }
    }

    fn escalate_to_space_error(&self, job: &CopyJob, attempts: u32) {
        warn!(
            file_id = %job.file_id,
            attempts,
            "space retries exhausted, entering space-error cooldown"
        );
        if let Err(error) =
            self.state_machine
                .transition(job.file_id, FileStatus::SpaceError, FilePatch::new())
        {
            warn!(file_id = %job.file_id, %error, "could not enter space-error");
            return;
        }
        let cooldown = self.settings.space_error_cooldown();
        let arbiter = self.handles();
        let job = job.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = arbiter.cancel.cancelled() => return,
                () = tokio::time::sleep(cooldown) => {}
            }
            // Re-admission only after cooldown, and only if nothing else
            // moved the record meanwhile.
            let Some(record) = arbiter.state_machine.repository().get(job.file_id) else {
                return;
            };
            if record.status != FileStatus::SpaceError {
                return;
            }
            match arbiter.state_machine.transition(
                job.file_id,
                FileStatus::InQueue,
                FilePatch::new().retry_count(0),
            ) {
                Ok(record) => {
                    info!(file_id = %job.file_id, "space-error cooldown expired, re-admitting");
                    arbiter.queue.push(CopyJob {
                        file_id: job.file_id,
                        file_path: record.file_path.clone(),
                        file_size: record.file_size,
                        is_growing: job.is_growing,
                    });
                }
                Err(error) => {
                    warn!(file_id = %job.file_id, %error, "space-error re-admission failed");
                }
            }
        });
    }

    fn spawn_retry(&self, job: CopyJob, delay: std::time::Duration) {
        let arbiter = self.handles();
        tokio::spawn(async move {
            tokio::select! {
                () = arbiter.cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }
            match arbiter.state_machine.transition(
                job.file_id,
                FileStatus::InQueue,
                FilePatch::new(),
            ) {
                Ok(record) => {
                    arbiter.queue.push(CopyJob {
                        file_id: job.file_id,
                        file_path: record.file_path.clone(),
                        file_size: record.file_size,
                        is_growing: job.is_growing,
                    });
                }
                Err(error) => {
                    warn!(file_id = %job.file_id, %error, "space retry re-admission failed");
                }
            }
        });
    }

    fn handles(&self) -> RetryHandles<C> {
        RetryHandles {
            state_machine: self.state_machine.clone(),
            queue: self.queue.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

struct RetryHandles<C: Clock> {
    state_machine: Arc<StateMachine<C>>,
    queue: Arc<CopyQueue>,
    cancel: CancellationToken,
}

#[cfg(test)]
#[path = "space_tests.rs"]
mod tests;
