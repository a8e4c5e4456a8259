// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Copy queue: a bounded FIFO with admission control.
//!
//! Jobs enter when the producer sees a record become `Ready` or
//! `ReadyToStartGrowing`. While the destination is unhealthy the queue is
//! paused: jobs keep buffering but workers stop picking new items. A
//! bounded failed-jobs list is kept for the control surface, distinct
//! from the repository.

use crate::bus::EventBus;
use crate::state_machine::StateMachine;
use freight_core::{Clock, Event, FileId, FilePatch, FileStatus};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const FAILED_JOBS_CAP: usize = 100;

/// Unit of work for the copy workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyJob {
    pub file_id: FileId,
    pub file_path: PathBuf,
    pub file_size: u64,
    pub is_growing: bool,
}

/// A job whose final outcome was `Failed`, kept for the control surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedJob {
    pub file_id: FileId,
    pub file_path: PathBuf,
    pub error: String,
    /// Epoch milliseconds
    pub failed_at: u64,
}

/// Queue state snapshot for the control surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub running: bool,
    pub size: usize,
    pub is_empty: bool,
}

struct QueueInner {
    items: VecDeque<CopyJob>,
    paused: bool,
    closed: bool,
    failed: VecDeque<FailedJob>,
}

pub struct CopyQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
    capacity: usize,
}

impl CopyQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::new(),
                paused: false,
                closed: false,
                failed: VecDeque::new(),
            }),
            notify: Notify::new(),
            capacity,
        }
    }

    /// Enqueue a job. Duplicate file ids are ignored; when the soft cap
    /// is exceeded the oldest job is dropped with a warning.
    pub fn push(&self, job: CopyJob) {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return;
            }
            if inner.items.iter().any(|j| j.file_id == job.file_id) {
                debug!(file_id = %job.file_id, "job already queued, ignoring");
                return;
            }
            inner.items.push_back(job);
            if inner.items.len() > self.capacity {
                if let Some(dropped) = inner.items.pop_front() {
                    warn!(
                        file_id = %dropped.file_id,
                        capacity = self.capacity,
                        "queue over capacity, dropping oldest job"
                    );
                }
            }
        }
        self.notify.notify_one();
    }

    /// Wait for the next job. Returns `None` once the queue is closed.
    /// While paused, buffered jobs are withheld from workers.
    pub async fn pop(&self) -> Option<CopyJob> {
        loop {
            {
                let mut inner = self.inner.lock();
                if inner.closed {
                    return None;
                }
                if !inner.paused {
                    if let Some(job) = inner.items.pop_front() {
                        return Some(job);
                    }
                }
            }
            self.notify.notified().await;
        }
    }

    /// Stop handing out jobs (destination unhealthy).
    pub fn pause(&self) {
        let mut inner = self.inner.lock();
        if !inner.paused {
            inner.paused = true;
            info!("copy queue paused");
        }
    }

    /// Resume handing out jobs after recovery.
    pub fn resume(&self) {
        {
            let mut inner = self.inner.lock();
            if !inner.paused {
                return;
            }
            inner.paused = false;
            info!(buffered = inner.items.len(), "copy queue resumed");
        }
        self.notify.notify_waiters();
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }

    /// Close the queue; waiting workers drain out with `None`.
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn status(&self) -> QueueStatus {
        let inner = self.inner.lock();
        QueueStatus {
            running: !inner.paused && !inner.closed,
            size: inner.items.len(),
            is_empty: inner.items.is_empty(),
        }
    }

    /// Record a terminally failed job (bounded, drop-oldest).
    pub fn record_failed(&self, job: FailedJob) {
        let mut inner = self.inner.lock();
        inner.failed.push_back(job);
        while inner.failed.len() > FAILED_JOBS_CAP {
            inner.failed.pop_front();
        }
    }

    pub fn failed_jobs(&self) -> Vec<FailedJob> {
        self.inner.lock().failed.iter().cloned().collect()
    }

    /// Clear the failed-jobs list. Does not touch the repository.
    pub fn clear_failed_jobs(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.failed.len();
        inner.failed.clear();
        count
    }
}

/// Subscribes to status events and admits ready files into the queue.
pub struct QueueProducer<C: Clock> {
    queue: Arc<CopyQueue>,
    state_machine: Arc<StateMachine<C>>,
    bus: EventBus,
}

impl<C: Clock> QueueProducer<C> {
    pub fn new(queue: Arc<CopyQueue>, state_machine: Arc<StateMachine<C>>, bus: EventBus) -> Self {
        Self { queue, state_machine, bus }
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut rx = self.bus.subscribe();
        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => break,
                received = rx.recv() => match received {
                    Ok(event) => event,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "queue producer lagged behind the event bus");
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
            };

            let Event::FileStatusChanged { file_id, new_status, .. } = event else {
                continue;
            };
            let is_growing = match new_status {
                FileStatus::Ready => false,
                FileStatus::ReadyToStartGrowing => true,
                _ => continue,
            };
            self.admit(file_id, is_growing);
        }
        debug!("queue producer stopped");
    }

    fn admit(&self, file_id: FileId, is_growing: bool) {
        match self
            .state_machine
            .transition(file_id, FileStatus::InQueue, FilePatch::new())
        {
            Ok(record) => {
                self.queue.push(CopyJob {
                    file_id,
                    file_path: record.file_path.clone(),
                    file_size: record.file_size,
                    is_growing,
                });
                debug!(%file_id, is_growing, "job admitted to queue");
            }
            Err(error) => {
                // Raced with a removal or failure; nothing to enqueue.
                debug!(%file_id, %error, "skipping admission");
            }
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
