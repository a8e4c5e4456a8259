// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Copy engine.
//!
//! Streams a source file to a temp destination (`.copying` suffix),
//! verifies sizes, publishes atomically via rename, then deletes the
//! source. Growing sources are tailed live until they stop growing.
//! A prior attempt's temp file can be verified and resumed.

mod growing;
mod resume;
mod stream;

pub use resume::{plan_resume, ResumeConfig, ResumePlan};

use crate::queue::CopyJob;
use crate::state_machine::StateMachine;
use freight_core::{Clock, Settings};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Temp-file suffix that hides in-flight copies from downstream readers.
pub const TEMP_SUFFIX: &str = ".copying";

/// Fixed chunk size for normal copies.
pub const NORMAL_CHUNK_SIZE: usize = 2 * 1024 * 1024;

const SOURCE_DELETE_ATTEMPTS: u32 = 3;
const SOURCE_DELETE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("source i/o error: {0}")]
    Source(#[source] std::io::Error),

    #[error("destination i/o error: {0}")]
    Destination(#[source] std::io::Error),

    #[error("size mismatch after copy: source {source_size} bytes, destination {dest_size} bytes")]
    Integrity { source_size: u64, dest_size: u64 },

    #[error("{0}")]
    Timeout(&'static str),

    #[error("source file vanished during copy")]
    SourceVanished,

    #[error("copy cancelled")]
    Cancelled,
}

/// Maps a source file name to its relative path under the destination
/// directory. The daemon may install a template engine here; the default
/// lays every file flat.
pub trait PathTemplate: Send + Sync {
    fn relative_path(&self, file_name: &str) -> PathBuf;
}

/// Default layout: destination directory + source basename.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatLayout;

impl PathTemplate for FlatLayout {
    fn relative_path(&self, file_name: &str) -> PathBuf {
        PathBuf::from(file_name)
    }
}

pub struct CopyEngine<C: Clock> {
    settings: Arc<Settings>,
    state_machine: Arc<StateMachine<C>>,
    template: Arc<dyn PathTemplate>,
}

impl<C: Clock> CopyEngine<C> {
    pub fn new(
        settings: Arc<Settings>,
        state_machine: Arc<StateMachine<C>>,
        template: Arc<dyn PathTemplate>,
    ) -> Self {
        Self { settings, state_machine, template }
    }

    /// Final destination path for a source file.
    pub fn destination_for(&self, source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.settings
            .destination_directory
            .join(self.template.relative_path(&name))
    }

    /// Run the copy procedure for one job. Returns bytes copied.
    ///
    /// On error the temp file has already been cleaned up best-effort;
    /// the caller classifies the error and transitions the record.
    pub async fn execute(
        &self,
        job: &CopyJob,
        cancel: &CancellationToken,
    ) -> Result<u64, CopyError> {
        let final_path = self.destination_for(&job.file_path);
        let temp_path = if self.settings.use_temporary_file {
            temp_path_for(&final_path)
        } else {
            final_path.clone()
        };

        let result = self
            .copy_to_temp(job, &final_path, &temp_path, cancel)
            .await;
        if result.is_err() && self.settings.use_temporary_file {
            remove_best_effort(&temp_path).await;
        }
        result
    }

    async fn copy_to_temp(
        &self,
        job: &CopyJob,
        final_path: &Path,
        temp_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, CopyError> {
        if let Some(parent) = final_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(CopyError::Destination)?;
        }

        let resume_offset = self.resume_offset(job, temp_path).await?;

        let started = Instant::now();
        let mut progress = ProgressEmitter::new(
            self.state_machine.clone(),
            job.file_id,
            self.settings.copy_progress_update_interval,
            started,
        );

        let copied = if job.is_growing {
            growing::growing_copy(
                &job.file_path,
                temp_path,
                growing::GrowingCopyConfig {
                    poll_interval: self.settings.growing_poll_interval(),
                    growth_timeout: self.settings.growth_timeout(),
                    safety_margin: self.settings.growing_safety_margin_bytes(),
                    chunk_size: self.settings.growing_chunk_size_bytes() as usize,
                },
                &mut progress,
                cancel,
            )
            .await?
        } else {
            stream::normal_copy(
                &job.file_path,
                temp_path,
                resume_offset,
                NORMAL_CHUNK_SIZE,
                &mut progress,
                cancel,
            )
            .await?
        };

        self.verify_integrity(&job.file_path, temp_path).await?;

        if self.settings.use_temporary_file {
            tokio::fs::rename(temp_path, final_path)
                .await
                .map_err(CopyError::Destination)?;
        }
        info!(
            file_id = %job.file_id,
            source = %job.file_path.display(),
            destination = %final_path.display(),
            bytes = copied,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "copy published"
        );

        delete_source(&job.file_path).await;
        Ok(copied)
    }

    /// Decide where a restarted copy may safely continue.
    ///
    /// Only normal copies resume; any verification failure or exceeded
    /// time budget falls back to a fresh copy.
    async fn resume_offset(&self, job: &CopyJob, temp_path: &Path) -> Result<u64, CopyError> {
        if !self.settings.enable_resumable_copy
            || !self.settings.use_temporary_file
            || job.is_growing
        {
            remove_best_effort(temp_path).await;
            return Ok(0);
        }
        if tokio::fs::metadata(temp_path).await.is_err() {
            return Ok(0);
        }

        let source = job.file_path.clone();
        let temp = temp_path.to_path_buf();
        let cfg = ResumeConfig::default();
        let plan = tokio::task::spawn_blocking(move || plan_resume(&source, &temp, &cfg))
            .await
            .unwrap_or(ResumePlan::Fresh);

        match plan {
            ResumePlan::Fresh => {
                remove_best_effort(temp_path).await;
                Ok(0)
            }
            ResumePlan::From(offset) => {
                let file = tokio::fs::OpenOptions::new()
                    .write(true)
                    .open(temp_path)
                    .await
                    .map_err(CopyError::Destination)?;
                file.set_len(offset).await.map_err(CopyError::Destination)?;
                info!(
                    file_id = %job.file_id,
                    offset,
                    "resuming interrupted copy"
                );
                Ok(offset)
            }
        }
    }

    /// Size comparison against the source at EOF time. A source that grew
    /// past the completed copy fails here and is retried on rediscovery.
    async fn verify_integrity(&self, source: &Path, temp: &Path) -> Result<(), CopyError> {
        let source_size = match tokio::fs::metadata(source).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CopyError::SourceVanished)
            }
            Err(e) => return Err(CopyError::Source(e)),
        };
        let dest_size = tokio::fs::metadata(temp)
            .await
            .map_err(CopyError::Destination)?
            .len();
        if source_size != dest_size {
            return Err(CopyError::Integrity { source_size, dest_size });
        }
        Ok(())
    }
}

/// Emits progress events when the integer percentage crosses the
/// configured granularity.
pub(crate) struct ProgressEmitter<C: Clock> {
    state_machine: Arc<StateMachine<C>>,
    file_id: freight_core::FileId,
    granularity: u32,
    started: Instant,
    last_emitted_percent: i64,
}

impl<C: Clock> ProgressEmitter<C> {
    fn new(
        state_machine: Arc<StateMachine<C>>,
        file_id: freight_core::FileId,
        granularity: u32,
        started: Instant,
    ) -> Self {
        Self {
            state_machine,
            file_id,
            granularity: granularity.max(1),
            started,
            last_emitted_percent: -1,
        }
    }

    pub(crate) fn update(&mut self, bytes_copied: u64, total_bytes: u64) {
        if total_bytes == 0 {
            return;
        }
        let percent = (bytes_copied * 100 / total_bytes) as i64;
        if percent / self.granularity as i64 == self.last_emitted_percent / self.granularity as i64
        {
            return;
        }
        self.last_emitted_percent = percent;
        let elapsed = self.started.elapsed().as_secs_f64();
        let speed_mbps = if elapsed > 0.0 {
            bytes_copied as f64 / (1024.0 * 1024.0) / elapsed
        } else {
            0.0
        };
        if let Err(error) =
            self.state_machine
                .record_progress(self.file_id, bytes_copied, total_bytes, speed_mbps)
        {
            debug!(file_id = %self.file_id, %error, "progress update dropped");
        }
    }
}

fn temp_path_for(final_path: &Path) -> PathBuf {
    let mut name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(TEMP_SUFFIX);
    final_path.with_file_name(name)
}

async fn remove_best_effort(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed stale temp file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove temp file"),
    }
}

/// Delete the source after a successful publish. Deletion failure does
/// not fail the copy; the scanner will re-see the file and the next copy
/// will overwrite the destination.
async fn delete_source(path: &Path) {
    for attempt in 1..=SOURCE_DELETE_ATTEMPTS {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "source deleted");
                return;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    attempt,
                    error = %e,
                    "source delete attempt failed"
                );
                if attempt < SOURCE_DELETE_ATTEMPTS {
                    tokio::time::sleep(SOURCE_DELETE_DELAY).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
