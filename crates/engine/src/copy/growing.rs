// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Growing (live) copy: tail a source that is still being written.
//!
//! The loop stats the source each round and copies everything up to
//! `size − safety_margin`, holding the tail back to absorb unpredictable
//! growth near the end of the stream. When no new bytes arrive for the
//! growth timeout the source is considered finalized and the remaining
//! tail is drained.

use super::{CopyError, ProgressEmitter};
use freight_core::Clock;
use std::io::SeekFrom;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub(super) struct GrowingCopyConfig {
    pub poll_interval: Duration,
    pub growth_timeout: Duration,
    pub safety_margin: u64,
    pub chunk_size: usize,
}

pub(super) async fn growing_copy<C: Clock>(
    source: &Path,
    temp: &Path,
    cfg: GrowingCopyConfig,
    progress: &mut ProgressEmitter<C>,
    cancel: &CancellationToken,
) -> Result<u64, CopyError> {
    let mut dst = tokio::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(temp)
        .await
        .map_err(CopyError::Destination)?;

    let mut copied: u64 = 0;
    let mut last_new_data = Instant::now();

    loop {
        if cancel.is_cancelled() {
            return Err(CopyError::Cancelled);
        }

        let source_size = stat_size(source).await?;
        let readable = source_size.saturating_sub(cfg.safety_margin);

        if readable > copied {
            copied = copy_range(source, &mut dst, copied, readable, cfg.chunk_size, cancel)
                .await?;
            progress.update(copied, source_size);
            last_new_data = Instant::now();
        } else if last_new_data.elapsed() >= cfg.growth_timeout {
            // Source stable: drain the held-back tail and finish.
            let final_size = stat_size(source).await?;
            debug!(
                source = %source.display(),
                final_size,
                "growing source finalized, draining tail"
            );
            if final_size > copied {
                copied = copy_range(source, &mut dst, copied, final_size, cfg.chunk_size, cancel)
                    .await?;
            }
            progress.update(copied, final_size);
            break;
        }

        tokio::select! {
            () = cancel.cancelled() => return Err(CopyError::Cancelled),
            () = tokio::time::sleep(cfg.poll_interval) => {}
        }
    }

    dst.flush().await.map_err(CopyError::Destination)?;
    dst.sync_all().await.map_err(CopyError::Destination)?;
    Ok(copied)
}

/// Copy source bytes `[from, to)` into the destination, returning `to`.
async fn copy_range(
    source: &Path,
    dst: &mut tokio::fs::File,
    from: u64,
    to: u64,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<u64, CopyError> {
    let mut src = tokio::fs::File::open(source).await.map_err(map_source_err)?;
    src.seek(SeekFrom::Start(from)).await.map_err(CopyError::Source)?;

    let mut buf = vec![0u8; chunk_size];
    let mut position = from;
    while position < to {
        if cancel.is_cancelled() {
            return Err(CopyError::Cancelled);
        }
        let want = ((to - position) as usize).min(chunk_size);
        let n = src.read(&mut buf[..want]).await.map_err(map_source_err)?;
        if n == 0 {
            // Source shorter than its stat said; stop at the truth.
            break;
        }
        dst.write_all(&buf[..n])
            .await
            .map_err(CopyError::Destination)?;
        position += n as u64;
    }
    Ok(position)
}

async fn stat_size(source: &Path) -> Result<u64, CopyError> {
    match tokio::fs::metadata(source).await {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CopyError::SourceVanished),
        Err(e) => Err(CopyError::Source(e)),
    }
}

fn map_source_err(e: std::io::Error) -> CopyError {
    if e.kind() == std::io::ErrorKind::NotFound {
        CopyError::SourceVanished
    } else {
        CopyError::Source(e)
    }
}
