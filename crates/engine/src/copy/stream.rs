// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Normal streaming copy: fixed-size chunks, fsync before verification.

use super::{CopyError, ProgressEmitter};
use freight_core::Clock;
use std::io::SeekFrom;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Stream `source` into `temp`, starting at `resume_offset` (0 for a
/// fresh copy). Returns the total size of the temp file.
pub(super) async fn normal_copy<C: Clock>(
    source: &Path,
    temp: &Path,
    resume_offset: u64,
    chunk_size: usize,
    progress: &mut ProgressEmitter<C>,
    cancel: &CancellationToken,
) -> Result<u64, CopyError> {
    let total_bytes = tokio::fs::metadata(source)
        .await
        .map_err(map_source_err)?
        .len();

    let mut src = tokio::fs::File::open(source).await.map_err(map_source_err)?;
    let mut dst = tokio::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(resume_offset == 0)
        .open(temp)
        .await
        .map_err(CopyError::Destination)?;

    if resume_offset > 0 {
        src.seek(SeekFrom::Start(resume_offset))
            .await
            .map_err(CopyError::Source)?;
        dst.seek(SeekFrom::Start(resume_offset))
            .await
            .map_err(CopyError::Destination)?;
    }

    let mut buf = vec![0u8; chunk_size];
    let mut copied = resume_offset;
    loop {
        if cancel.is_cancelled() {
            return Err(CopyError::Cancelled);
        }
        let n = src.read(&mut buf).await.map_err(map_source_err)?;
        if n == 0 {
            break;
        }
        dst.write_all(&buf[..n])
            .await
            .map_err(CopyError::Destination)?;
        copied += n as u64;
        progress.update(copied, total_bytes);
    }

    dst.flush().await.map_err(CopyError::Destination)?;
    dst.sync_all().await.map_err(CopyError::Destination)?;
    Ok(copied)
}

fn map_source_err(e: std::io::Error) -> CopyError {
    if e.kind() == std::io::ErrorKind::NotFound {
        CopyError::SourceVanished
    } else {
        CopyError::Source(e)
    }
}
