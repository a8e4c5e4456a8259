// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resume verification for interrupted copies.
//!
//! Before restarting a copy whose temp file survived a crash, a window
//! near the end of the temp file is byte-compared against the source. A
//! clean window resumes from the temp file's end; a mismatch triggers a
//! chunked binary search for the highest clean prefix, which is then
//! shortened by a safety margin. Verification runs under a hard time
//! budget; any failure or doubt falls back to a fresh copy.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ResumeConfig {
    /// Smallest temp file worth resuming.
    pub min_resume_bytes: u64,
    /// Verification window for ordinary files.
    pub max_verify_bytes: u64,
    /// Files at or above this size use the reduced window.
    pub large_file_threshold: u64,
    /// Verification window for large files.
    pub large_file_verify_bytes: u64,
    /// Binary-search probe size.
    pub search_chunk_bytes: u64,
    /// Read buffer for byte comparison.
    pub buffer_bytes: usize,
    /// Bytes dropped below the detected clean prefix.
    pub safety_margin_bytes: u64,
    /// Hard budget for the whole verification.
    pub time_budget: Duration,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            min_resume_bytes: MIB,
            max_verify_bytes: 100 * MIB,
            large_file_threshold: 1024 * MIB,
            large_file_verify_bytes: 50 * MIB,
            search_chunk_bytes: MIB,
            buffer_bytes: 64 * 1024,
            safety_margin_bytes: MIB,
            time_budget: Duration::from_secs(300),
        }
    }
}

impl ResumeConfig {
    fn verification_window_for(&self, temp_size: u64) -> u64 {
        let window = if temp_size >= self.large_file_threshold {
            self.large_file_verify_bytes
        } else {
            self.max_verify_bytes
        };
        window.min(temp_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePlan {
    /// Discard the temp file and copy from scratch.
    Fresh,
    /// Truncate the temp file to this offset and continue from it.
    From(u64),
}

/// Decide whether the existing temp file can be continued.
///
/// Never errors: anything unexpected (I/O failure, oversized temp,
/// timeout) resolves to [`ResumePlan::Fresh`].
pub fn plan_resume(source: &Path, temp: &Path, cfg: &ResumeConfig) -> ResumePlan {
    match plan_inner(source, temp, cfg) {
        Ok(plan) => plan,
        Err(e) => {
            warn!(
                source = %source.display(),
                error = %e,
                "resume verification failed, starting fresh"
            );
            ResumePlan::Fresh
        }
    }
}

fn plan_inner(source: &Path, temp: &Path, cfg: &ResumeConfig) -> std::io::Result<ResumePlan> {
    let temp_size = std::fs::metadata(temp)?.len();
    let source_size = std::fs::metadata(source)?.len();

    if temp_size == 0 || temp_size > source_size || temp_size < cfg.min_resume_bytes {
        return Ok(ResumePlan::Fresh);
    }

    let deadline = Instant::now() + cfg.time_budget;
    let mut src = File::open(source)?;
    let mut tmp = File::open(temp)?;

    let window = cfg.verification_window_for(temp_size);
    let window_start = temp_size - window;

    if regions_equal(&mut src, &mut tmp, window_start, window, cfg.buffer_bytes, deadline)? {
        debug!(offset = temp_size, "resume window verified clean");
        return Ok(ResumePlan::From(temp_size));
    }

    // Corruption somewhere in the window. Binary-search the highest
    // prefix length whose trailing chunk still matches.
    let mut lo = window_start;
    let mut hi = temp_size;
    while hi.saturating_sub(lo) > cfg.search_chunk_bytes {
        if Instant::now() >= deadline {
            warn!("resume verification time budget exceeded during search");
            return Ok(ResumePlan::Fresh);
        }
        let mid = lo + (hi - lo) / 2;
        let probe_len = cfg.search_chunk_bytes.min(mid);
        let probe_start = mid - probe_len;
        if regions_equal(&mut src, &mut tmp, probe_start, probe_len, cfg.buffer_bytes, deadline)? {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let safe = lo.saturating_sub(cfg.safety_margin_bytes);
    if safe < cfg.min_resume_bytes {
        return Ok(ResumePlan::Fresh);
    }
    debug!(clean_prefix = lo, resume_at = safe, "corruption located, resuming below it");
    Ok(ResumePlan::From(safe))
}

/// Byte-compare `[offset, offset + len)` of both files.
fn regions_equal(
    src: &mut File,
    tmp: &mut File,
    offset: u64,
    len: u64,
    buffer_bytes: usize,
    deadline: Instant,
) -> std::io::Result<bool> {
    if len == 0 {
        return Ok(true);
    }
    src.seek(SeekFrom::Start(offset))?;
    tmp.seek(SeekFrom::Start(offset))?;

    let mut src_buf = vec![0u8; buffer_bytes];
    let mut tmp_buf = vec![0u8; buffer_bytes];
    let mut remaining = len;
    while remaining > 0 {
        if Instant::now() >= deadline {
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "verification time budget exceeded",
            ));
        }
        let want = (remaining as usize).min(buffer_bytes);
        src.read_exact(&mut src_buf[..want])?;
        tmp.read_exact(&mut tmp_buf[..want])?;
        if src_buf[..want] != tmp_buf[..want] {
            return Ok(false);
        }
        remaining -= want as u64;
    }
    Ok(true)
}

#[cfg(test)]
#[path = "resume_tests.rs"]
mod tests;
