// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Copy-error classification.
//!
//! Maps a raw copy failure to a lifecycle outcome. The policy is an
//! ordered rule table evaluated top to bottom, so it can be audited and
//! tested in isolation. Network failures are terminal (`Failed`): the
//! scanner rediscovers the file once the destination returns, producing a
//! fresh record.

use crate::copy::CopyError;
use freight_core::{FileStatus, StorageStatus};
use std::io::ErrorKind;

/// Substrings that indicate the destination (or its network transport)
/// failed, matched case-insensitively against the raw error text.
const NETWORK_INDICATORS: &[&str] = &[
    "input/output error",
    "connection refused",
    "connection timed out",
    "connection reset",
    "network is unreachable",
    "no route to host",
    "broken pipe",
    "not connected",
    "permission denied",
    "smb error",
    "cifs error",
    "mount_smbfs",
    "network mount",
    "the network name cannot be found",
    "the network path was not found",
];

/// Raw OS error codes treated as network-indicative. Unix errno values
/// plus the Windows codes for access denied (5), network name deleted
/// (64) and network path not found (53).
const NETWORK_OS_CODES: &[i32] = &[5, 13, 32, 53, 64, 101, 104, 107, 110, 111, 113];

const NETWORK_ERROR_KINDS: &[ErrorKind] = &[
    ErrorKind::ConnectionRefused,
    ErrorKind::ConnectionReset,
    ErrorKind::ConnectionAborted,
    ErrorKind::NotConnected,
    ErrorKind::BrokenPipe,
    ErrorKind::TimedOut,
    ErrorKind::PermissionDenied,
];

/// Substrings that point at the source side of the copy.
const SOURCE_INDICATORS: &[&str] = &["no such file or directory", "file not found", "source file"];

/// Everything the rules may consult.
pub struct ClassifyCtx<'a> {
    pub error: &'a CopyError,
    /// Whether the source path still exists (re-checked by the worker).
    pub source_exists: bool,
    /// The monitor's cached destination status at failure time.
    pub destination_status: Option<StorageStatus>,
}

/// The classified lifecycle outcome of a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: FileStatus,
    pub reason: String,
}

struct Rule {
    name: &'static str,
    applies: fn(&ClassifyCtx<'_>) -> bool,
    outcome: fn(&ClassifyCtx<'_>) -> Outcome,
}

static RULES: &[Rule] = &[
    Rule {
        name: "timeout",
        applies: |ctx| matches!(ctx.error, CopyError::Timeout(_)),
        outcome: |ctx| Outcome {
            status: FileStatus::Failed,
            reason: format!("operation timed out: {}", ctx.error),
        },
    },
    Rule {
        name: "integrity",
        applies: |ctx| matches!(ctx.error, CopyError::Integrity { .. }),
        outcome: |ctx| Outcome {
            status: FileStatus::Failed,
            reason: format!("integrity check failed: {}", ctx.error),
        },
    },
    Rule {
        // With the destination already known-unhealthy, any failure that
        // is not a timeout or integrity mismatch is attributed to it.
        name: "destination-unhealthy",
        applies: |ctx| ctx.destination_status.is_some_and(|s| s.is_problematic()),
        outcome: |ctx| Outcome {
            status: FileStatus::Failed,
            reason: format!(
                "destination unavailable (status: {})",
                ctx.destination_status.unwrap_or(StorageStatus::Unknown)
            ),
        },
    },
    Rule {
        name: "network",
        applies: |ctx| is_network_error(ctx.error),
        outcome: |ctx| Outcome {
            status: FileStatus::Failed,
            reason: format!("network failure: {}", ctx.error),
        },
    },
    Rule {
        name: "source-missing",
        applies: |ctx| {
            (matches!(ctx.error, CopyError::SourceVanished) || is_not_found(ctx.error))
                && !ctx.source_exists
        },
        outcome: |_| Outcome {
            status: FileStatus::Removed,
            reason: "source file no longer exists".to_string(),
        },
    },
    Rule {
        name: "source-error",
        applies: |ctx| has_indicator(ctx.error, SOURCE_INDICATORS),
        outcome: |ctx| Outcome {
            status: FileStatus::Failed,
            reason: format!("source error: {}", ctx.error),
        },
    },
];

/// Classify a copy failure. Falls through to a terminal `Failed` with the
/// raw error when no rule applies.
pub fn classify_copy_error(ctx: &ClassifyCtx<'_>) -> Outcome {
    for rule in RULES {
        if (rule.applies)(ctx) {
            let outcome = (rule.outcome)(ctx);
            tracing::debug!(
                rule = rule.name,
                status = %outcome.status,
                reason = %outcome.reason,
                "copy error classified"
            );
            return outcome;
        }
    }
    Outcome {
        status: FileStatus::Failed,
        reason: format!("unknown error: {}", ctx.error),
    }
}

fn io_error(error: &CopyError) -> Option<&std::io::Error> {
    match error {
        CopyError::Source(e) | CopyError::Destination(e) => Some(e),
        _ => None,
    }
}

fn is_network_error(error: &CopyError) -> bool {
    if let Some(io) = io_error(error) {
        if NETWORK_ERROR_KINDS.contains(&io.kind()) {
            return true;
        }
        if io.raw_os_error().is_some_and(|code| NETWORK_OS_CODES.contains(&code)) {
            return true;
        }
    }
    has_indicator(error, NETWORK_INDICATORS)
}

fn is_not_found(error: &CopyError) -> bool {
    io_error(error).is_some_and(|io| io.kind() == ErrorKind::NotFound)
}

fn has_indicator(error: &CopyError, indicators: &[&str]) -> bool {
    let text = error.to_string().to_lowercase();
    indicators.iter().any(|needle| text.contains(needle))
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
