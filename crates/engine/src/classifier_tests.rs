// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io;

fn ctx<'a>(error: &'a CopyError, source_exists: bool) -> ClassifyCtx<'a> {
    ClassifyCtx { error, source_exists, destination_status: Some(StorageStatus::Ok) }
}

#[test]
fn timeout_fails_terminally() {
    let error = CopyError::Timeout("growing copy stalled");
    let outcome = classify_copy_error(&ctx(&error, true));
    assert_eq!(outcome.status, FileStatus::Failed);
    assert!(outcome.reason.starts_with("operation timed out"));
}

#[test]
fn integrity_mismatch_fails_terminally() {
    let error = CopyError::Integrity { source_size: 10, dest_size: 8 };
    let outcome = classify_copy_error(&ctx(&error, true));
    assert_eq!(outcome.status, FileStatus::Failed);
    assert!(outcome.reason.contains("integrity check failed"));
}

#[test]
fn timeout_wins_over_unhealthy_destination() {
    let error = CopyError::Timeout("stalled");
    let outcome = classify_copy_error(&ClassifyCtx {
        error: &error,
        source_exists: true,
        destination_status: Some(StorageStatus::Critical),
    });
    assert!(outcome.reason.starts_with("operation timed out"));
}

#[test]
fn unhealthy_destination_claims_generic_failures() {
    let error = CopyError::Destination(io::Error::other("write failed"));
    let outcome = classify_copy_error(&ClassifyCtx {
        error: &error,
        source_exists: true,
        destination_status: Some(StorageStatus::Error),
    });
    assert_eq!(outcome.status, FileStatus::Failed);
    assert!(outcome.reason.contains("destination unavailable"));
    assert!(outcome.reason.contains("error"));
}

#[yare::parameterized(
    refused    = { io::ErrorKind::ConnectionRefused },
    reset      = { io::ErrorKind::ConnectionReset },
    broken     = { io::ErrorKind::BrokenPipe },
    timed_out  = { io::ErrorKind::TimedOut },
    not_conn   = { io::ErrorKind::NotConnected },
    permission = { io::ErrorKind::PermissionDenied },
)]
fn network_error_kinds_fail_for_rediscovery(kind: io::ErrorKind) {
    let error = CopyError::Destination(io::Error::new(kind, "boom"));
    let outcome = classify_copy_error(&ctx(&error, true));
    assert_eq!(outcome.status, FileStatus::Failed);
    assert!(outcome.reason.starts_with("network failure"), "{}", outcome.reason);
}

#[yare::parameterized(
    eio          = { 5 },
    epipe        = { 32 },
    enetunreach  = { 101 },
    econnreset   = { 104 },
    win_net_path = { 53 },
)]
fn network_os_codes_detected(code: i32) {
    let error = CopyError::Destination(io::Error::from_raw_os_error(code));
    let outcome = classify_copy_error(&ctx(&error, true));
    assert!(outcome.reason.starts_with("network failure"), "{}", outcome.reason);
}

#[yare::parameterized(
    io_error  = { "Input/output error while writing" },
    smb       = { "SMB error 0x5" },
    unreach   = { "Network is unreachable" },
    net_name  = { "The network name cannot be found" },
)]
fn network_substrings_detected(message: &str) {
    let error = CopyError::Destination(io::Error::other(message.to_string()));
    let outcome = classify_copy_error(&ctx(&error, true));
    assert!(outcome.reason.starts_with("network failure"), "{}", outcome.reason);
}

#[test]
fn vanished_source_is_removed() {
    let error = CopyError::SourceVanished;
    let outcome = classify_copy_error(&ctx(&error, false));
    assert_eq!(outcome.status, FileStatus::Removed);
    assert_eq!(outcome.reason, "source file no longer exists");
}

#[test]
fn not_found_with_source_gone_is_removed() {
    let error = CopyError::Source(io::Error::new(io::ErrorKind::NotFound, "gone"));
    let outcome = classify_copy_error(&ctx(&error, false));
    assert_eq!(outcome.status, FileStatus::Removed);
}

#[test]
fn source_indicator_with_source_present_fails() {
    let error = CopyError::Source(io::Error::other("source file unreadable"));
    let outcome = classify_copy_error(&ctx(&error, true));
    assert_eq!(outcome.status, FileStatus::Failed);
    assert!(outcome.reason.starts_with("source error"), "{}", outcome.reason);
}

#[test]
fn unknown_errors_default_to_failed() {
    let error = CopyError::Destination(io::Error::other("flux capacitor misaligned"));
    let outcome = classify_copy_error(&ctx(&error, true));
    assert_eq!(outcome.status, FileStatus::Failed);
    assert!(outcome.reason.starts_with("unknown error"), "{}", outcome.reason);
}

#[test]
fn unknown_destination_status_is_not_problematic() {
    let error = CopyError::Destination(io::Error::other("whatever"));
    let outcome = classify_copy_error(&ClassifyCtx {
        error: &error,
        source_exists: true,
        destination_status: None,
    });
    assert!(outcome.reason.starts_with("unknown error"));
}
