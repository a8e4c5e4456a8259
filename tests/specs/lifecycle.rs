// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery-to-completion scenarios.

use super::support::Harness;
use similar_asserts::assert_eq;
use std::time::Duration;

#[tokio::test]
async fn stable_file_is_copied_and_source_deleted() {
    let harness = Harness::start().await;
    let data = vec![0xABu8; 5 * 1024 * 1024];
    let source = harness.write_source("a.mxf", &data);

    let published = harness.published("a.mxf");
    harness
        .wait_for("a.mxf to publish", || published.exists() && !source.exists())
        .await;

    assert_eq!(std::fs::read(&published).expect("published"), data);

    // The record walked to Completed with full progress.
    let state = harness.control().initial_state();
    let record = state
        .files
        .iter()
        .find(|f| f.file_name == "a.mxf")
        .expect("tracked record");
    assert_eq!(record.status, freight_core::FileStatus::Completed);
    assert_eq!(record.bytes_copied, data.len() as u64);
    assert_eq!(record.copy_progress, 100.0);
    assert!(record.completed_at.is_some());

    let stats = harness.control().statistics();
    assert_eq!(stats.total_files_copied, 1);
    assert_eq!(stats.total_bytes_copied, data.len() as u64);

    harness.stop().await;
}

#[tokio::test]
async fn zero_byte_file_is_never_admitted() {
    let harness = Harness::start().await;
    harness.write_source("empty.mxf", &[]);

    // Give the scanner several cycles.
    tokio::time::sleep(Duration::from_secs(3)).await;
    let state = harness.control().initial_state();
    assert!(state.files.is_empty(), "zero-byte files must not be tracked");
    assert!(!harness.published("empty.mxf").exists());

    harness.stop().await;
}

#[tokio::test]
async fn deleted_source_becomes_removed_history() {
    // Long stability keeps the record in Discovered while we delete it.
    let harness = Harness::start_with(|settings| {
        settings.file_stable_time_seconds = 3600;
    })
    .await;
    let source = harness.write_source("gone.mxf", &vec![1u8; 1024]);

    harness
        .wait_for("record to appear", || {
            !harness.control().initial_state().files.is_empty()
        })
        .await;
    std::fs::remove_file(&source).expect("delete source");

    harness
        .wait_for("record to become removed", || {
            harness
                .control()
                .initial_state()
                .files
                .iter()
                .any(|f| f.status == freight_core::FileStatus::Removed)
        })
        .await;
    assert!(!harness.published("gone.mxf").exists());

    harness.stop().await;
}

#[tokio::test]
async fn paused_scanner_discovers_nothing_until_resumed() {
    let harness = Harness::start().await;
    harness.control().pause_scanner();
    tokio::time::sleep(Duration::from_millis(200)).await;

    harness.write_source("late.mxf", &vec![7u8; 2048]);
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(
        harness.control().initial_state().files.is_empty(),
        "paused scanner must not discover"
    );

    harness.control().resume_scanner();
    let published = harness.published("late.mxf");
    harness.wait_for("late.mxf to publish", || published.exists()).await;

    harness.stop().await;
}

#[tokio::test]
async fn rediscovery_after_completion_creates_a_second_record() {
    let harness = Harness::start().await;
    let data = vec![9u8; 4096];
    harness.write_source("again.mxf", &data);
    let published = harness.published("again.mxf");
    harness.wait_for("first publish", || published.exists()).await;

    // Same path shows up again (the destination copy is overwritten).
    harness.write_source("again.mxf", &data);
    harness
        .wait_for("second record", || {
            harness
                .control()
                .initial_state()
                .files
                .iter()
                .filter(|f| f.file_name == "again.mxf")
                .count()
                >= 2
        })
        .await;

    let state = harness.control().initial_state();
    let completed = state
        .files
        .iter()
        .filter(|f| {
            f.file_name == "again.mxf" && f.status == freight_core::FileStatus::Completed
        })
        .count();
    assert!(completed >= 1, "terminal history must be retained");

    harness.stop().await;
}
