// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live (growing) copy scenarios.

use super::support::{file_size, Harness};
use std::io::Write;
use std::time::Duration;

#[tokio::test]
async fn growing_file_is_tailed_and_finalized() {
    let harness = Harness::start_with(|settings| {
        settings.growing_file_growth_timeout_seconds = 2;
        settings.growing_file_poll_interval_seconds = 1;
        settings.growing_file_safety_margin_mb = 0;
        // Keep the normal-copy path out of the way: a long stability
        // window means only the growing pipeline can pick this up.
        settings.file_stable_time_seconds = 3600;
    })
    .await;

    let source = harness.source.join("live.mxf");
    let chunk = vec![0x5Au8; 512 * 1024];

    // Feed the file in chunks until it crosses the 1 MB live threshold
    // and keeps growing while the scanner watches.
    std::fs::write(&source, &chunk).expect("first chunk");
    let writer = {
        let source = source.clone();
        let chunk = chunk.clone();
        tokio::spawn(async move {
            for _ in 0..8 {
                {
                    let mut file = std::fs::OpenOptions::new()
                        .append(true)
                        .open(&source)
                        .expect("open for append");
                    file.write_all(&chunk).expect("append");
                    file.flush().expect("flush");
                }
                tokio::time::sleep(Duration::from_millis(400)).await;
            }
        })
    };

    // The record must enter the growing pipeline while the writer is
    // still appending.
    harness
        .wait_for("record to reach the growing pipeline", || {
            harness.control().initial_state().files.iter().any(|f| {
                matches!(
                    f.status,
                    freight_core::FileStatus::ReadyToStartGrowing
                        | freight_core::FileStatus::InQueue
                        | freight_core::FileStatus::GrowingCopy
                        | freight_core::FileStatus::Completed
                )
            })
        })
        .await;

    writer.await.expect("writer");
    let final_size = file_size(&source);
    assert_eq!(final_size, 9 * chunk.len() as u64);

    let published = harness.published("live.mxf");
    harness
        .wait_for("growing copy to finalize", || {
            published.exists() && file_size(&published) == final_size
        })
        .await;
    assert!(!source.exists(), "source deleted after live copy");

    harness.stop().await;
}

#[tokio::test]
async fn small_file_that_stops_growing_takes_the_normal_path() {
    let harness = Harness::start_with(|settings| {
        settings.file_stable_time_seconds = 1;
    })
    .await;

    // Two appends keep it under the 1 MB live threshold, then it stops.
    let source = harness.source.join("short.mxf");
    std::fs::write(&source, vec![1u8; 100 * 1024]).expect("write");
    tokio::time::sleep(Duration::from_millis(1200)).await;
    {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&source)
            .expect("open");
        file.write_all(&vec![2u8; 100 * 1024]).expect("append");
    }

    let published = harness.published("short.mxf");
    harness
        .wait_for("stabilized file to publish", || {
            published.exists() && file_size(&published) == 200 * 1024
        })
        .await;

    harness.stop().await;
}
