// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic-publish and restart scenarios.

use super::support::{file_size, Harness};
use std::time::Duration;

#[tokio::test]
async fn published_file_is_never_partial_under_its_final_name() {
    let harness = Harness::start().await;
    let data = vec![0xC3u8; 8 * 1024 * 1024];
    harness.write_source("big.mxf", &data);

    let published = harness.published("big.mxf");
    // The moment the final name exists, it must already be complete:
    // the temp file is renamed only after fsync + verification.
    harness.wait_for("publish", || published.exists()).await;
    assert_eq!(file_size(&published), data.len() as u64);

    harness.stop().await;
}

#[tokio::test]
async fn stale_temp_from_a_dead_run_is_reconciled() {
    let harness = Harness::start_with(|settings| {
        settings.file_stable_time_seconds = 1;
    })
    .await;

    // A previous process died mid-copy: the source survived, and a
    // clean 2 MiB prefix sits in the destination under the temp suffix.
    let data: Vec<u8> = (0..3 * 1024 * 1024u32).map(|i| (i * 7 % 256) as u8).collect();
    std::fs::create_dir_all(&harness.destination).expect("dest dir");
    std::fs::write(
        harness.destination.join("crashed.mxf.copying"),
        &data[..2 * 1024 * 1024],
    )
    .expect("stale temp");
    harness.write_source("crashed.mxf", &data);

    let published = harness.published("crashed.mxf");
    harness
        .wait_for("reconciled publish", || {
            published.exists() && file_size(&published) == data.len() as u64
        })
        .await;
    assert_eq!(std::fs::read(&published).expect("published"), data);
    assert!(
        !harness.destination.join("crashed.mxf.copying").exists(),
        "temp must be consumed by the rename"
    );

    harness.stop().await;
}

#[tokio::test]
async fn downstream_readers_only_ever_see_final_names() {
    let harness = Harness::start().await;
    harness.write_source("watch.mxf", &vec![1u8; 512 * 1024]);

    // Poll the destination for the whole run: any `.mxf` visible there
    // must be complete (the in-flight copy wears the temp suffix).
    let published = harness.published("watch.mxf");
    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    loop {
        if let Ok(entries) = std::fs::read_dir(&harness.destination) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.ends_with(".mxf") {
                    assert_eq!(name, "watch.mxf");
                    assert_eq!(file_size(&entry.path()), 512 * 1024);
                }
            }
        }
        if published.exists() {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "timed out");
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    harness.stop().await;
}
