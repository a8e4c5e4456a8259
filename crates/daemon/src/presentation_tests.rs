// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use freight_core::{FakeClock, FilePatch, FileStatus};
use std::path::Path;
use std::time::Duration;

struct Fixture {
    presentation: Arc<Presentation>,
    state_machine: Arc<StateMachine<FakeClock>>,
    cancel: CancellationToken,
}

fn fixture() -> Fixture {
    let bus = EventBus::default();
    let state_machine = Arc::new(StateMachine::new(
        Arc::new(FileRepository::new()),
        bus.clone(),
        FakeClock::new(),
    ));
    let presentation = Arc::new(Presentation::new(&state_machine, bus));
    Fixture { presentation, state_machine, cancel: CancellationToken::new() }
}

#[tokio::test]
async fn status_events_become_file_updates() {
    let fx = fixture();
    let mut ui = fx.presentation.subscribe();
    let pump = tokio::spawn(fx.presentation.clone().run(fx.cancel.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let record = fx.state_machine.create(Path::new("/src/a.mxf"), 10).unwrap();
    fx.state_machine
        .transition(record.id, FileStatus::Ready, FilePatch::new())
        .unwrap();

    // Creation event first, then the transition, both carrying the
    // record's current snapshot.
    let first = tokio::time::timeout(Duration::from_secs(1), ui.recv())
        .await
        .unwrap()
        .unwrap();
    match first {
        UiMessage::FileUpdate { file } => assert_eq!(file.file_name, "a.mxf"),
        other => panic!("unexpected message {other:?}"),
    }

    fx.cancel.cancel();
    let _ = pump.await;
}

#[tokio::test]
async fn progress_events_become_progress_updates() {
    let fx = fixture();
    let mut ui = fx.presentation.subscribe();
    let pump = tokio::spawn(fx.presentation.clone().run(fx.cancel.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let record = fx.state_machine.create(Path::new("/src/a.mxf"), 100).unwrap();
    fx.state_machine.record_progress(record.id, 40, 100, 5.0).unwrap();

    let mut saw_progress = false;
    for _ in 0..2 {
        match tokio::time::timeout(Duration::from_secs(1), ui.recv()).await {
            Ok(Ok(UiMessage::FileProgressUpdate { progress_percent, .. })) => {
                assert_eq!(progress_percent, 40.0);
                saw_progress = true;
            }
            Ok(Ok(_)) => continue,
            _ => break,
        }
    }
    assert!(saw_progress);

    fx.cancel.cancel();
    let _ = pump.await;
}

#[tokio::test]
async fn no_subscribers_is_not_an_error() {
    let fx = fixture();
    let pump = tokio::spawn(fx.presentation.clone().run(fx.cancel.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;
    fx.state_machine.create(Path::new("/src/a.mxf"), 10).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    fx.cancel.cancel();
    let _ = pump.await;
}
