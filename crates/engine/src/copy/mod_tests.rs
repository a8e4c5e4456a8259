// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bus::EventBus;
use crate::queue::CopyJob;
use crate::repository::FileRepository;
use freight_core::{Event, FakeClock, FilePatch, FileStatus, Settings};
use tempfile::TempDir;

struct Fixture {
    _dirs: TempDir,
    source_dir: PathBuf,
    dest_dir: PathBuf,
    engine: CopyEngine<FakeClock>,
    state_machine: Arc<StateMachine<FakeClock>>,
    bus: EventBus,
}

fn fixture() -> Fixture {
    let dirs = TempDir::new().unwrap();
    let source_dir = dirs.path().join("src");
    let dest_dir = dirs.path().join("dst");
    std::fs::create_dir_all(&source_dir).unwrap();
    std::fs::create_dir_all(&dest_dir).unwrap();

    let settings = Arc::new(
        Settings::builder()
            .source_directory(&source_dir)
            .destination_directory(&dest_dir)
            .build(),
    );
    let bus = EventBus::default();
    let state_machine = Arc::new(StateMachine::new(
        Arc::new(FileRepository::new()),
        bus.clone(),
        FakeClock::new(),
    ));
    let engine = CopyEngine::new(settings, state_machine.clone(), Arc::new(FlatLayout));
    Fixture { _dirs: dirs, source_dir, dest_dir, engine, state_machine, bus }
}

fn seed_copying_record(fx: &Fixture, name: &str, data: &[u8]) -> CopyJob {
    let source = fx.source_dir.join(name);
    std::fs::write(&source, data).unwrap();
    let record = fx.state_machine.create(&source, data.len() as u64).unwrap();
    for status in [FileStatus::Ready, FileStatus::InQueue, FileStatus::Copying] {
        fx.state_machine.transition(record.id, status, FilePatch::new()).unwrap();
    }
    CopyJob {
        file_id: record.id,
        file_path: source,
        file_size: data.len() as u64,
        is_growing: false,
    }
}

#[test]
fn temp_path_appends_suffix() {
    assert_eq!(
        temp_path_for(Path::new("/dst/a.mxf")),
        PathBuf::from("/dst/a.mxf.copying")
    );
}

#[test]
fn flat_layout_keeps_basename() {
    let fx = fixture();
    let dest = fx.engine.destination_for(Path::new("/anywhere/clip.mxf"));
    assert_eq!(dest, fx.dest_dir.join("clip.mxf"));
}

#[test]
fn custom_template_maps_subdirectories() {
    struct ByPrefix;
    impl PathTemplate for ByPrefix {
        fn relative_path(&self, file_name: &str) -> PathBuf {
            let prefix = file_name.get(..2).unwrap_or("misc");
            PathBuf::from(prefix).join(file_name)
        }
    }

    let fx = fixture();
    let engine = CopyEngine::new(
        Arc::new(
            Settings::builder()
                .source_directory(&fx.source_dir)
                .destination_directory(&fx.dest_dir)
                .build(),
        ),
        fx.state_machine.clone(),
        Arc::new(ByPrefix),
    );
    let dest = engine.destination_for(Path::new("/src/ab_clip.mxf"));
    assert_eq!(dest, fx.dest_dir.join("ab").join("ab_clip.mxf"));
}

#[tokio::test]
async fn normal_copy_publishes_and_deletes_source() {
    let fx = fixture();
    let data = vec![7u8; 64 * 1024];
    let job = seed_copying_record(&fx, "a.mxf", &data);

    let copied = fx.engine.execute(&job, &CancellationToken::new()).await.unwrap();
    assert_eq!(copied, data.len() as u64);

    let dest = fx.dest_dir.join("a.mxf");
    assert_eq!(std::fs::read(&dest).unwrap(), data);
    assert!(!job.file_path.exists(), "source should be deleted");
    assert!(!fx.dest_dir.join("a.mxf.copying").exists());
}

#[tokio::test]
async fn progress_events_are_emitted() {
    let fx = fixture();
    let mut rx = fx.bus.subscribe();
    let data = vec![1u8; 4 * 1024 * 1024 + 123];
    let job = seed_copying_record(&fx, "b.mxf", &data);

    fx.engine.execute(&job, &CancellationToken::new()).await.unwrap();

    let mut progress_events = 0;
    let mut final_bytes = 0;
    while let Ok(event) = rx.try_recv() {
        if let Event::FileCopyProgress { bytes_copied, total_bytes, .. } = event {
            progress_events += 1;
            assert!(bytes_copied <= total_bytes);
            final_bytes = bytes_copied;
        }
    }
    assert!(progress_events >= 2, "saw {progress_events} progress events");
    assert_eq!(final_bytes, data.len() as u64);
}

#[tokio::test]
async fn vanished_source_reports_source_vanished() {
    let fx = fixture();
    let job = seed_copying_record(&fx, "c.mxf", b"data");
    std::fs::remove_file(&job.file_path).unwrap();

    let err = fx.engine.execute(&job, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, CopyError::SourceVanished));
    assert!(!fx.dest_dir.join("c.mxf").exists());
    assert!(!fx.dest_dir.join("c.mxf.copying").exists());
}

#[tokio::test]
async fn growing_job_tails_until_stable() {
    let fx = fixture();
    let data = vec![9u8; 256 * 1024];
    let mut job = seed_copying_record(&fx, "d.mxf", &data);
    job.is_growing = true;

    // Settings builder uses a 2s growth timeout and 1s poll; with a zero
    // safety margin the whole file is drained once growth stops.
    let copied = fx.engine.execute(&job, &CancellationToken::new()).await.unwrap();
    assert_eq!(copied, data.len() as u64);
    assert_eq!(
        std::fs::metadata(fx.dest_dir.join("d.mxf")).unwrap().len(),
        data.len() as u64
    );
}

#[tokio::test]
async fn stale_temp_resumes_normal_copy() {
    let fx = fixture();
    let data: Vec<u8> = (0..3 * 1024 * 1024u32).map(|i| (i % 256) as u8).collect();
    let job = seed_copying_record(&fx, "e.mxf", &data);

    // A prior attempt left a clean 2 MiB prefix behind.
    let temp = fx.dest_dir.join("e.mxf.copying");
    std::fs::write(&temp, &data[..2 * 1024 * 1024]).unwrap();

    let copied = fx.engine.execute(&job, &CancellationToken::new()).await.unwrap();
    assert_eq!(copied, data.len() as u64);
    assert_eq!(std::fs::read(fx.dest_dir.join("e.mxf")).unwrap(), data);
}

#[tokio::test]
async fn cancelled_copy_cleans_temp() {
    let fx = fixture();
    let data = vec![3u8; 1024 * 1024];
    let job = seed_copying_record(&fx, "f.mxf", &data);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = fx.engine.execute(&job, &cancel).await.unwrap_err();
    assert!(matches!(err, CopyError::Cancelled));
    assert!(!fx.dest_dir.join("f.mxf.copying").exists());
    assert!(job.file_path.exists(), "source must survive a cancelled copy");
}
