// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::storage::StorageStatus;

#[test]
fn status_changed_serializes_with_type_tag() {
    let event = Event::FileStatusChanged {
        file_id: FileId::from_string("fil-1"),
        file_path: "/src/a.mxf".into(),
        old_status: Some(FileStatus::Ready),
        new_status: FileStatus::InQueue,
        timestamp: 123,
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "file:status_changed");
    assert_eq!(value["old_status"], "ready");
    assert_eq!(value["new_status"], "in_queue");
    assert_eq!(value["timestamp"], 123);
}

#[test]
fn creation_event_omits_old_status() {
    let event = Event::FileStatusChanged {
        file_id: FileId::from_string("fil-1"),
        file_path: "/src/a.mxf".into(),
        old_status: None,
        new_status: FileStatus::Discovered,
        timestamp: 1,
    };
    let value = serde_json::to_value(&event).unwrap();
    assert!(value.get("old_status").is_none());
}

#[test]
fn progress_event_roundtrip() {
    let event = Event::FileCopyProgress {
        file_id: FileId::from_string("fil-2"),
        bytes_copied: 1024,
        total_bytes: 4096,
        copy_speed_mbps: 12.5,
        timestamp: 99,
    };
    let json = serde_json::to_string(&event).unwrap();
    let parsed: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, event);
}

#[test]
fn storage_event_carries_info() {
    let event = Event::StorageStatusChanged {
        kind: StorageKind::Destination,
        info: StorageInfo::unknown("/dst"),
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "storage:status_changed");
    assert_eq!(value["kind"], "destination");
    assert_eq!(value["info"]["status"], "unknown");
}

#[test]
fn mount_event_phases() {
    let event = Event::MountStatusChanged {
        phase: MountPhase::NotConfigured,
        share_url: None,
        target_path: "/dst".into(),
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "storage:mount");
    assert_eq!(value["phase"], "not_configured");
    assert!(value.get("share_url").is_none());
}

#[test]
fn file_id_accessor() {
    let id = FileId::from_string("fil-9");
    let event = Event::FileCopyProgress {
        file_id: id,
        bytes_copied: 0,
        total_bytes: 0,
        copy_speed_mbps: 0.0,
        timestamp: 0,
    };
    assert_eq!(event.file_id(), Some(id));

    let event = Event::ScannerStatusChanged { running: true, timestamp: 0 };
    assert_eq!(event.file_id(), None);
}
