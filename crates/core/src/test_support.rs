// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders and proptest strategies shared across crates.

/// Proptest strategies for domain enums.
pub mod strategies {
    use crate::file::FileStatus;
    use crate::storage::StorageStatus;
    use proptest::prelude::*;

    pub const ALL_FILE_STATUSES: [FileStatus; 13] = [
        FileStatus::Discovered,
        FileStatus::Growing,
        FileStatus::ReadyToStartGrowing,
        FileStatus::Ready,
        FileStatus::InQueue,
        FileStatus::Copying,
        FileStatus::GrowingCopy,
        FileStatus::WaitingForSpace,
        FileStatus::WaitingForNetwork,
        FileStatus::SpaceError,
        FileStatus::Completed,
        FileStatus::Failed,
        FileStatus::Removed,
    ];

    pub fn arb_file_status() -> impl Strategy<Value = FileStatus> {
        proptest::sample::select(ALL_FILE_STATUSES.as_slice())
    }

    pub fn arb_storage_status() -> impl Strategy<Value = StorageStatus> {
        proptest::sample::select(
            [
                StorageStatus::Ok,
                StorageStatus::Warning,
                StorageStatus::Error,
                StorageStatus::Critical,
                StorageStatus::Unknown,
            ]
            .as_slice(),
        )
    }
}
