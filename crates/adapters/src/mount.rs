// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network mount adapter trait.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from mount operations
#[derive(Debug, Error)]
pub enum MountError {
    #[error("mount command failed: {0}")]
    CommandFailed(String),

    #[error("mount operation timed out after {0}s")]
    TimedOut(u64),

    #[error("spawn failed: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Result of checking a mount point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountVerification {
    /// The mount point exists as a directory.
    pub mounted: bool,
    /// The mount point can actually be listed.
    pub accessible: bool,
}

/// Platform-specific network mounting.
///
/// The storage monitor drives this when the destination disappears:
/// verify first, mount if needed, verify again.
#[async_trait]
pub trait MountAdapter: Send + Sync + 'static {
    /// Try to mount the share. `Ok(true)` means the mount command
    /// succeeded; follow with [`verify_mount`](Self::verify_mount).
    async fn attempt_mount(&self, share_url: &str) -> Result<bool, MountError>;

    /// Check whether the local path is a usable mount point.
    async fn verify_mount(&self, local_path: &Path) -> MountVerification;

    /// Platform name for logging.
    fn platform_name(&self) -> &'static str;
}

/// Shared verification: the path must exist as a directory and be
/// listable within a short bound.
pub(crate) async fn verify_directory(local_path: &Path) -> MountVerification {
    let path = local_path.to_path_buf();
    let check = tokio::task::spawn_blocking(move || {
        let mounted = path.is_dir();
        let accessible = mounted && std::fs::read_dir(&path).is_ok();
        MountVerification { mounted, accessible }
    });
    match tokio::time::timeout(std::time::Duration::from_secs(5), check).await {
        Ok(Ok(result)) => result,
        _ => MountVerification { mounted: false, accessible: false },
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{MountAdapter, MountError, MountVerification};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::Path;
    use std::sync::Arc;

    /// Recorded mount attempt
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MountCall {
        pub share_url: String,
    }

    struct FakeMounterState {
        calls: Vec<MountCall>,
        mount_result: bool,
        verification: MountVerification,
    }

    /// Scripted mount adapter for testing
    #[derive(Clone)]
    pub struct FakeMounter {
        inner: Arc<Mutex<FakeMounterState>>,
    }

    impl Default for FakeMounter {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeMounterState {
                    calls: Vec::new(),
                    mount_result: true,
                    verification: MountVerification { mounted: true, accessible: true },
                })),
            }
        }
    }

    impl FakeMounter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_mount_result(self, result: bool) -> Self {
            self.inner.lock().mount_result = result;
            self
        }

        pub fn with_verification(self, mounted: bool, accessible: bool) -> Self {
            self.inner.lock().verification = MountVerification { mounted, accessible };
            self
        }

        /// Get all recorded mount attempts
        pub fn calls(&self) -> Vec<MountCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl MountAdapter for FakeMounter {
        async fn attempt_mount(&self, share_url: &str) -> Result<bool, MountError> {
            let mut state = self.inner.lock();
            state.calls.push(MountCall { share_url: share_url.to_string() });
            Ok(state.mount_result)
        }

        async fn verify_mount(&self, _local_path: &Path) -> MountVerification {
            self.inner.lock().verification
        }

        fn platform_name(&self) -> &'static str {
            "fake"
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMounter, MountCall};

#[cfg(test)]
#[path = "mount_tests.rs"]
mod tests;
