// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! macOS network mounter: `osascript -e 'mount volume ...'`.

use crate::mount::{verify_directory, MountAdapter, MountError, MountVerification};
use crate::subprocess::{run_with_timeout, MOUNT_TIMEOUT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct MacosMounter;

impl MacosMounter {
    pub fn new() -> Self {
        Self
    }

    /// Expected mount point for a share URL: `/Volumes/<share name>`.
    pub fn mount_point_for(share_url: &str) -> PathBuf {
        let share_name = share_url.rsplit('/').next().unwrap_or(share_url);
        PathBuf::from("/Volumes").join(share_name)
    }
}

#[async_trait]
impl MountAdapter for MacosMounter {
    async fn attempt_mount(&self, share_url: &str) -> Result<bool, MountError> {
        // Skip the mount when the expected volume is already usable.
        let expected = Self::mount_point_for(share_url);
        let existing = verify_directory(&expected).await;
        if existing.mounted && existing.accessible {
            debug!(share_url, mount_point = %expected.display(), "share already mounted");
            return Ok(true);
        }

        info!(share_url, "attempting macOS mount");
        let mut cmd = Command::new("osascript");
        cmd.arg("-e").arg(format!("mount volume \"{share_url}\""));

        let output = run_with_timeout(cmd, MOUNT_TIMEOUT, "osascript mount").await?;
        if output.status.success() {
            info!(share_url, "mount succeeded");
            Ok(true)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(share_url, stderr = %stderr.trim(), "mount failed");
            Ok(false)
        }
    }

    async fn verify_mount(&self, local_path: &Path) -> MountVerification {
        verify_directory(local_path).await
    }

    fn platform_name(&self) -> &'static str {
        "macOS"
    }
}

#[cfg(test)]
#[path = "macos_tests.rs"]
mod tests;
