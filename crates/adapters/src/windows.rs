// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Windows network mounter: `net use` with an optional drive letter.

use crate::mount::{verify_directory, MountAdapter, MountError, MountVerification};
use crate::subprocess::{run_with_timeout, MOUNT_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct WindowsMounter {
    drive_letter: Option<String>,
}

impl WindowsMounter {
    pub fn new(drive_letter: Option<String>) -> Self {
        Self { drive_letter }
    }

    /// Turn an `smb://server/share` URL into a UNC path.
    pub fn unc_path_for(share_url: &str) -> String {
        let trimmed = share_url
            .strip_prefix("smb://")
            .or_else(|| share_url.strip_prefix("//"))
            .unwrap_or(share_url);
        format!("\\\\{}", trimmed.replace('/', "\\"))
    }
}

#[async_trait]
impl MountAdapter for WindowsMounter {
    async fn attempt_mount(&self, share_url: &str) -> Result<bool, MountError> {
        let unc = Self::unc_path_for(share_url);
        info!(share_url, unc, "attempting Windows mount");

        let mut cmd = Command::new("net");
        cmd.arg("use");
        if let Some(letter) = &self.drive_letter {
            cmd.arg(format!("{}:", letter.trim_end_matches(':')));
        }
        cmd.arg(&unc).arg("/persistent:no");

        let output = run_with_timeout(cmd, MOUNT_TIMEOUT, "net use").await?;
        if output.status.success() {
            info!(unc, "mount succeeded");
            Ok(true)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(unc, stderr = %stderr.trim(), "mount failed");
            Ok(false)
        }
    }

    async fn verify_mount(&self, local_path: &Path) -> MountVerification {
        verify_directory(local_path).await
    }

    fn platform_name(&self) -> &'static str {
        "Windows"
    }
}

#[cfg(test)]
#[path = "windows_tests.rs"]
mod tests;
