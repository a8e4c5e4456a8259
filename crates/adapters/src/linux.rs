// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Linux passthrough: mounting is the host's job (fstab, systemd or
//! autofs); the adapter only verifies the mount point.

use crate::mount::{verify_directory, MountAdapter, MountError, MountVerification};
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxMounter;

impl LinuxMounter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MountAdapter for LinuxMounter {
    async fn attempt_mount(&self, share_url: &str) -> Result<bool, MountError> {
        debug!(share_url, "linux mounter does not mount; deferring to the host");
        Ok(false)
    }

    async fn verify_mount(&self, local_path: &Path) -> MountVerification {
        verify_directory(local_path).await
    }

    fn platform_name(&self) -> &'static str {
        "Linux"
    }
}
