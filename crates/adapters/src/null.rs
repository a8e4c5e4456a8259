// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Null mounter used when auto-mount is disabled or unconfigured.

use crate::mount::{MountAdapter, MountError, MountVerification};
use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct NullMounter;

impl NullMounter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MountAdapter for NullMounter {
    async fn attempt_mount(&self, _share_url: &str) -> Result<bool, MountError> {
        Ok(false)
    }

    async fn verify_mount(&self, _local_path: &Path) -> MountVerification {
        MountVerification { mounted: false, accessible: false }
    }

    fn platform_name(&self) -> &'static str {
        "not configured"
    }
}
