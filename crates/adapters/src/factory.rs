// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform factory: selects a mounter at startup.

use crate::linux::LinuxMounter;
use crate::macos::MacosMounter;
use crate::mount::MountAdapter;
use crate::null::NullMounter;
use crate::windows::WindowsMounter;
use freight_core::Settings;
use std::sync::Arc;
use tracing::info;

/// Build the mount adapter for this host.
///
/// Returns the null adapter when auto-mount is disabled or no share URL
/// is configured; otherwise picks the OS-specific variant.
pub fn platform_mounter(settings: &Settings) -> Arc<dyn MountAdapter> {
    if !settings.enable_auto_mount || settings.network_share_url.is_none() {
        info!("network auto-mount not configured");
        return Arc::new(NullMounter::new());
    }
    let mounter = select_for_os(std::env::consts::OS, settings);
    info!(platform = mounter.platform_name(), "network mounter initialized");
    mounter
}

fn select_for_os(os: &str, settings: &Settings) -> Arc<dyn MountAdapter> {
    match os {
        "macos" => Arc::new(MacosMounter::new()),
        "windows" => Arc::new(WindowsMounter::new(settings.windows_drive_letter.clone())),
        "linux" => Arc::new(LinuxMounter::new()),
        other => {
            info!(os = other, "no mounter for this platform");
            Arc::new(NullMounter::new())
        }
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
