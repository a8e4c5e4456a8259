// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn settings_with_mount(enabled: bool, url: Option<&str>) -> Settings {
    let mut builder = Settings::builder().enable_auto_mount(enabled);
    if let Some(url) = url {
        builder = builder.network_share_url(url);
    }
    builder.build()
}

#[test]
fn disabled_auto_mount_yields_null() {
    let settings = settings_with_mount(false, Some("smb://nas/media"));
    let mounter = platform_mounter(&settings);
    assert_eq!(mounter.platform_name(), "not configured");
}

#[test]
fn missing_share_url_yields_null() {
    let settings = settings_with_mount(true, None);
    let mounter = platform_mounter(&settings);
    assert_eq!(mounter.platform_name(), "not configured");
}

#[yare::parameterized(
    macos   = { "macos", "macOS" },
    windows = { "windows", "Windows" },
    linux   = { "linux", "Linux" },
    other   = { "freebsd", "not configured" },
)]
fn os_selection(os: &str, expected: &str) {
    let settings = settings_with_mount(true, Some("smb://nas/media"));
    assert_eq!(select_for_os(os, &settings).platform_name(), expected);
}
