// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! freight-adapters: platform-specific collaborators.
//!
//! Network mounters (macOS, Windows, a Linux passthrough and a null
//! variant) behind one object-safe trait, plus the bounded-subprocess
//! helper they share.

pub mod factory;
pub mod linux;
pub mod macos;
pub mod mount;
pub mod null;
pub mod subprocess;
pub mod windows;

pub use factory::platform_mounter;
pub use linux::LinuxMounter;
pub use macos::MacosMounter;
pub use mount::{MountAdapter, MountError, MountVerification};
pub use null::NullMounter;
pub use subprocess::{run_with_timeout, MOUNT_TIMEOUT};
pub use windows::WindowsMounter;

#[cfg(any(test, feature = "test-support"))]
pub use mount::{FakeMounter, MountCall};
