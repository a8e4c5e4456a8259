// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded subprocess execution.

use crate::mount::MountError;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::warn;

/// Hard timeout for platform mount commands.
pub const MOUNT_TIMEOUT: Duration = Duration::from_secs(30);

/// Run a command, killing it if the timeout expires.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    label: &str,
) -> Result<Output, MountError> {
    cmd.kill_on_drop(true);
    let child = cmd.output();
    match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(MountError::Spawn(e)),
        Err(_) => {
            warn!(label, timeout_s = timeout.as_secs(), "subprocess timed out");
            Err(MountError::TimedOut(timeout.as_secs()))
        }
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
