// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn successful_command_returns_output() {
    let mut cmd = Command::new("echo");
    cmd.arg("hello");
    let output = run_with_timeout(cmd, Duration::from_secs(5), "echo").await.unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
}

#[tokio::test]
async fn failing_command_reports_status() {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg("exit 3");
    let output = run_with_timeout(cmd, Duration::from_secs(5), "sh").await.unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[tokio::test]
async fn hung_command_times_out() {
    let mut cmd = Command::new("sleep");
    cmd.arg("30");
    let err = run_with_timeout(cmd, Duration::from_millis(100), "sleep")
        .await
        .unwrap_err();
    assert!(matches!(err, MountError::TimedOut(_)));
}

#[tokio::test]
async fn missing_binary_is_spawn_error() {
    let cmd = Command::new("/nonexistent/binary-for-freight-tests");
    let err = run_with_timeout(cmd, Duration::from_secs(1), "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, MountError::Spawn(_)));
}
