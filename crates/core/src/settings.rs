// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon settings, loaded from a TOML file.
//!
//! Every tuning knob has a serde default matching the shipped
//! configuration; only the source and destination directories are
//! mandatory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const BYTES_PER_MB: u64 = 1024 * 1024;
const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to parse settings file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("source_directory must not be empty")]
    MissingSource,

    #[error("destination_directory must not be empty")]
    MissingDestination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // Paths
    pub source_directory: PathBuf,
    pub destination_directory: PathBuf,

    // Scanner timing
    #[serde(default = "defaults::file_stable_time_seconds")]
    pub file_stable_time_seconds: u64,
    #[serde(default = "defaults::polling_interval_seconds")]
    pub polling_interval_seconds: u64,

    // Copying
    #[serde(default = "defaults::use_temporary_file")]
    pub use_temporary_file: bool,
    #[serde(default = "defaults::max_concurrent_copies")]
    pub max_concurrent_copies: usize,
    /// Legacy local retry policy; unused in fail-and-rediscover mode.
    #[serde(default = "defaults::max_retry_attempts")]
    pub max_retry_attempts: u32,
    #[serde(default = "defaults::retry_delay_seconds")]
    pub retry_delay_seconds: u64,
    /// Emit a progress event every N percent.
    #[serde(default = "defaults::copy_progress_update_interval")]
    pub copy_progress_update_interval: u32,
    #[serde(default = "defaults::enable_resumable_copy")]
    pub enable_resumable_copy: bool,

    // Logging
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<PathBuf>,

    // Storage monitoring
    #[serde(default = "defaults::storage_check_interval_seconds")]
    pub storage_check_interval_seconds: u64,
    #[serde(default = "defaults::source_warning_threshold_gb")]
    pub source_warning_threshold_gb: f64,
    #[serde(default = "defaults::source_critical_threshold_gb")]
    pub source_critical_threshold_gb: f64,
    #[serde(default = "defaults::destination_warning_threshold_gb")]
    pub destination_warning_threshold_gb: f64,
    #[serde(default = "defaults::destination_critical_threshold_gb")]
    pub destination_critical_threshold_gb: f64,
    #[serde(default = "defaults::storage_test_file_prefix")]
    pub storage_test_file_prefix: String,

    // Space management
    #[serde(default = "defaults::enable_pre_copy_space_check")]
    pub enable_pre_copy_space_check: bool,
    #[serde(default = "defaults::copy_safety_margin_gb")]
    pub copy_safety_margin_gb: f64,
    #[serde(default = "defaults::minimum_free_space_after_copy_gb")]
    pub minimum_free_space_after_copy_gb: f64,
    #[serde(default = "defaults::space_retry_delay_seconds")]
    pub space_retry_delay_seconds: u64,
    #[serde(default = "defaults::max_space_retries")]
    pub max_space_retries: u32,
    #[serde(default = "defaults::space_error_cooldown_minutes")]
    pub space_error_cooldown_minutes: u64,

    // Repository eviction
    #[serde(default = "defaults::keep_completed_files_hours")]
    pub keep_completed_files_hours: u64,
    #[serde(default = "defaults::max_completed_files_in_memory")]
    pub max_completed_files_in_memory: usize,

    // Growing-file support
    #[serde(default = "defaults::growing_file_min_size_mb")]
    pub growing_file_min_size_mb: u64,
    #[serde(default = "defaults::growing_file_poll_interval_seconds")]
    pub growing_file_poll_interval_seconds: u64,
    #[serde(default = "defaults::growing_file_growth_timeout_seconds")]
    pub growing_file_growth_timeout_seconds: u64,
    #[serde(default = "defaults::growing_file_safety_margin_mb")]
    pub growing_file_safety_margin_mb: u64,
    #[serde(default = "defaults::growing_file_chunk_size_kb")]
    pub growing_file_chunk_size_kb: u64,

    // Network mount
    #[serde(default)]
    pub enable_auto_mount: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_share_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows_drive_letter: Option<String>,
}

mod defaults {
    pub fn file_stable_time_seconds() -> u64 {
        120
    }
    pub fn polling_interval_seconds() -> u64 {
        10
    }
    pub fn use_temporary_file() -> bool {
        true
    }
    pub fn max_concurrent_copies() -> usize {
        1
    }
    pub fn max_retry_attempts() -> u32 {
        3
    }
    pub fn retry_delay_seconds() -> u64 {
        10
    }
    pub fn copy_progress_update_interval() -> u32 {
        1
    }
    pub fn enable_resumable_copy() -> bool {
        true
    }
    pub fn log_level() -> String {
        "info".to_string()
    }
    pub fn storage_check_interval_seconds() -> u64 {
        60
    }
    pub fn source_warning_threshold_gb() -> f64 {
        10.0
    }
    pub fn source_critical_threshold_gb() -> f64 {
        5.0
    }
    pub fn destination_warning_threshold_gb() -> f64 {
        50.0
    }
    pub fn destination_critical_threshold_gb() -> f64 {
        20.0
    }
    pub fn storage_test_file_prefix() -> String {
        ".freight_test_".to_string()
    }
    pub fn enable_pre_copy_space_check() -> bool {
        true
    }
    pub fn copy_safety_margin_gb() -> f64 {
        1.0
    }
    pub fn minimum_free_space_after_copy_gb() -> f64 {
        2.0
    }
    pub fn space_retry_delay_seconds() -> u64 {
        300
    }
    pub fn max_space_retries() -> u32 {
        6
    }
    pub fn space_error_cooldown_minutes() -> u64 {
        60
    }
    pub fn keep_completed_files_hours() -> u64 {
        24
    }
    pub fn max_completed_files_in_memory() -> usize {
        1000
    }
    pub fn growing_file_min_size_mb() -> u64 {
        100
    }
    pub fn growing_file_poll_interval_seconds() -> u64 {
        5
    }
    pub fn growing_file_growth_timeout_seconds() -> u64 {
        300
    }
    pub fn growing_file_safety_margin_mb() -> u64 {
        50
    }
    pub fn growing_file_chunk_size_kb() -> u64 {
        2048
    }
}

impl Settings {
    /// Load settings from a TOML file and validate the mandatory paths.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Read(path.to_path_buf(), e))?;
        let settings: Settings =
            toml::from_str(&text).map_err(|e| SettingsError::Parse(path.to_path_buf(), e))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.source_directory.as_os_str().is_empty() {
            return Err(SettingsError::MissingSource);
        }
        if self.destination_directory.as_os_str().is_empty() {
            return Err(SettingsError::MissingDestination);
        }
        Ok(())
    }

    pub fn stability_timeout(&self) -> Duration {
        Duration::from_secs(self.file_stable_time_seconds)
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_seconds)
    }

    pub fn storage_check_interval(&self) -> Duration {
        Duration::from_secs(self.storage_check_interval_seconds)
    }

    pub fn space_retry_delay(&self) -> Duration {
        Duration::from_secs(self.space_retry_delay_seconds)
    }

    pub fn space_error_cooldown(&self) -> Duration {
        Duration::from_secs(self.space_error_cooldown_minutes * 60)
    }

    pub fn growing_poll_interval(&self) -> Duration {
        Duration::from_secs(self.growing_file_poll_interval_seconds)
    }

    pub fn growth_timeout(&self) -> Duration {
        Duration::from_secs(self.growing_file_growth_timeout_seconds)
    }

    pub fn growing_min_size_bytes(&self) -> u64 {
        self.growing_file_min_size_mb * BYTES_PER_MB
    }

    pub fn growing_safety_margin_bytes(&self) -> u64 {
        self.growing_file_safety_margin_mb * BYTES_PER_MB
    }

    pub fn growing_chunk_size_bytes(&self) -> u64 {
        self.growing_file_chunk_size_kb * 1024
    }

    pub fn copy_safety_margin_bytes(&self) -> u64 {
        (self.copy_safety_margin_gb * BYTES_PER_GB as f64) as u64
    }

    pub fn minimum_free_after_copy_bytes(&self) -> u64 {
        (self.minimum_free_space_after_copy_gb * BYTES_PER_GB as f64) as u64
    }
}

crate::builder! {
    pub struct SettingsBuilder => Settings {
        into {
            source_directory: PathBuf = "/src",
            destination_directory: PathBuf = "/dst",
            log_level: String = "info",
            storage_test_file_prefix: String = ".freight_test_",
        }
        set {
            file_stable_time_seconds: u64 = 2,
            polling_interval_seconds: u64 = 1,
            use_temporary_file: bool = true,
            max_concurrent_copies: usize = 1,
            max_retry_attempts: u32 = 3,
            retry_delay_seconds: u64 = 10,
            copy_progress_update_interval: u32 = 1,
            enable_resumable_copy: bool = true,
            storage_check_interval_seconds: u64 = 1,
            source_warning_threshold_gb: f64 = 10.0,
            source_critical_threshold_gb: f64 = 5.0,
            destination_warning_threshold_gb: f64 = 50.0,
            destination_critical_threshold_gb: f64 = 20.0,
            enable_pre_copy_space_check: bool = false,
            copy_safety_margin_gb: f64 = 1.0,
            minimum_free_space_after_copy_gb: f64 = 2.0,
            space_retry_delay_seconds: u64 = 1,
            max_space_retries: u32 = 3,
            space_error_cooldown_minutes: u64 = 60,
            keep_completed_files_hours: u64 = 24,
            max_completed_files_in_memory: usize = 1000,
            growing_file_min_size_mb: u64 = 100,
            growing_file_poll_interval_seconds: u64 = 1,
            growing_file_growth_timeout_seconds: u64 = 2,
            growing_file_safety_margin_mb: u64 = 0,
            growing_file_chunk_size_kb: u64 = 2048,
            enable_auto_mount: bool = false,
        }
        option {
            log_file_path: PathBuf = None,
            network_share_url: String = None,
            windows_drive_letter: String = None,
        }
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
