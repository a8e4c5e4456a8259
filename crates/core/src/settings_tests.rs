// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

fn parse(toml_text: &str) -> Settings {
    toml::from_str(toml_text).unwrap()
}

#[test]
fn minimal_config_uses_defaults() {
    let settings = parse(
        r#"
        source_directory = "/media/ingest"
        destination_directory = "/mnt/share"
        "#,
    );
    assert_eq!(settings.file_stable_time_seconds, 120);
    assert_eq!(settings.polling_interval_seconds, 10);
    assert!(settings.use_temporary_file);
    assert_eq!(settings.max_concurrent_copies, 1);
    assert_eq!(settings.copy_progress_update_interval, 1);
    assert_eq!(settings.storage_check_interval_seconds, 60);
    assert_eq!(settings.destination_warning_threshold_gb, 50.0);
    assert_eq!(settings.destination_critical_threshold_gb, 20.0);
    assert_eq!(settings.storage_test_file_prefix, ".freight_test_");
    assert!(settings.enable_pre_copy_space_check);
    assert_eq!(settings.copy_safety_margin_gb, 1.0);
    assert_eq!(settings.minimum_free_space_after_copy_gb, 2.0);
    assert_eq!(settings.space_retry_delay_seconds, 300);
    assert_eq!(settings.max_space_retries, 6);
    assert_eq!(settings.space_error_cooldown_minutes, 60);
    assert_eq!(settings.keep_completed_files_hours, 24);
    assert_eq!(settings.max_completed_files_in_memory, 1000);
    assert_eq!(settings.growing_file_min_size_mb, 100);
    assert_eq!(settings.growing_file_growth_timeout_seconds, 300);
    assert!(!settings.enable_auto_mount);
    assert!(settings.network_share_url.is_none());
}

#[test]
fn byte_accessors_convert_units() {
    let settings = parse(
        r#"
        source_directory = "/a"
        destination_directory = "/b"
        growing_file_min_size_mb = 2
        growing_file_chunk_size_kb = 512
        copy_safety_margin_gb = 1.0
        minimum_free_space_after_copy_gb = 0.5
        "#,
    );
    assert_eq!(settings.growing_min_size_bytes(), 2 * 1024 * 1024);
    assert_eq!(settings.growing_chunk_size_bytes(), 512 * 1024);
    assert_eq!(settings.copy_safety_margin_bytes(), 1024 * 1024 * 1024);
    assert_eq!(settings.minimum_free_after_copy_bytes(), 512 * 1024 * 1024);
}

#[test]
fn duration_accessors() {
    let settings = parse(
        r#"
        source_directory = "/a"
        destination_directory = "/b"
        file_stable_time_seconds = 7
        space_error_cooldown_minutes = 2
        "#,
    );
    assert_eq!(settings.stability_timeout(), Duration::from_secs(7));
    assert_eq!(settings.space_error_cooldown(), Duration::from_secs(120));
}

#[test]
fn load_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "source_directory = \"/in\"\ndestination_directory = \"/out\"\npolling_interval_seconds = 3"
    )
    .unwrap();
    let settings = Settings::load(file.path()).unwrap();
    assert_eq!(settings.source_directory, PathBuf::from("/in"));
    assert_eq!(settings.polling_interval_seconds, 3);
}

#[test]
fn load_missing_file_errors() {
    let err = Settings::load(Path::new("/nonexistent/freight.toml")).unwrap_err();
    assert!(matches!(err, SettingsError::Read(..)));
}

#[test]
fn empty_source_rejected() {
    let err = parse(
        r#"
        source_directory = ""
        destination_directory = "/out"
        "#,
    )
    .validate()
    .unwrap_err();
    assert!(matches!(err, SettingsError::MissingSource));
}

#[test]
fn empty_destination_rejected() {
    let err = parse(
        r#"
        source_directory = "/in"
        destination_directory = ""
        "#,
    )
    .validate()
    .unwrap_err();
    assert!(matches!(err, SettingsError::MissingDestination));
}

#[test]
fn builder_defaults_are_test_friendly() {
    let settings = Settings::builder().build();
    assert_eq!(settings.file_stable_time_seconds, 2);
    assert!(!settings.enable_pre_copy_space_check);
    settings.validate().unwrap();
}
