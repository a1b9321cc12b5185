// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration loading

use medicard_scanner::{AppError, ScannerConfig};
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = ScannerConfig::default();

    assert_eq!(config.fps, 12);
    assert_eq!(config.success_hold(), Duration::from_millis(700));
    assert!(
        config.preferred_labels.iter().any(|l| l == "back"),
        "Rear-facing cameras should be preferred by default"
    );
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "fps": 5, "preferred_labels": ["usb"] }"#).unwrap();

    let config = ScannerConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(config.fps, 5);
    assert_eq!(config.preferred_labels, vec!["usb".to_string()]);
    assert_eq!(config.label_max_chars, ScannerConfig::default().label_max_chars);
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ScannerConfig::load(Some(dir.path().join("absent.json").as_path())).unwrap_err();
    assert!(matches!(err, AppError::Io(_)));
}

#[test]
fn test_malformed_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ fps: ").unwrap();

    match ScannerConfig::load(Some(path.as_path())) {
        Err(AppError::Config(msg)) => assert!(msg.contains("config.json")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_zero_fps_still_paces() {
    let config = ScannerConfig {
        fps: 0,
        ..Default::default()
    };
    assert_eq!(config.frame_interval(), Duration::from_secs(1));
}
