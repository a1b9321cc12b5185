// SPDX-License-Identifier: GPL-3.0-only

//! Scanner configuration
//!
//! Stored as JSON. Every field has a default, so a partial file (or no file
//! at all) is valid.

use crate::constants::{frames, paths, scanner};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Decode attempts per second while scanning
    pub fps: u32,
    /// Milliseconds the success state is shown before the outcome is delivered
    pub success_hold_ms: u64,
    /// Label keywords that mark the default (rear-facing) camera
    pub preferred_labels: Vec<String>,
    /// Device picker label length before truncation
    pub label_max_chars: usize,
    /// Longest frame side fed to the QR detector
    pub max_dimension: u32,
    /// Frames queued between camera stream and decoder
    pub frame_buffer: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            fps: scanner::DEFAULT_FPS,
            success_hold_ms: scanner::SUCCESS_HOLD.as_millis() as u64,
            preferred_labels: scanner::PREFERRED_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            label_max_chars: scanner::LABEL_MAX_CHARS,
            max_dimension: frames::MAX_DIMENSION,
            frame_buffer: frames::FRAME_BUFFER,
        }
    }
}

impl ScannerConfig {
    /// Time between decode attempts (`fps` of zero is treated as one)
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }

    pub fn success_hold(&self) -> Duration {
        Duration::from_millis(self.success_hold_ms)
    }

    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> AppResult<Self> {
        serde_json::from_str(text).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Default location: `<config dir>/medicard-scanner/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(paths::CONFIG_DIR_NAME)
                .join(paths::CONFIG_FILE_NAME)
        })
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one the default location is
    /// tried, and defaults are used if nothing is there.
    pub fn load(explicit: Option<&Path>) -> AppResult<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_file(&path),
            _ => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn load_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ScannerConfig::from_json(r#"{ "fps": 30 }"#).unwrap();
        assert_eq!(config.fps, 30);
        assert_eq!(config.success_hold_ms, 700);
        assert_eq!(config.preferred_labels, vec!["back", "rear", "environment"]);
    }

    #[test]
    fn test_zero_fps_is_clamped() {
        let config = ScannerConfig {
            fps: 0,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = ScannerConfig::from_json("{ fps: ").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = ScannerConfig::load(Some(Path::new("/nonexistent/config.json"))).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
