// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Represents a camera device
///
/// Devices are enumerated once per scanner open and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CameraDevice {
    /// Opaque identifier, stable for the lifetime of the scanner
    pub id: String,
    /// Human-readable label reported by the platform
    pub label: String,
}

impl CameraDevice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Label shortened to `max_chars` characters for the device picker
    pub fn display_label(&self, max_chars: usize) -> String {
        if self.label.chars().count() > max_chars {
            let truncated: String = self.label.chars().take(max_chars).collect();
            format!("{}…", truncated)
        } else {
            self.label.clone()
        }
    }

    /// Case-insensitive label match against any of the given keywords
    pub fn label_matches(&self, keywords: &[String]) -> bool {
        let label = self.label.to_lowercase();
        keywords
            .iter()
            .any(|keyword| label.contains(&keyword.to_lowercase()))
    }
}

impl std::fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.id)
    }
}

/// Pixel format for camera frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// Single 8-bit luma channel
    Gray,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::RGBA => 4,
            PixelFormat::Gray => 1,
        }
    }
}

/// A single video frame delivered by a camera stream
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Pixel data, `stride` bytes per row
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed frame (stride = width * bytes per pixel)
    pub fn packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * format.bytes_per_pixel() as u32,
            data: Arc::from(data),
            format,
            captured_at: Instant::now(),
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Enumeration or stream access was rejected
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Camera device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// Failed to attach to the device
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
    /// General I/O error
    #[error("I/O error: {0}")]
    IoError(String),
    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => BackendError::PermissionDenied(err.to_string()),
            _ => BackendError::IoError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label_truncates_long_labels() {
        let device = CameraDevice::new("cam-0", "Integrated Rear Camera Module (0bda:58f4)");
        let label = device.display_label(28);
        assert_eq!(label.chars().count(), 29);
        assert!(label.ends_with('…'));
        assert!(label.starts_with("Integrated Rear Camera"));
    }

    #[test]
    fn test_display_label_keeps_short_labels() {
        let device = CameraDevice::new("cam-0", "Front Camera");
        assert_eq!(device.display_label(28), "Front Camera");
    }

    #[test]
    fn test_label_matches_is_case_insensitive() {
        let device = CameraDevice::new("cam-1", "Camera 2, facing BACK");
        assert!(device.label_matches(&["back".to_string()]));
        assert!(!device.label_matches(&["rear".to_string(), "environment".to_string()]));
    }

    #[test]
    fn test_packed_frame_stride() {
        let frame = CameraFrame::packed(3, 2, PixelFormat::RGBA, vec![0; 24]);
        assert_eq!(frame.stride, 12);
        let gray = CameraFrame::packed(3, 2, PixelFormat::Gray, vec![0; 6]);
        assert_eq!(gray.stride, 3);
    }
}
