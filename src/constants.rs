// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Scanner defaults used when no configuration overrides them
pub mod scanner {
    use super::Duration;

    /// Decode attempts per second while scanning
    pub const DEFAULT_FPS: u32 = 12;

    /// How long the success state is held before the outcome is delivered
    pub const SUCCESS_HOLD: Duration = Duration::from_millis(700);

    /// Label keywords that identify a rear-facing camera (matched case-insensitively)
    pub const PREFERRED_LABELS: &[&str] = &["back", "rear", "environment"];

    /// Camera labels longer than this are truncated in the device picker
    pub const LABEL_MAX_CHARS: usize = 28;

    /// Capacity of the owner event channel
    pub const EVENT_BUFFER: usize = 8;

    /// Capacity of the command channel (retry / switch / close)
    pub const COMMAND_BUFFER: usize = 8;
}

/// Frame processing defaults
pub mod frames {
    /// Frames are downscaled so the longest side is at most this many pixels
    pub const MAX_DIMENSION: u32 = 640;

    /// Frames buffered between the camera stream and the decoder
    pub const FRAME_BUFFER: usize = 2;
}

/// Text shown by the scanner modal
pub mod messages {
    pub const DEFAULT_TITLE: &str = "Scan QR Code";
    pub const DEFAULT_SUBTITLE: &str = "Point camera at patient's MediCard QR";

    pub const PATIENT_TITLE: &str = "Scan Patient QR";
    pub const PATIENT_SUBTITLE: &str = "Point camera at patient's MediCard QR code";

    pub const PRESCRIPTION_TITLE: &str = "Scan Prescription QR";
    pub const PRESCRIPTION_SUBTITLE: &str = "Point camera at the prescription QR code";

    pub const STARTING_HINT: &str = "Starting camera…";
    pub const SCANNING_HINT: &str = "Hold steady · QR will auto-detect";
    pub const SUCCESS_HINT: &str = "QR Detected!";

    pub const NO_CAMERA: &str = "No camera found on this device.";
    pub const PERMISSION_DENIED: &str =
        "Camera permission denied. Please allow camera access and try again.";
    pub const START_FAILED: &str = "Could not start camera. Try a different camera or browser.";

    pub const DECODE_ERROR: &str = "Could not read QR code. Please try again.";
    pub const INVALID_PATIENT_QR: &str = "Invalid QR — not a MediCard patient QR.";
    pub const INVALID_MEDICARD_QR: &str = "Invalid QR — not a MediCard QR code.";
    pub const NO_PENDING_PRESCRIPTION: &str = "No pending prescriptions found for this patient.";
}

/// Supported image file formats for virtual camera sources
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Configuration file location
pub mod paths {
    /// Directory name under the platform config dir
    pub const CONFIG_DIR_NAME: &str = "medicard-scanner";

    /// Configuration file name
    pub const CONFIG_FILE_NAME: &str = "config.json";
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extensions_case_insensitive() {
        assert!(file_formats::is_image_extension("PNG"));
        assert!(file_formats::is_image_extension("jpeg"));
        assert!(!file_formats::is_image_extension("mp4"));
    }

    #[test]
    fn test_preferred_labels_lowercase() {
        for label in scanner::PREFERRED_LABELS {
            assert_eq!(*label, label.to_lowercase());
        }
    }
}
