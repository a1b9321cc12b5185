// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner

use crate::backends::camera::BackendError;
use crate::constants::messages;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error for configuration, record loading and the CLI
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),
    /// Record tables could not be loaded
    #[error("Record store error: {0}")]
    Records(String),
    /// Camera backend failure outside of a scan
    #[error("Camera error: {0}")]
    Backend(#[from] BackendError),
    /// Scanner failure surfaced to the command line
    #[error("Scanner error: {0}")]
    Scan(#[from] ScanError),
    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything that can go wrong between opening the camera and resolving a payload
///
/// None of these are fatal: camera-level errors put the scanner into the
/// error state with a retry affordance, payload-level errors become a
/// [`ResolutionOutcome`](crate::payload::ResolutionOutcome).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The platform reported zero video inputs
    #[error("No camera devices found")]
    NoCameraFound,
    /// Enumeration or stream attach was rejected by the user or platform
    #[error("Camera permission denied")]
    PermissionDenied,
    /// The decoder could not attach to the selected device
    #[error("Failed to start camera: {0}")]
    StartFailure(String),
    /// Decoded text is not structured data
    #[error("Decoded text is not a structured payload")]
    DecodeParseError,
    /// Payload tag is missing or unknown, or the id is empty
    #[error("Unrecognised payload type")]
    InvalidPayloadType,
    /// Payload id has no matching record
    #[error("Record not found: {0}")]
    RecordNotFound(String),
}

impl ScanError {
    /// Camera-level errors offer a retry; payload-level errors do not
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScanError::NoCameraFound | ScanError::PermissionDenied | ScanError::StartFailure(_)
        )
    }

    /// Message shown in the scanner modal
    pub fn user_message(&self) -> String {
        match self {
            ScanError::NoCameraFound => messages::NO_CAMERA.to_string(),
            ScanError::PermissionDenied => messages::PERMISSION_DENIED.to_string(),
            ScanError::StartFailure(reason) if reason.trim().is_empty() => {
                messages::START_FAILED.to_string()
            }
            ScanError::StartFailure(reason) => reason.clone(),
            ScanError::DecodeParseError => messages::DECODE_ERROR.to_string(),
            ScanError::InvalidPayloadType => messages::INVALID_MEDICARD_QR.to_string(),
            ScanError::RecordNotFound(id) => format!("Record \"{}\" not found.", id),
        }
    }
}

impl From<BackendError> for ScanError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::PermissionDenied(_) => ScanError::PermissionDenied,
            other => ScanError::StartFailure(other.to_string()),
        }
    }
}
