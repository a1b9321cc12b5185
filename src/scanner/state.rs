// SPDX-License-Identifier: GPL-3.0-only

//! Scanner status as observed by the owner

use crate::constants::messages;
use crate::errors::ScanError;

/// Lifecycle of one scanner modal
///
/// ```text
/// Idle ─▶ Starting ─▶ Scanning ─▶ Success (terminal)
///           │            │
///           ▼            ▼
///         Error ◀────────┘   (retry ─▶ Starting)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    /// Nothing bound yet, or between a device switch and the next start
    Idle,
    /// Camera requested, decoder attaching
    Starting { device_id: String },
    /// Decoder running on the device
    Scanning { device_id: String },
    /// A code was decoded; the session is already released
    Success,
    /// Acquisition failed; retry is available
    Error { error: ScanError },
}

impl ScanStatus {
    pub fn name(&self) -> &'static str {
        match self {
            ScanStatus::Idle => "idle",
            ScanStatus::Starting { .. } => "starting",
            ScanStatus::Scanning { .. } => "scanning",
            ScanStatus::Success => "success",
            ScanStatus::Error { .. } => "error",
        }
    }

    /// Device the status refers to, if any
    pub fn device_id(&self) -> Option<&str> {
        match self {
            ScanStatus::Starting { device_id } | ScanStatus::Scanning { device_id } => {
                Some(device_id)
            }
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ScanError> {
        match self {
            ScanStatus::Error { error } => Some(error),
            _ => None,
        }
    }

    /// The hint line shown under the viewfinder
    pub fn hint(&self) -> Option<String> {
        match self {
            ScanStatus::Idle => None,
            ScanStatus::Starting { .. } => Some(messages::STARTING_HINT.to_string()),
            ScanStatus::Scanning { .. } => Some(messages::SCANNING_HINT.to_string()),
            ScanStatus::Success => Some(messages::SUCCESS_HINT.to_string()),
            ScanStatus::Error { error } => Some(error.user_message()),
        }
    }

    /// Whether the owner may offer "try again"
    pub fn can_retry(&self) -> bool {
        matches!(self, ScanStatus::Error { .. })
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.device_id() {
            Some(device) => write!(f, "{} ({})", self.name(), device),
            None => f.write_str(self.name()),
        }
    }
}
