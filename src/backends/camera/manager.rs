// SPDX-License-Identifier: GPL-3.0-only

//! Camera device registry
//!
//! The registry provides:
//! - Device enumeration with a uniform "no camera" / "permission" error policy
//! - Default device selection (rear-facing cameras first)

use super::CameraBackend;
use super::types::*;
use crate::errors::ScanError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Enumerates video inputs and picks the one the scanner should open first
#[derive(Clone)]
pub struct CameraDeviceRegistry {
    backend: Arc<dyn CameraBackend>,
    preferred_labels: Vec<String>,
}

impl CameraDeviceRegistry {
    /// Create a registry over a backend
    ///
    /// # Arguments
    /// * `backend` - Where devices come from
    /// * `preferred_labels` - Keywords for the default-device policy
    pub fn new(backend: Arc<dyn CameraBackend>, preferred_labels: Vec<String>) -> Self {
        Self {
            backend,
            preferred_labels,
        }
    }

    /// Enumerate available cameras
    ///
    /// # Returns
    /// * `Ok(devices)` - At least one device, in platform order
    /// * `Err(ScanError::NoCameraFound)` - The platform reported zero devices
    /// * `Err(ScanError::PermissionDenied)` - Enumeration was rejected
    pub async fn list_devices(&self) -> Result<Vec<CameraDevice>, ScanError> {
        let devices = self.backend.enumerate_cameras().await.map_err(|e| {
            warn!(error = %e, "Camera enumeration failed");
            match e {
                BackendError::PermissionDenied(_) => ScanError::PermissionDenied,
                other => ScanError::StartFailure(other.to_string()),
            }
        })?;

        if devices.is_empty() {
            warn!("No cameras found");
            return Err(ScanError::NoCameraFound);
        }

        info!(count = devices.len(), "Enumerated cameras");
        for device in &devices {
            debug!(id = %device.id, label = %device.label, "Camera available");
        }
        Ok(devices)
    }

    /// Pick the default device
    ///
    /// The first device whose label contains a preferred keyword wins,
    /// otherwise the first enumerated device. `None` only for an empty list.
    pub fn select_default<'a>(&self, devices: &'a [CameraDevice]) -> Option<&'a CameraDevice> {
        let selected = devices
            .iter()
            .find(|device| device.label_matches(&self.preferred_labels))
            .or_else(|| devices.first());

        if let Some(device) = selected {
            info!(id = %device.id, label = %device.label, "Selected default camera");
        }
        selected
    }
}

impl std::fmt::Debug for CameraDeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraDeviceRegistry")
            .field("preferred_labels", &self.preferred_labels)
            .finish_non_exhaustive()
    }
}
