// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! Exposes still images as camera devices so the scanner pipeline can run
//! without hardware. A source directory maps to devices like this:
//!
//! ```text
//! source/
//! ├── Back Camera/     → device "Back Camera"
//! │   ├── 001.png
//! │   └── 002.png
//! └── Front Camera/    → device "Front Camera"
//!     └── 001.png
//! ```
//!
//! A directory holding images directly is a single device named after it.
//! Open streams are counted so tests can verify exclusive acquisition.

mod file_source;

pub use file_source::{list_image_files, load_image_as_frame};

use crate::backends::camera::types::{BackendError, BackendResult, CameraDevice, CameraFrame};
use crate::backends::camera::{CameraBackend, CameraStream};
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Where a virtual device gets its frames from
#[derive(Debug, Clone)]
pub enum FrameSource {
    /// Image files, decoded when the stream is opened
    Files(Vec<PathBuf>),
    /// Frames already in memory
    Frames(Vec<Arc<CameraFrame>>),
}

#[derive(Debug, Clone)]
struct VirtualDevice {
    device: CameraDevice,
    source: FrameSource,
}

/// Counts open streams and remembers the highest concurrency seen
#[derive(Debug, Default)]
struct HandleCounter {
    open: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

/// Releases one open handle on drop
struct HandleGuard {
    counter: Arc<HandleCounter>,
    device_id: String,
}

impl HandleGuard {
    fn acquire(counter: &Arc<HandleCounter>, device_id: &str) -> Self {
        let open = counter.open.fetch_add(1, Ordering::SeqCst) + 1;
        counter.peak.fetch_max(open, Ordering::SeqCst);
        counter.total.fetch_add(1, Ordering::SeqCst);
        debug!(device_id, open, "Virtual camera handle acquired");
        Self {
            counter: Arc::clone(counter),
            device_id: device_id.to_string(),
        }
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        let open = self.counter.open.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(device_id = %self.device_id, open, "Virtual camera handle released");
    }
}

/// Camera backend that replays images as live frames
#[derive(Debug, Clone)]
pub struct VirtualCameraBackend {
    devices: Vec<VirtualDevice>,
    frame_interval: Duration,
    handles: Arc<HandleCounter>,
    deny_permission: bool,
}

impl Default for VirtualCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualCameraBackend {
    /// Create a backend without devices
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            frame_interval: Duration::from_millis(33),
            handles: Arc::new(HandleCounter::default()),
            deny_permission: false,
        }
    }

    /// Build devices from a source directory (see module docs)
    pub fn from_directory(dir: &Path) -> BackendResult<Self> {
        let mut backend = Self::new();

        let direct = list_image_files(dir)?;
        if !direct.is_empty() {
            let label = dir_label(dir);
            backend = backend.with_device(
                CameraDevice::new(label.clone(), label),
                FrameSource::Files(direct),
            );
        }

        let mut subdirs: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        subdirs.sort();

        for subdir in subdirs {
            let files = list_image_files(&subdir)?;
            if files.is_empty() {
                continue;
            }
            let label = dir_label(&subdir);
            backend = backend.with_device(
                CameraDevice::new(label.clone(), label),
                FrameSource::Files(files),
            );
        }

        info!(dir = %dir.display(), devices = backend.devices.len(), "Virtual cameras loaded");
        Ok(backend)
    }

    /// Add a device
    pub fn with_device(mut self, device: CameraDevice, source: FrameSource) -> Self {
        self.devices.push(VirtualDevice { device, source });
        self
    }

    /// Delay between frames on an open stream
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Make enumeration fail as if the user dismissed the permission prompt
    pub fn with_permission_denied(mut self, denied: bool) -> Self {
        self.deny_permission = denied;
        self
    }

    /// Streams currently open
    pub fn open_handles(&self) -> usize {
        self.handles.open.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously open streams so far
    pub fn peak_handles(&self) -> usize {
        self.handles.peak.load(Ordering::SeqCst)
    }

    /// Streams opened over the backend's lifetime
    pub fn total_opened(&self) -> usize {
        self.handles.total.load(Ordering::SeqCst)
    }

    async fn load_frames(source: FrameSource) -> BackendResult<Vec<Arc<CameraFrame>>> {
        match source {
            FrameSource::Frames(frames) => Ok(frames),
            FrameSource::Files(paths) => tokio::task::spawn_blocking(move || {
                paths
                    .iter()
                    .map(|path| load_image_as_frame(path).map(Arc::new))
                    .collect::<BackendResult<Vec<_>>>()
            })
            .await
            .map_err(|e| BackendError::Other(format!("Frame loader panicked: {}", e)))?,
        }
    }
}

impl CameraBackend for VirtualCameraBackend {
    fn enumerate_cameras(&self) -> BoxFuture<'_, BackendResult<Vec<CameraDevice>>> {
        Box::pin(async move {
            if self.deny_permission {
                return Err(BackendError::PermissionDenied(
                    "camera access was not granted".to_string(),
                ));
            }
            Ok(self.devices.iter().map(|d| d.device.clone()).collect())
        })
    }

    fn open_stream<'a>(
        &'a self,
        device_id: &'a str,
        buffer: usize,
    ) -> BoxFuture<'a, BackendResult<CameraStream>> {
        Box::pin(async move {
            let device = self
                .devices
                .iter()
                .find(|d| d.device.id == device_id)
                .ok_or_else(|| BackendError::DeviceNotFound(device_id.to_string()))?;

            let frames = Self::load_frames(device.source.clone()).await?;
            if frames.is_empty() {
                return Err(BackendError::InitializationFailed(format!(
                    "virtual camera '{}' has no frames",
                    device_id
                )));
            }

            let guard = HandleGuard::acquire(&self.handles, device_id);
            let (tx, rx) = mpsc::channel(buffer.max(1));
            let interval = self.frame_interval;
            let name = device_id.to_string();

            // Producer ends as soon as the stream (receiver) is dropped
            tokio::spawn(async move {
                for frame in frames.iter().cycle() {
                    if tx.send(Arc::clone(frame)).await.is_err() {
                        break;
                    }
                    tokio::time::sleep(interval).await;
                }
                debug!(device_id = %name, "Virtual camera producer exiting");
            });

            Ok(CameraStream::new(device_id, rx, guard))
        })
    }
}

fn dir_label(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.display().to_string())
}
