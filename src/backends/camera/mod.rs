// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌──────────────────────┐
//! │   Scanner (state)    │
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ CameraDeviceRegistry │  ← Enumeration, default selection
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ CameraBackend Trait  │  ← Common interface
//! └──────────┬───────────┘
//!            │
//!            ▼
//!     ┌──────────────┐
//!     │Virtual camera│  ← Concrete implementation
//!     └──────────────┘
//! ```

pub mod manager;
pub mod types;

pub use manager::CameraDeviceRegistry;
pub use types::*;

use futures::future::BoxFuture;
use tokio::sync::mpsc;

/// Receiver side of a camera stream
pub type FrameReceiver = mpsc::Receiver<std::sync::Arc<CameraFrame>>;

/// Exclusive handle to an open camera stream
///
/// The device stays acquired for as long as this value is alive. Dropping it
/// releases the device and ends frame delivery.
pub struct CameraStream {
    device_id: String,
    frames: FrameReceiver,
    _release: Box<dyn Send + Sync>,
}

impl CameraStream {
    /// Wrap a frame receiver together with whatever guard releases the device
    pub fn new(
        device_id: impl Into<String>,
        frames: FrameReceiver,
        release: impl Send + Sync + 'static,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            frames,
            _release: Box::new(release),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Wait for the next frame; `None` once the source is exhausted
    pub async fn next_frame(&mut self) -> Option<std::sync::Arc<CameraFrame>> {
        self.frames.recv().await
    }
}

impl std::fmt::Debug for CameraStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraStream")
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

/// Camera backend trait
///
/// All camera backends must implement this trait to provide:
/// - Device enumeration (may trigger a platform permission prompt)
/// - Exclusive stream acquisition for a single device
pub trait CameraBackend: Send + Sync {
    /// Enumerate available cameras on this backend
    ///
    /// An empty list is not an error at this layer; the registry decides.
    fn enumerate_cameras(&self) -> BoxFuture<'_, BackendResult<Vec<CameraDevice>>>;

    /// Open a stream on the given device
    ///
    /// Resolves once the stream is attached and frames can be pulled.
    /// `buffer` bounds the number of frames queued ahead of the consumer.
    fn open_stream<'a>(
        &'a self,
        device_id: &'a str,
        buffer: usize,
    ) -> BoxFuture<'a, BackendResult<CameraStream>>;
}
