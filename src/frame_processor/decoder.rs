// SPDX-License-Identifier: GPL-3.0-only

//! Camera-backed decoder
//!
//! Opens a [`CameraStream`] on start and runs a frame loop that samples at
//! the configured rate, runs the QR detector and forwards decoded text.
//! The pacing interval belongs to the loop, so every start begins with a
//! fresh schedule.

use super::qr_detector::QrDetector;
use crate::backends::camera::{BackendError, BackendResult, CameraBackend, CameraStream};
use crate::config::ScannerConfig;
use crate::scanner::{DecodeSender, Decoder};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

struct ActiveLoop {
    device_id: String,
    task: JoinHandle<()>,
}

/// [`Decoder`] that reads frames from a [`CameraBackend`]
pub struct QrFrameDecoder {
    backend: Arc<dyn CameraBackend>,
    detector: QrDetector,
    frame_interval: Duration,
    frame_buffer: usize,
    active: Mutex<Option<ActiveLoop>>,
}

impl QrFrameDecoder {
    pub fn new(backend: Arc<dyn CameraBackend>, config: &ScannerConfig) -> Self {
        Self {
            backend,
            detector: QrDetector::new(config.max_dimension),
            frame_interval: config.frame_interval(),
            frame_buffer: config.frame_buffer,
            active: Mutex::new(None),
        }
    }

    async fn start_loop(&self, device_id: &str, decoded: DecodeSender) -> BackendResult<()> {
        let mut active = self.active.lock().await;
        if let Some(current) = active.as_ref() {
            return Err(BackendError::InitializationFailed(format!(
                "decoder already running on {}",
                current.device_id
            )));
        }

        let stream = self.backend.open_stream(device_id, self.frame_buffer).await?;
        info!(device_id, interval_ms = self.frame_interval.as_millis(), "Decoder attached");

        let task = tokio::spawn(frame_loop(stream, self.detector, self.frame_interval, decoded));
        *active = Some(ActiveLoop {
            device_id: device_id.to_string(),
            task,
        });
        Ok(())
    }

    async fn stop_loop(&self) -> BackendResult<()> {
        let Some(active) = self.active.lock().await.take() else {
            return Ok(());
        };

        active.task.abort();
        match active.task.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => warn!(device_id = %active.device_id, error = %e, "Frame loop failed"),
        }
        info!(device_id = %active.device_id, "Decoder detached");
        Ok(())
    }
}

impl Decoder for QrFrameDecoder {
    fn start<'a>(
        &'a self,
        device_id: &'a str,
        decoded: DecodeSender,
    ) -> BoxFuture<'a, BackendResult<()>> {
        Box::pin(self.start_loop(device_id, decoded))
    }

    fn stop(&self) -> BoxFuture<'_, BackendResult<()>> {
        Box::pin(self.stop_loop())
    }
}

/// Sample, detect, forward; ends when the stream or the receiver goes away
async fn frame_loop(
    mut stream: CameraStream,
    detector: QrDetector,
    interval: Duration,
    decoded: DecodeSender,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let Some(frame) = stream.next_frame().await else {
            debug!(device_id = stream.device_id(), "Camera stream ended");
            break;
        };

        let Some(text) = detector.detect(frame).await.into_iter().next() else {
            continue;
        };

        if decoded.send(text).is_err() {
            debug!("Decode receiver dropped, stopping frame loop");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{CameraDevice, CameraFrame, PixelFormat};
    use crate::backends::virtual_camera::{FrameSource, VirtualCameraBackend};
    use tokio::sync::mpsc;

    fn backend() -> VirtualCameraBackend {
        let blank = Arc::new(CameraFrame::packed(32, 32, PixelFormat::Gray, vec![255; 32 * 32]));
        VirtualCameraBackend::new()
            .with_device(CameraDevice::new("cam", "Back Camera"), FrameSource::Frames(vec![blank]))
            .with_frame_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_start_and_stop_release_the_stream() {
        let backend = backend();
        let decoder = QrFrameDecoder::new(Arc::new(backend.clone()), &ScannerConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        decoder.start("cam", tx).await.unwrap();
        assert_eq!(backend.open_handles(), 1);

        decoder.stop().await.unwrap();
        assert_eq!(backend.open_handles(), 0);

        // Idempotent
        decoder.stop().await.unwrap();
        assert_eq!(backend.total_opened(), 1);
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let backend = backend();
        let decoder = QrFrameDecoder::new(Arc::new(backend.clone()), &ScannerConfig::default());

        let (tx, _rx) = mpsc::unbounded_channel();
        decoder.start("cam", tx.clone()).await.unwrap();
        assert!(matches!(
            decoder.start("cam", tx).await,
            Err(BackendError::InitializationFailed(_))
        ));
        assert_eq!(backend.peak_handles(), 1);

        decoder.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_device_fails_without_holding() {
        let backend = backend();
        let decoder = QrFrameDecoder::new(Arc::new(backend.clone()), &ScannerConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        assert!(matches!(
            decoder.start("missing", tx).await,
            Err(BackendError::DeviceNotFound(_))
        ));
        assert_eq!(backend.open_handles(), 0);
    }
}
