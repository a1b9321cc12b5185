// SPDX-License-Identifier: GPL-3.0-only

//! Scan session: the single binding between a camera and the decoder
//!
//! ```text
//!            start(id)                 decoder attached
//!   Idle ───────────────▶ Starting(id) ─────────────────▶ Running(id)
//!    ▲                        │                              │
//!    └────────── stop() ──────┴──────────── stop() ──────────┘
//! ```
//!
//! `stop` is awaited to completion before any `start`, so two camera handles
//! never overlap. A session left in `Starting` (its start future was
//! dropped) is still released by `stop`.

use super::decoder::{DecodeReceiver, Decoder};
use crate::errors::ScanError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Binding {
    Idle,
    Starting(String),
    Running(String),
}

/// Owns the decoder binding for one scanner
pub struct ScanSession {
    decoder: Arc<dyn Decoder>,
    binding: Binding,
    decoded: Option<DecodeReceiver>,
}

impl ScanSession {
    pub fn new(decoder: Arc<dyn Decoder>) -> Self {
        Self {
            decoder,
            binding: Binding::Idle,
            decoded: None,
        }
    }

    /// True once the decoder is attached and decoding
    pub fn is_running(&self) -> bool {
        matches!(self.binding, Binding::Running(_))
    }

    /// Device the session is bound to (starting or running)
    pub fn device_id(&self) -> Option<&str> {
        match &self.binding {
            Binding::Idle => None,
            Binding::Starting(id) | Binding::Running(id) => Some(id),
        }
    }

    /// Bind the decoder to a device
    ///
    /// Any previous binding is stopped first. On failure nothing stays
    /// acquired and the session is idle again.
    pub async fn start(&mut self, device_id: &str) -> Result<(), ScanError> {
        self.stop().await;

        info!(device_id, "Starting scan session");
        let (tx, rx) = mpsc::unbounded_channel();
        self.binding = Binding::Starting(device_id.to_string());

        match self.decoder.start(device_id, tx).await {
            Ok(()) => {
                self.binding = Binding::Running(device_id.to_string());
                self.decoded = Some(rx);
                info!(device_id, "Scan session running");
                Ok(())
            }
            Err(e) => {
                warn!(device_id, error = %e, "Decoder failed to start");
                self.stop().await;
                Err(e.into())
            }
        }
    }

    /// Halt the decoder and release the camera
    ///
    /// Idempotent. Decoder errors during teardown are logged and swallowed;
    /// the session is idle afterwards either way.
    pub async fn stop(&mut self) {
        self.decoded = None;

        let Some(device_id) = self.device_id().map(str::to_string) else {
            debug!("Scan session already stopped");
            return;
        };

        if let Err(e) = self.decoder.stop().await {
            warn!(device_id = %device_id, error = %e, "Decoder stop reported an error");
        }

        // Only cleared after the decoder confirmed, so an interrupted stop is retried
        self.binding = Binding::Idle;
        info!(device_id = %device_id, "Scan session stopped");
    }

    /// Stop, then start on another device; the two bindings never overlap
    pub async fn switch(&mut self, device_id: &str) -> Result<(), ScanError> {
        info!(from = ?self.device_id(), to = device_id, "Switching scan device");
        self.stop().await;
        self.start(device_id).await
    }

    /// Wait for the next decoded text without stopping the session
    ///
    /// Cancel safe: if the future is dropped before it completes, no text
    /// has been taken off the channel. `None` means the decoder went away
    /// (stream ended) or the session is not running.
    pub async fn recv_decoded(&mut self) -> Option<String> {
        let text = match self.decoded.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        };
        if let Some(text) = &text {
            debug!(len = text.len(), "Decoded text received");
        }
        text
    }

    /// Wait for the next decoded text, then stop
    ///
    /// The camera is released before the text is returned. Not cancel safe:
    /// a text already received is lost if the future is dropped during the
    /// stop. Use [`Self::recv_decoded`] inside `select!`.
    pub async fn next_decode(&mut self) -> Option<String> {
        let text = self.recv_decoded().await;
        self.stop().await;
        text
    }
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{BackendError, BackendResult};
    use crate::scanner::decoder::DecodeSender;
    use futures::future::BoxFuture;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        sender: Mutex<Option<DecodeSender>>,
        fail: bool,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Decoder for Recorder {
        fn start<'a>(
            &'a self,
            device_id: &'a str,
            decoded: DecodeSender,
        ) -> BoxFuture<'a, BackendResult<()>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(format!("start:{}", device_id));
                if self.fail {
                    return Err(BackendError::InitializationFailed("busy".into()));
                }
                *self.sender.lock().unwrap() = Some(decoded);
                Ok(())
            })
        }

        fn stop(&self) -> BoxFuture<'_, BackendResult<()>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push("stop".into());
                *self.sender.lock().unwrap() = None;
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_stop_on_idle_session_is_noop() {
        let recorder = Arc::new(Recorder::default());
        let mut session = ScanSession::new(recorder.clone());
        session.stop().await;
        session.stop().await;
        assert!(recorder.calls().is_empty());
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_switch_stops_before_starting() {
        let recorder = Arc::new(Recorder::default());
        let mut session = ScanSession::new(recorder.clone());

        session.start("front").await.unwrap();
        session.switch("back").await.unwrap();

        assert_eq!(recorder.calls(), vec!["start:front", "stop", "start:back"]);
        assert_eq!(session.device_id(), Some("back"));
        assert!(session.is_running());
    }

    #[tokio::test]
    async fn test_failed_start_leaves_session_idle() {
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let mut session = ScanSession::new(recorder.clone());

        let err = session.start("cam").await.unwrap_err();
        assert!(matches!(err, ScanError::StartFailure(_)));
        assert_eq!(recorder.calls(), vec!["start:cam", "stop"]);
        assert!(session.device_id().is_none());
    }

    #[tokio::test]
    async fn test_next_decode_stops_before_returning() {
        let recorder = Arc::new(Recorder::default());
        let mut session = ScanSession::new(recorder.clone());
        session.start("cam").await.unwrap();

        let sender = recorder.sender.lock().unwrap().clone().unwrap();
        sender.send("first".into()).unwrap();
        sender.send("second".into()).unwrap();

        assert_eq!(session.next_decode().await.as_deref(), Some("first"));
        assert!(!session.is_running());
        assert_eq!(recorder.calls(), vec!["start:cam", "stop"]);

        // Nothing more is surfaced once stopped
        assert_eq!(session.next_decode().await, None);
    }

    #[tokio::test]
    async fn test_dropped_recv_keeps_pending_text() {
        let recorder = Arc::new(Recorder::default());
        let mut session = ScanSession::new(recorder.clone());
        session.start("cam").await.unwrap();

        // Cancelled before anything arrives
        let waited = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            session.recv_decoded(),
        )
        .await;
        assert!(waited.is_err());

        let sender = recorder.sender.lock().unwrap().clone().unwrap();
        sender.send("card".into()).unwrap();

        assert_eq!(session.recv_decoded().await.as_deref(), Some("card"));
        assert!(session.is_running());
        assert_eq!(recorder.calls(), vec!["start:cam"]);
    }
}
