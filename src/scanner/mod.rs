// SPDX-License-Identifier: GPL-3.0-only

//! QR scanner modal
//!
//! ```text
//!   owner ──open()──▶ ScannerHandle ──commands──▶ scanner task
//!     ▲                   │ status (watch)             │
//!     │                   │ devices (watch)            ├─▶ CameraDeviceRegistry
//!     └──── events ◀──────┘                            ├─▶ ScanSession ─▶ Decoder
//!       Resolved / Closed                              └─▶ PayloadRouter
//! ```
//!
//! [`Scanner::open`] spawns one task per modal. The owner drives it with
//! [`ScannerHandle::retry`], [`ScannerHandle::switch_device`] and
//! [`ScannerHandle::close`], and receives at most one
//! [`ScannerEvent::Resolved`] followed by exactly one [`ScannerEvent::Closed`].
//! The camera is always released before `Closed` is delivered.

pub mod decoder;
mod machine;
pub mod session;
pub mod state;

pub use decoder::{DecodeReceiver, DecodeSender, Decoder};
pub use session::ScanSession;
pub use state::ScanStatus;

use crate::backends::camera::{CameraBackend, CameraDevice, CameraDeviceRegistry};
use crate::config::ScannerConfig;
use crate::constants::scanner;
use crate::payload::{ResolutionOutcome, TargetContext, modal_text};
use crate::records::SharedRecords;
use machine::ScannerMachine;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// Owner requests to a running scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerCommand {
    /// Start again after an error (last device, or re-enumerate)
    Retry,
    /// Stop the current camera and start the given one
    SwitchDevice(String),
    /// Tear down; the session is released before `Closed`
    Close,
}

/// Notifications from the scanner to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum ScannerEvent {
    /// A code was decoded and routed; sent at most once
    Resolved(ResolutionOutcome),
    /// The scanner is gone and the camera released; always the last event
    Closed,
}

/// What the owner wants scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub context: TargetContext,
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

impl ScanRequest {
    pub fn new(context: TargetContext) -> Self {
        Self {
            context,
            title: None,
            subtitle: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// Everything a scanner modal needs, shared by every modal it opens
pub struct Scanner {
    registry: CameraDeviceRegistry,
    decoder: Arc<dyn Decoder>,
    records: SharedRecords,
    config: ScannerConfig,
    camera_lock: Arc<Mutex<()>>,
}

impl Scanner {
    pub fn new(
        backend: Arc<dyn CameraBackend>,
        decoder: Arc<dyn Decoder>,
        records: SharedRecords,
        config: ScannerConfig,
    ) -> Self {
        let registry = CameraDeviceRegistry::new(backend, config.preferred_labels.clone());
        Self {
            registry,
            decoder,
            records,
            config,
            camera_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Open a scanner modal
    ///
    /// Enumeration and camera start begin immediately on a spawned task, so
    /// this must be called from within a Tokio runtime. A second modal
    /// opened while one is alive waits for the first to close before it
    /// touches the camera.
    pub fn open(&self, request: ScanRequest) -> ScannerHandle {
        let (title, subtitle) = modal_text(request.context, request.title, request.subtitle);
        debug!(context = %request.context, title = %title, "Opening scanner");

        let (cmd_tx, cmd_rx) = mpsc::channel(scanner::COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::channel(scanner::EVENT_BUFFER);
        let (status_tx, status_rx) = watch::channel(ScanStatus::Idle);
        let (devices_tx, devices_rx) = watch::channel(Vec::new());

        let machine = ScannerMachine {
            context: request.context,
            registry: self.registry.clone(),
            session: ScanSession::new(self.decoder.clone()),
            records: self.records.clone(),
            success_hold: self.config.success_hold(),
            camera_lock: self.camera_lock.clone(),
            status: status_tx,
            devices: devices_tx,
            events: event_tx,
        };

        let task = tokio::spawn(machine.run(cmd_rx));

        ScannerHandle {
            context: request.context,
            title,
            subtitle,
            label_max_chars: self.config.label_max_chars,
            commands: cmd_tx,
            status: status_rx,
            devices: devices_rx,
            events: event_rx,
            task,
        }
    }
}

/// The owner's side of an open scanner
///
/// Dropping the handle closes the scanner.
pub struct ScannerHandle {
    context: TargetContext,
    title: String,
    subtitle: String,
    label_max_chars: usize,
    commands: mpsc::Sender<ScannerCommand>,
    status: watch::Receiver<ScanStatus>,
    devices: watch::Receiver<Vec<CameraDevice>>,
    events: mpsc::Receiver<ScannerEvent>,
    task: JoinHandle<()>,
}

impl ScannerHandle {
    pub fn context(&self) -> TargetContext {
        self.context
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    /// Current status
    pub fn status(&self) -> ScanStatus {
        self.status.borrow().clone()
    }

    /// Watch status changes
    pub fn subscribe(&self) -> watch::Receiver<ScanStatus> {
        self.status.clone()
    }

    /// Cameras found by the last enumeration
    pub fn devices(&self) -> Vec<CameraDevice> {
        self.devices.borrow().clone()
    }

    /// `(id, label)` pairs for a device picker, labels truncated
    pub fn device_options(&self) -> Vec<(String, String)> {
        self.devices
            .borrow()
            .iter()
            .map(|d| (d.id.clone(), d.display_label(self.label_max_chars)))
            .collect()
    }

    /// Try again after an error; ignored in any other state
    pub async fn retry(&self) {
        self.send(ScannerCommand::Retry).await;
    }

    /// Switch cameras; ignored while a camera is starting
    pub async fn switch_device(&self, device_id: impl Into<String>) {
        self.send(ScannerCommand::SwitchDevice(device_id.into())).await;
    }

    /// Ask the scanner to close; `Closed` follows once the camera is released
    pub async fn close(&self) {
        self.send(ScannerCommand::Close).await;
    }

    /// Next event, `None` after `Closed` has been received
    pub async fn next_event(&mut self) -> Option<ScannerEvent> {
        self.events.recv().await
    }

    /// Wait until the scanner closes, returning the outcome if one was produced
    pub async fn finished(mut self) -> Option<ResolutionOutcome> {
        let mut outcome = None;
        while let Some(event) = self.events.recv().await {
            match event {
                ScannerEvent::Resolved(resolved) => outcome = Some(resolved),
                ScannerEvent::Closed => break,
            }
        }

        if let Err(e) = (&mut self.task).await {
            tracing::error!(error = %e, "Scanner task failed");
        }
        outcome
    }

    async fn send(&self, command: ScannerCommand) {
        if self.commands.send(command).await.is_err() {
            debug!("Scanner already closed");
        }
    }
}

impl std::fmt::Debug for ScannerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerHandle")
            .field("context", &self.context)
            .field("title", &self.title)
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}
