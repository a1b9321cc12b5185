// SPDX-License-Identifier: GPL-3.0-only

//! The scanner task
//!
//! One task per open scanner. It owns the [`ScanSession`], publishes
//! [`ScanStatus`] on a watch channel and reacts to owner commands. Whatever
//! path ends the task, the session is stopped before `Closed` is sent.

use super::session::ScanSession;
use super::state::ScanStatus;
use super::{ScannerCommand, ScannerEvent};
use crate::backends::camera::{CameraDevice, CameraDeviceRegistry};
use crate::errors::ScanError;
use crate::payload::{PayloadRouter, ResolutionOutcome, TargetContext};
use crate::records::SharedRecords;
use std::future::Future;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, warn};

enum Phase {
    Enumerate,
    Start(String),
    Scan,
    Hold(String),
    Failed(ScanError),
}

enum ScanStep {
    Decoded(Option<String>),
    Command(Option<ScannerCommand>),
}

pub(super) struct ScannerMachine {
    pub(super) context: TargetContext,
    pub(super) registry: CameraDeviceRegistry,
    pub(super) session: ScanSession,
    pub(super) records: SharedRecords,
    pub(super) success_hold: Duration,
    pub(super) camera_lock: Arc<Mutex<()>>,
    pub(super) status: watch::Sender<ScanStatus>,
    pub(super) devices: watch::Sender<Vec<CameraDevice>>,
    pub(super) events: mpsc::Sender<ScannerEvent>,
}

impl ScannerMachine {
    pub(super) async fn run(mut self, mut commands: mpsc::Receiver<ScannerCommand>) {
        info!(context = %self.context, "Scanner opened");

        // Scanners sharing a decoder take turns on the camera
        let lock = self.camera_lock.clone();
        let Some(_camera) = until_closed(&mut commands, lock.lock_owned(), "waiting").await else {
            self.finish(None).await;
            return;
        };

        let decoded = self.drive(&mut commands).await;

        self.session.stop().await;
        self.finish(decoded).await;
    }

    async fn drive(&mut self, commands: &mut mpsc::Receiver<ScannerCommand>) -> Option<String> {
        let mut phase = Phase::Enumerate;
        let mut selected: Option<String> = None;

        loop {
            phase = match phase {
                Phase::Enumerate => {
                    match until_closed(commands, self.registry.list_devices(), "enumerating").await? {
                        Ok(devices) => {
                            let default = self
                                .registry
                                .select_default(&devices)
                                .map(|device| device.id.clone());
                            self.devices.send_replace(devices);
                            match default {
                                Some(id) => Phase::Start(id),
                                None => Phase::Failed(ScanError::NoCameraFound),
                            }
                        }
                        Err(e) => Phase::Failed(e),
                    }
                }

                Phase::Start(device_id) => {
                    selected = Some(device_id.clone());
                    self.set_status(ScanStatus::Starting {
                        device_id: device_id.clone(),
                    });

                    // Dropping the start future on close leaves the session in
                    // `Starting`; the stop in `run` releases it
                    match until_closed(commands, self.session.start(&device_id), "starting").await? {
                        Ok(()) => {
                            self.set_status(ScanStatus::Scanning { device_id });
                            Phase::Scan
                        }
                        Err(e) => Phase::Failed(e),
                    }
                }

                Phase::Scan => {
                    // Only cancel-safe receives race here; a decode that is
                    // ready wins over a command that arrived alongside it
                    let step = tokio::select! {
                        biased;
                        text = self.session.recv_decoded() => ScanStep::Decoded(text),
                        cmd = commands.recv() => ScanStep::Command(cmd),
                    };

                    match step {
                        ScanStep::Decoded(text) => {
                            // Commands sent during the stop stay queued for the hold
                            self.session.stop().await;
                            match text {
                                Some(text) => Phase::Hold(text),
                                None => Phase::Failed(ScanError::StartFailure(
                                    "Camera stream ended".into(),
                                )),
                            }
                        }
                        ScanStep::Command(None | Some(ScannerCommand::Close)) => return None,
                        ScanStep::Command(Some(ScannerCommand::SwitchDevice(id))) => {
                            self.switch_target(&id).unwrap_or(Phase::Scan)
                        }
                        ScanStep::Command(Some(ScannerCommand::Retry)) => {
                            debug!("Retry ignored while scanning");
                            Phase::Scan
                        }
                    }
                }

                Phase::Hold(text) => {
                    self.set_status(ScanStatus::Success);
                    if until_closed(commands, tokio::time::sleep(self.success_hold), "success")
                        .await
                        .is_none()
                    {
                        debug!("Closed during success hold, delivering result now");
                    }
                    return Some(text);
                }

                Phase::Failed(error) => {
                    warn!(error = %error, "Scanner error");
                    self.set_status(ScanStatus::Error {
                        error: error.clone(),
                    });

                    match commands.recv().await {
                        None | Some(ScannerCommand::Close) => return None,
                        Some(ScannerCommand::Retry) => match selected.clone() {
                            Some(id) => {
                                info!(device_id = %id, "Retrying camera");
                                Phase::Start(id)
                            }
                            None => {
                                info!("Retrying camera enumeration");
                                Phase::Enumerate
                            }
                        },
                        Some(ScannerCommand::SwitchDevice(id)) => {
                            self.switch_target(&id).unwrap_or(Phase::Failed(error))
                        }
                    }
                }
            };
        }
    }

    /// Phase for a switch request, or `None` if the device is unknown
    fn switch_target(&self, device_id: &str) -> Option<Phase> {
        let known = self.devices.borrow().iter().any(|d| d.id == device_id);
        if !known {
            warn!(device_id, "Switch to unknown camera ignored");
            return None;
        }

        info!(device_id, "Switching camera");
        self.set_status(ScanStatus::Idle);
        Some(Phase::Start(device_id.to_string()))
    }

    fn set_status(&self, next: ScanStatus) {
        self.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            debug!(from = %current, to = %next, "Scanner status");
            *current = next;
            true
        });
    }

    fn resolve(&self, text: &str) -> ResolutionOutcome {
        let stores = self.records.read().unwrap_or_else(PoisonError::into_inner);
        PayloadRouter::new(&stores).resolve(text, self.context)
    }

    async fn finish(self, decoded: Option<String>) {
        if let Some(text) = decoded {
            let outcome = self.resolve(&text);
            if self.events.send(ScannerEvent::Resolved(outcome)).await.is_err() {
                warn!("Scan result dropped, owner is gone");
            }
        }

        let _ = self.events.send(ScannerEvent::Closed).await;
        info!(context = %self.context, "Scanner closed");
    }
}

/// Drive `fut` to completion unless the owner closes first
///
/// Commands other than close are not meaningful mid-operation and are
/// dropped.
async fn until_closed<F: Future>(
    commands: &mut mpsc::Receiver<ScannerCommand>,
    fut: F,
    phase: &'static str,
) -> Option<F::Output> {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            out = &mut fut => return Some(out),
            cmd = commands.recv() => match cmd {
                None | Some(ScannerCommand::Close) => {
                    debug!(phase, "Close requested");
                    return None;
                }
                Some(other) => warn!(phase, command = ?other, "Command ignored"),
            },
        }
    }
}
