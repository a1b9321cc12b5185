// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing virtual cameras
//! - Running a scan end to end against a virtual camera
//! - Resolving decoded text and printing payloads without a camera

use medicard_scanner::backends::virtual_camera::VirtualCameraBackend;
use medicard_scanner::{
    CameraDeviceRegistry, DecodedPayload, PayloadRouter, QrFrameDecoder, RecordStores,
    ResolutionOutcome, ScanRequest, ScanStatus, Scanner, ScannerConfig, ScannerEvent,
    TargetContext,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

type CliResult = Result<(), Box<dyn std::error::Error>>;

pub struct ScanArgs {
    pub source: PathBuf,
    pub context: TargetContext,
    pub camera: Option<String>,
    pub records: Option<PathBuf>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub timeout: u64,
}

/// List the cameras a source directory provides
pub async fn list_cameras(config: Option<&Path>, source: &Path) -> CliResult {
    let config = ScannerConfig::load(config)?;
    let backend = Arc::new(VirtualCameraBackend::from_directory(source)?);
    let registry = CameraDeviceRegistry::new(backend, config.preferred_labels.clone());

    let devices = match registry.list_devices().await {
        Ok(devices) => devices,
        Err(e) => {
            println!("{}", e.user_message());
            return Ok(());
        }
    };
    let default_id = registry.select_default(&devices).map(|d| d.id.clone());

    println!("Available cameras:");
    println!();
    for device in &devices {
        let marker = if Some(&device.id) == default_id.as_ref() {
            " (default)"
        } else {
            ""
        };
        println!(
            "  [{}] {}{}",
            device.id,
            device.display_label(config.label_max_chars),
            marker
        );
    }

    Ok(())
}

/// Run one scanner modal to completion
pub async fn scan(config: Option<&Path>, args: ScanArgs) -> CliResult {
    let config = ScannerConfig::load(config)?;
    let records = load_records(args.records.as_deref())?.into_shared();
    let backend = Arc::new(VirtualCameraBackend::from_directory(&args.source)?);
    let decoder = Arc::new(QrFrameDecoder::new(backend.clone(), &config));
    let scanner = Scanner::new(backend, decoder, records, config);

    let mut request = ScanRequest::new(args.context);
    request.title = args.title;
    request.subtitle = args.subtitle;

    let mut handle = scanner.open(request);
    let mut status = handle.subscribe();
    println!("{}", handle.title());
    println!("{}", handle.subtitle());
    println!();

    let deadline = tokio::time::sleep(Duration::from_secs(args.timeout));
    tokio::pin!(deadline);
    let mut timed_out = false;
    let mut watching = true;
    let mut pending_switch = args.camera;
    let mut outcome: Option<ResolutionOutcome> = None;

    enum Step {
        Status(bool),
        Event(Option<ScannerEvent>),
        Timeout,
    }

    loop {
        let step = tokio::select! {
            changed = status.changed(), if watching => Step::Status(changed.is_ok()),
            event = handle.next_event() => Step::Event(event),
            _ = &mut deadline, if !timed_out => Step::Timeout,
        };

        match step {
            Step::Status(true) => {
                let current = status.borrow_and_update().clone();
                if let Some(hint) = current.hint() {
                    println!("[{}] {}", current, hint);
                }
                match current {
                    ScanStatus::Scanning { device_id } => {
                        if let Some(target) = pending_switch.take() {
                            if target != device_id {
                                handle.switch_device(target).await;
                            }
                        }
                    }
                    ScanStatus::Error { .. } => handle.close().await,
                    _ => {}
                }
            }
            Step::Status(false) => watching = false,
            Step::Event(Some(ScannerEvent::Resolved(resolved))) => outcome = Some(resolved),
            Step::Event(Some(ScannerEvent::Closed) | None) => break,
            Step::Timeout => {
                timed_out = true;
                println!("No QR code detected within {}s", args.timeout);
                handle.close().await;
            }
        }
    }

    if let Some(outcome) = outcome {
        print_outcome(&outcome)?;
    }
    Ok(())
}

/// Resolve decoded text against the record tables
pub fn resolve(context: TargetContext, records: Option<&Path>, text: &str) -> CliResult {
    let stores = load_records(records)?;
    let outcome = PayloadRouter::new(&stores).resolve(text, context);
    print_outcome(&outcome)
}

/// Print the wire text for a patient or prescription QR code
pub fn payload(patient: Option<String>, name: Option<String>, rx: Option<String>) -> CliResult {
    let payload = match (patient, rx) {
        (Some(id), None) => DecodedPayload::patient(id, name),
        (None, Some(id)) => DecodedPayload::prescription(id),
        _ => return Err("specify exactly one of --patient or --rx".into()),
    };
    println!("{}", payload.to_wire());
    Ok(())
}

fn load_records(path: Option<&Path>) -> Result<RecordStores, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => RecordStores::load(path)?,
        None => RecordStores::demo()?,
    })
}

fn print_outcome(outcome: &ResolutionOutcome) -> CliResult {
    println!("{}: {}", outcome.kind(), outcome.message());
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}
