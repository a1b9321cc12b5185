// SPDX-License-Identifier: GPL-3.0-only

//! MediCard scanner - QR acquisition and resolution for the MediCard dashboards
//!
//! A scan goes camera → decoder → payload router → record:
//!
//! - [`backends`]: Camera enumeration and streams (virtual image-backed cameras included)
//! - [`scanner`]: The scanner modal state machine and its single camera session
//! - [`frame_processor`]: The bundled QR decoder over camera frames
//! - [`payload`]: Payload parsing and resolution against the record tables
//! - [`records`]: Patient and prescription tables
//! - [`config`]: Scanner configuration
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> medicard_scanner::AppResult<()> {
//! use medicard_scanner::backends::virtual_camera::VirtualCameraBackend;
//! use medicard_scanner::{QrFrameDecoder, RecordStores, ScanRequest, Scanner, ScannerConfig, TargetContext};
//! use std::sync::Arc;
//!
//! let config = ScannerConfig::default();
//! let backend = Arc::new(VirtualCameraBackend::from_directory("codes".as_ref())?);
//! let decoder = Arc::new(QrFrameDecoder::new(backend.clone(), &config));
//! let scanner = Scanner::new(backend, decoder, RecordStores::demo()?.into_shared(), config);
//!
//! let handle = scanner.open(ScanRequest::new(TargetContext::Dispense));
//! if let Some(outcome) = handle.finished().await {
//!     println!("{}", outcome.message());
//! }
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frame_processor;
pub mod payload;
pub mod records;
pub mod scanner;

pub use backends::camera::{CameraBackend, CameraDevice, CameraDeviceRegistry};
pub use config::ScannerConfig;
pub use errors::{AppError, AppResult, ScanError};
pub use frame_processor::QrFrameDecoder;
pub use payload::{
    DecodedPayload, PayloadRouter, PayloadTag, ResolutionOutcome, ResolvedRecord, TargetContext,
    parse_payload,
};
pub use records::{RecordStores, SharedRecords};
pub use scanner::{
    Decoder, ScanRequest, ScanSession, ScanStatus, Scanner, ScannerEvent, ScannerHandle,
};
