// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing for the scanner
//!
//! [`QrFrameDecoder`] samples camera frames at a fixed rate and runs
//! [`QrDetector`] on each one, reporting decoded text to the scan session.

pub mod decoder;
pub mod qr_detector;

pub use decoder::QrFrameDecoder;
pub use qr_detector::QrDetector;
