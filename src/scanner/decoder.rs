// SPDX-License-Identifier: GPL-3.0-only

//! Decoder contract
//!
//! The decoder is the capability that turns a live camera into decoded
//! text. The scanner only relies on this start/stop/callback contract; the
//! bundled implementation lives in [`crate::frame_processor`].

use crate::backends::camera::BackendResult;
use futures::future::BoxFuture;
use tokio::sync::mpsc;

/// Channel on which a running decoder reports decoded text
pub type DecodeSender = mpsc::UnboundedSender<String>;

/// Receiving end of [`DecodeSender`]
pub type DecodeReceiver = mpsc::UnboundedReceiver<String>;

/// A QR decoder bound to at most one camera at a time
///
/// Contract:
/// * `start` resolves once the camera stream is attached, or fails without
///   keeping the camera. If the future is dropped before it resolves, a
///   later `stop` must still release whatever was acquired.
/// * While running, every successful frame decode is sent on `decoded`.
/// * `stop` halts decoding and releases the camera. It is idempotent and
///   safe to call when nothing was started.
pub trait Decoder: Send + Sync {
    fn start<'a>(
        &'a self,
        device_id: &'a str,
        decoded: DecodeSender,
    ) -> BoxFuture<'a, BackendResult<()>>;

    fn stop(&self) -> BoxFuture<'_, BackendResult<()>>;
}
