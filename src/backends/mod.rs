// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! The scanner never touches a device directly. It goes through the
//! [`camera::CameraBackend`] trait, which any platform can implement:
//!
//! - [`camera`]: backend trait, device registry and shared frame types
//! - [`virtual_camera`]: image-backed cameras for demos and tests

pub mod camera;
pub mod virtual_camera;
