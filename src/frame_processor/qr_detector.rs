// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection on camera frames
//!
//! Frames are reduced to luma, downscaled so the longest side fits
//! `max_dimension`, then handed to rqrr for grid detection and decoding.

use crate::backends::camera::{CameraFrame, PixelFormat};
use image::GrayImage;
use image::imageops::{self, FilterType};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Decodes QR codes out of camera frames
#[derive(Debug, Clone, Copy)]
pub struct QrDetector {
    max_dimension: u32,
}

impl QrDetector {
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    /// Decode every QR code in the frame
    ///
    /// CPU heavy, so it runs on the blocking pool.
    pub async fn detect(&self, frame: Arc<CameraFrame>) -> Vec<String> {
        let max_dimension = self.max_dimension;
        tokio::task::spawn_blocking(move || detect_sync(&frame, max_dimension))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "QR detection task panicked");
                Vec::new()
            })
    }
}

/// Synchronous detection (runs in a blocking task)
pub fn detect_sync(frame: &CameraFrame, max_dimension: u32) -> Vec<String> {
    let start = std::time::Instant::now();

    let Some(luma) = luma_from_frame(frame) else {
        warn!(
            width = frame.width,
            height = frame.height,
            stride = frame.stride,
            len = frame.data.len(),
            "Frame buffer too small for its dimensions"
        );
        return Vec::new();
    };
    let luma = downscale(luma, max_dimension);

    let (width, height) = luma.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        width as usize,
        height as usize,
        |x, y| luma.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    trace!(
        width,
        height,
        grids = grids.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "QR grid detection complete"
    );

    let mut decoded = Vec::with_capacity(grids.len());
    for grid in grids {
        match grid.decode() {
            Ok((_, content)) => {
                debug!(len = content.len(), "Decoded QR code");
                decoded.push(content);
            }
            Err(e) => debug!(error = ?e, "Failed to decode QR grid"),
        }
    }
    decoded
}

/// Copy the frame into a tightly packed luma image
///
/// RGBA is converted with BT.601 weights. Returns `None` if the buffer is
/// shorter than `stride * height` requires.
fn luma_from_frame(frame: &CameraFrame) -> Option<GrayImage> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;
    let bpp = frame.format.bytes_per_pixel();

    if width == 0 || height == 0 || stride < width * bpp {
        return None;
    }
    let needed = stride * (height - 1) + width * bpp;
    if frame.data.len() < needed {
        return None;
    }

    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        let row = &frame.data[y * stride..y * stride + width * bpp];
        match frame.format {
            PixelFormat::Gray => out.extend_from_slice(row),
            PixelFormat::RGBA => out.extend(row.chunks_exact(4).map(|px| {
                let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
                ((299 * r + 587 * g + 114 * b) / 1000) as u8
            })),
        }
    }

    GrayImage::from_raw(frame.width, frame.height, out)
}

fn downscale(image: GrayImage, max_dimension: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width <= max_dimension && height <= max_dimension {
        return image;
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).max(1);
    let new_height = ((height as f32 / scale) as u32).max(1);
    trace!(width, height, new_width, new_height, "Downscaling frame");
    imageops::resize(&image, new_width, new_height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba_frame(width: u32, height: u32, stride: u32, fill: [u8; 4]) -> CameraFrame {
        let mut data = vec![0u8; (stride * height) as usize];
        for y in 0..height as usize {
            for x in 0..width as usize {
                let at = y * stride as usize + x * 4;
                data[at..at + 4].copy_from_slice(&fill);
            }
        }
        CameraFrame {
            width,
            height,
            data: Arc::from(data),
            format: PixelFormat::RGBA,
            stride,
            captured_at: std::time::Instant::now(),
        }
    }

    #[test]
    fn test_luma_skips_stride_padding() {
        let frame = rgba_frame(3, 2, 16, [255, 255, 255, 255]);
        let luma = luma_from_frame(&frame).unwrap();
        assert_eq!(luma.dimensions(), (3, 2));
        assert!(luma.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_luma_rejects_short_buffer() {
        let frame = CameraFrame::packed(4, 4, PixelFormat::Gray, vec![0; 10]);
        assert!(luma_from_frame(&frame).is_none());
        assert!(detect_sync(&frame, 640).is_empty());
    }

    #[test]
    fn test_downscale_fits_longest_side() {
        let image = GrayImage::new(1280, 720);
        let scaled = downscale(image, 640);
        assert_eq!(scaled.dimensions(), (640, 360));

        let small = downscale(GrayImage::new(320, 200), 640);
        assert_eq!(small.dimensions(), (320, 200));
    }

    #[tokio::test]
    async fn test_blank_frame_has_no_codes() {
        let frame = Arc::new(CameraFrame::packed(
            64,
            64,
            PixelFormat::Gray,
            vec![255; 64 * 64],
        ));
        assert!(QrDetector::new(640).detect(frame).await.is_empty());
    }
}
