// SPDX-License-Identifier: GPL-3.0-only

//! Image file sources for virtual cameras
//!
//! A virtual camera replays still images as if they were live frames. Each
//! file becomes one RGBA [`CameraFrame`].

use crate::backends::camera::types::{BackendError, BackendResult, CameraFrame, PixelFormat};
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load an image file as an RGBA camera frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    debug!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::Other(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();

    debug!(width, height, "Image loaded successfully");

    Ok(CameraFrame::packed(
        width,
        height,
        PixelFormat::RGBA,
        rgba.into_raw(),
    ))
}

/// Supported image files directly inside `dir`, sorted by file name
pub fn list_image_files(dir: &Path) -> BackendResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_file(path))
        .collect();
    files.sort();

    info!(dir = %dir.display(), count = files.len(), "Found image files");
    Ok(files)
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(file_formats::is_image_extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_image_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "c.mp4"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let files = list_image_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png"]);
    }

    #[test]
    fn test_load_image_as_frame_round_trips_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();

        let frame = load_image_as_frame(&path).unwrap();
        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(frame.format, PixelFormat::RGBA);
        assert_eq!(&frame.data[0..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_load_missing_image_is_error() {
        let err = load_image_as_frame(Path::new("/nonexistent/frame.png")).unwrap_err();
        assert!(matches!(err, BackendError::Other(_)));
    }
}
