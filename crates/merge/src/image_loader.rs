//! Raster loading for injected images
//!
//! Decoding, rotation and re-encoding are delegated to the `image`
//! crate. Unrotated images keep their original bytes so the package
//! stores exactly what was on disk.

use crate::{MergeError, MergeResult};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Clockwise rotation applied before the image is embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

/// Decoded image ready to be registered as a package part.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub width_px: u32,
    pub height_px: u32,
}

/// Read and decode an image file. An unreadable path is a
/// `MissingImage` error; undecodable bytes are an `Image` error.
pub fn load(path: &Path, rotation: Rotation) -> MergeResult<LoadedImage> {
    let bytes = std::fs::read(path).map_err(|source| MergeError::MissingImage {
        path: path.to_path_buf(),
        source,
    })?;
    let format = image::guess_format(&bytes)?;
    let content_type = format.to_mime_type();
    let decoded = image::load_from_memory_with_format(&bytes, format)?;

    let rotated = match rotation {
        Rotation::None => {
            debug!(path = %path.display(), content_type, "loaded image");
            return Ok(LoadedImage {
                bytes,
                content_type,
                width_px: decoded.width(),
                height_px: decoded.height(),
            });
        }
        Rotation::Cw90 => decoded.rotate90(),
        Rotation::Cw180 => decoded.rotate180(),
        Rotation::Cw270 => decoded.rotate270(),
    };

    let mut out = Cursor::new(Vec::new());
    rotated.write_to(&mut out, format)?;
    debug!(path = %path.display(), content_type, ?rotation, "loaded and rotated image");
    Ok(LoadedImage {
        bytes: out.into_inner(),
        content_type,
        width_px: rotated.width(),
        height_px: rotated.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let mut img = RgbaImage::new(width, height);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_load_keeps_original_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "logo.png", 4, 2);
        let on_disk = std::fs::read(&path).unwrap();
        let loaded = load(&path, Rotation::None).unwrap();
        assert_eq!(loaded.bytes, on_disk);
        assert_eq!(loaded.content_type, "image/png");
        assert_eq!((loaded.width_px, loaded.height_px), (4, 2));
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "logo.png", 4, 2);
        let loaded = load(&path, Rotation::Cw90).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (2, 4));
        // Re-encoded bytes still decode to the same format.
        assert_eq!(image::guess_format(&loaded.bytes).unwrap(), image::ImageFormat::Png);
    }

    #[test]
    fn test_missing_path() {
        let err = load(Path::new("/nonexistent/logo.png"), Rotation::None).unwrap_err();
        match err {
            MergeError::MissingImage { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/logo.png"));
            }
            other => panic!("expected MissingImage, got {:?}", other),
        }
    }

    #[test]
    fn test_undecodable_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-an-image.png");
        std::fs::write(&path, b"plainly not a raster").unwrap();
        assert!(matches!(
            load(&path, Rotation::None),
            Err(MergeError::Image(_))
        ));
    }
}
