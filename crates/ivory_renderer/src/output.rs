//! Image sinks.
//!
//! OpenEXR paths receive the linear floating-point frame untouched. Every
//! other extension receives gamma-encoded 8-bit RGBA.

use std::path::Path;

use image::{ImageBuffer, Rgb, Rgba};
use thiserror::Error;

use crate::FrameBuffer;

/// Errors that can occur while writing a frame.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Frame buffer does not match its {width}x{height} dimensions")]
    BufferSize { width: u32, height: u32 },
}

/// Destination for finished frames.
pub trait ImageSink: Send + Sync {
    /// Persist `frame` at `path`.
    fn write(&self, frame: &FrameBuffer, path: &Path) -> Result<(), OutputError>;
}

/// Writes frames to disk with the `image` crate, picking the encoder from
/// the file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSink;

impl FileSink {
    fn is_hdr(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("exr"))
            .unwrap_or(false)
    }
}

impl ImageSink for FileSink {
    fn write(&self, frame: &FrameBuffer, path: &Path) -> Result<(), OutputError> {
        let (width, height) = (frame.width(), frame.height());
        let size_error = || OutputError::BufferSize { width, height };

        if Self::is_hdr(path) {
            let image: ImageBuffer<Rgb<f32>, Vec<f32>> =
                ImageBuffer::from_raw(width, height, frame.to_rgb_f32()).ok_or_else(size_error)?;
            image.save(path)?;
        } else {
            let image: ImageBuffer<Rgba<u8>, Vec<u8>> =
                ImageBuffer::from_raw(width, height, frame.to_rgba8()).ok_or_else(size_error)?;
            image.save(path)?;
        }

        log::info!("Saved {}x{} image to {}", width, height, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ivory_output_{}_{}", std::process::id(), name))
    }

    fn gradient_frame() -> FrameBuffer {
        let mut frame = FrameBuffer::new(4, 2);
        for y in 0..2 {
            for x in 0..4 {
                frame.set(x, y, Color::new(x as f32 * 0.25, y as f32 * 2.0, 0.5));
            }
        }
        frame
    }

    #[test]
    fn test_hdr_detection() {
        assert!(FileSink::is_hdr(Path::new("output.exr")));
        assert!(FileSink::is_hdr(Path::new("OUT.EXR")));
        assert!(!FileSink::is_hdr(Path::new("preview.png")));
        assert!(!FileSink::is_hdr(Path::new("noext")));
    }

    #[test]
    fn test_write_exr_roundtrip_values() {
        let path = temp_path("frame.exr");
        let frame = gradient_frame();
        FileSink.write(&frame, &path).unwrap();

        let loaded = image::open(&path).unwrap().into_rgb32f();
        assert_eq!(loaded.dimensions(), (4, 2));
        let px = loaded.get_pixel(3, 1);
        // Values above 1.0 survive in the float format
        assert!((px[0] - 0.75).abs() < 1e-3);
        assert!((px[1] - 2.0).abs() < 1e-3);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_write_png() {
        let path = temp_path("frame.png");
        FileSink.write(&gradient_frame(), &path).unwrap();
        let loaded = image::open(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (4, 2));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let path = temp_path("missing_dir").join("frame.exr");
        let err = FileSink.write(&gradient_frame(), &path).unwrap_err();
        assert!(matches!(err, OutputError::Image(_)));
    }
}
