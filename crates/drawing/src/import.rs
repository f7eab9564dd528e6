//! Image import: validation, decoding and placement
//!
//! Validation runs on the declared type and size alone, so oversized or
//! non-image files are rejected before any bytes are decoded.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::object::{ImageObject, ImageSource, ObjectBase, ObjectKind};

/// MIME prefix accepted for imports
pub const IMAGE_MIME_PREFIX: &str = "image/";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unsupported file type {mime:?}, expected an image")]
    UnsupportedType { mime: String },

    #[error("File is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: u64, max: u64 },

    #[error("Failed to read image file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image import task failed: {0}")]
    Runtime(String),
}

/// Check declared type and size
pub fn validate(mime: &str, size: u64, max_bytes: u64) -> Result<(), ImportError> {
    if !mime.to_ascii_lowercase().starts_with(IMAGE_MIME_PREFIX) {
        return Err(ImportError::UnsupportedType {
            mime: mime.to_string(),
        });
    }
    if size > max_bytes {
        return Err(ImportError::TooLarge {
            size,
            max: max_bytes,
        });
    }
    Ok(())
}

/// Guess a MIME type from a file extension
pub fn mime_for_path(path: &Path) -> String {
    if let Ok(format) = image::ImageFormat::from_path(path) {
        return format.to_mime_type().to_string();
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("txt" | "md" | "csv") => "text/plain".to_string(),
        Some("json") => "application/json".to_string(),
        _ => "application/octet-stream".to_string(),
    }
}

/// Decode already validated bytes
pub fn decode(bytes: Vec<u8>) -> Result<ImageSource, ImportError> {
    let source = ImageSource::from_encoded(bytes)?;
    debug!("Decoded {}x{} image", source.width(), source.height());
    Ok(source)
}

/// Validate, read and decode an image file
///
/// Blocking; the size check uses file metadata so large files are never read.
pub fn read_image_file(path: &Path, max_bytes: u64) -> Result<ImageSource, ImportError> {
    let size = std::fs::metadata(path)?.len();
    validate(&mime_for_path(path), size, max_bytes)?;
    decode(std::fs::read(path)?)
}

/// Centre position and uniform scale of an imported image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Placement {
    pub fn base(&self) -> ObjectBase {
        ObjectBase::at(self.x, self.y).with_scale(self.scale)
    }
}

/// Fit an image into `ratio` of the surface on both axes, centred
///
/// Aspect ratio is preserved and images are never scaled up.
pub fn fit_within(
    image_width: u32,
    image_height: u32,
    surface_width: u32,
    surface_height: u32,
    ratio: f32,
) -> Placement {
    let (sw, sh) = (surface_width as f32, surface_height as f32);
    let scale = if image_width == 0 || image_height == 0 {
        1.0
    } else {
        (sw * ratio / image_width as f32)
            .min(sh * ratio / image_height as f32)
            .min(1.0)
    };
    Placement {
        x: sw / 2.0,
        y: sh / 2.0,
        scale,
    }
}

/// Build a centred, fitted image object for a surface
pub fn placed_image(
    source: ImageSource,
    surface_width: u32,
    surface_height: u32,
    ratio: f32,
) -> (ObjectBase, ObjectKind) {
    let placement = fit_within(
        source.width(),
        source.height(),
        surface_width,
        surface_height,
        ratio,
    );
    (placement.base(), ObjectKind::Image(ImageObject { source }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    const MAX: u64 = 10 * 1024 * 1024;

    #[test]
    fn test_validate_type() {
        assert!(validate("image/png", 100, MAX).is_ok());
        assert!(validate("IMAGE/JPEG", 100, MAX).is_ok());
        assert!(matches!(
            validate("text/plain", 100, MAX),
            Err(ImportError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_validate_size() {
        assert!(validate("image/png", MAX, MAX).is_ok());
        assert!(matches!(
            validate("image/png", 11 * 1024 * 1024, MAX),
            Err(ImportError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("photo.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("scan.bmp")), "image/bmp");
        assert_eq!(mime_for_path(Path::new("notes.txt")), "text/plain");
        assert_eq!(
            mime_for_path(Path::new("blob")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_fit_large_image() {
        let placement = fit_within(1500, 1500, 375, 525, 0.6);
        assert!((placement.scale - 0.15).abs() < 1e-6);
        assert_eq!((placement.x, placement.y), (187.5, 262.5));
        // 225x225 on screen, within 60% of both axes
        assert!(1500.0 * placement.scale <= 375.0 * 0.6 + 1e-3);
    }

    #[test]
    fn test_fit_never_upscales() {
        let placement = fit_within(100, 50, 375, 525, 0.6);
        assert_eq!(placement.scale, 1.0);
    }

    #[test]
    fn test_fit_tall_image() {
        let placement = fit_within(100, 1000, 375, 525, 0.6);
        assert!((placement.scale - 0.315).abs() < 1e-6);
    }

    #[test]
    fn test_text_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not an image").unwrap();

        assert!(matches!(
            read_image_file(&path, MAX),
            Err(ImportError::UnsupportedType { mime }) if mime == "text/plain"
        ));
    }

    #[test]
    fn test_oversized_file_rejected_before_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.png");
        // Not a valid PNG; a decode attempt would report Decode instead
        std::fs::write(&path, vec![0u8; 11 * 1024 * 1024]).unwrap();

        assert!(matches!(
            read_image_file(&path, MAX),
            Err(ImportError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_nine_megabyte_bitmap_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large.bmp");
        let pixels = RgbaImage::from_fn(1500, 1500, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        pixels.save(&path).unwrap();
        let size = std::fs::metadata(&path).unwrap().len();
        assert!(size > 8 * 1024 * 1024 && size < MAX);

        let source = read_image_file(&path, MAX).unwrap();
        assert_eq!((source.width(), source.height()), (1500, 1500));

        let (base, kind) = placed_image(source, 375, 525, 0.6);
        assert!(matches!(kind, ObjectKind::Image(_)));
        assert_eq!((base.x, base.y), (187.5, 262.5));
        assert!((base.scale_x - 0.15).abs() < 1e-6);
        assert_eq!(base.scale_x, base.scale_y);
    }

    #[test]
    fn test_corrupt_image_fails_decode() {
        assert!(matches!(
            decode(b"\x89PNG\r\n\x1a\nbroken".to_vec()),
            Err(ImportError::Decode(_))
        ));
    }
}
