//! Texture snapshot generation
//!
//! [`Rasterizer::rasterize`] turns a surface's exportable content into an
//! RGBA bitmap at the rasterizer's oversampled resolution; [`Rasterizer::rasterize_preview`]
//! draws the guides as well. Both are deterministic for identical content.

mod bitmap;
mod canvas;
mod path;
mod text;

use std::sync::Arc;

use glam::{Affine2, Vec2};
use image::RgbaImage;
use thiserror::Error;
use tracing::trace;

pub use text::FontBook;

use canvas::Canvas;
use path::{Path, PathBuilder, fill_path};

use crate::constants::{GUIDE_DASH, MAX_TEXTURE_SIZE};
use crate::encode::{EncodeError, encode_png};
use crate::object::{DrawingObject, GuideLine, ObjectId, ObjectKind};
use crate::surface::DrawingSurface;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("No font available for family {family:?}")]
    FontUnavailable { family: String },

    #[error("Text shaping failed: {0}")]
    Shaping(String),

    #[error("Image object {0} has an empty bitmap")]
    EmptyBitmap(ObjectId),

    #[error("Texture size {width}x{height} is empty or exceeds the maximum texture size")]
    CanvasTooLarge { width: u32, height: u32 },
}

/// Rasterized snapshot of a surface, ready to use as a material map
#[derive(Debug, Clone)]
pub struct Texture {
    pixels: Arc<RgbaImage>,
    revision: u64,
}

impl Texture {
    pub fn new(pixels: RgbaImage, revision: u64) -> Self {
        Self {
            pixels: Arc::new(pixels),
            revision,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Monotonic counter distinguishing successive textures
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Lossless PNG encoding of the texture
    pub fn to_png(&self) -> Result<Vec<u8>, EncodeError> {
        encode_png(&self.pixels)
    }
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.revision == other.revision && self.pixels == other.pixels
    }
}

/// CPU rasterizer for drawing surfaces
#[derive(Debug)]
pub struct Rasterizer {
    fonts: FontBook,
    background: [f32; 4],
    oversample: u32,
}

impl Rasterizer {
    /// `oversample` device pixels are rendered per surface pixel on each axis
    pub fn new(fonts: FontBook, oversample: u32) -> Self {
        Self {
            fonts,
            background: [1.0, 1.0, 1.0, 1.0],
            oversample: oversample.max(1),
        }
    }

    pub fn with_background(mut self, background: [f32; 4]) -> Self {
        self.background = background;
        self
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn oversample(&self) -> u32 {
        self.oversample
    }

    /// Render exportable objects only
    pub fn rasterize(&self, surface: &DrawingSurface) -> Result<RgbaImage, RasterError> {
        self.render(surface, false)
    }

    /// Render everything, guides included, for on-screen editing
    pub fn rasterize_preview(&self, surface: &DrawingSurface) -> Result<RgbaImage, RasterError> {
        self.render(surface, true)
    }

    fn render(&self, surface: &DrawingSurface, preview: bool) -> Result<RgbaImage, RasterError> {
        let width = surface.width() * self.oversample;
        let height = surface.height() * self.oversample;
        if width == 0 || height == 0 || width > MAX_TEXTURE_SIZE || height > MAX_TEXTURE_SIZE {
            return Err(RasterError::CanvasTooLarge { width, height });
        }

        let mut canvas = Canvas::new(width, height);
        canvas.fill(self.background);

        let device = Affine2::from_scale(Vec2::splat(self.oversample as f32));
        for object in surface.objects() {
            if object.base.export_excluded && !preview {
                continue;
            }
            self.draw_object(&mut canvas, object, device)?;
        }
        trace!("Rasterized {}x{} texture", width, height);
        Ok(canvas.to_rgba8())
    }

    fn draw_object(
        &self,
        canvas: &mut Canvas,
        object: &DrawingObject,
        device: Affine2,
    ) -> Result<(), RasterError> {
        let transform = device * object.base.transform();
        let opacity = object.base.opacity;
        match &object.kind {
            ObjectKind::Text(text) => {
                let path = self.fonts.outline_text(text, transform)?;
                fill_path(canvas, &path, text.fill, opacity);
            }
            ObjectKind::Image(image) => {
                let pixels = image.source.pixels();
                if pixels.width() == 0 || pixels.height() == 0 {
                    return Err(RasterError::EmptyBitmap(object.id));
                }
                bitmap::draw_image(canvas, pixels, transform, opacity);
            }
            ObjectKind::Guide(guide) => {
                let path = stroke_guide(guide, transform);
                fill_path(canvas, &path, guide.color, opacity);
            }
        }
        Ok(())
    }
}

/// Outline a guide line as a set of quads, one per dash
fn stroke_guide(guide: &GuideLine, transform: Affine2) -> Path {
    let from = Vec2::from(guide.from);
    let to = Vec2::from(guide.to);
    let length = from.distance(to);
    let mut builder = PathBuilder::new(transform);
    if length <= f32::EPSILON {
        return builder.finish();
    }

    let dir = (to - from) / length;
    let normal = dir.perp() * (guide.width / 2.0);
    let (dash, step) = if guide.dashed {
        (GUIDE_DASH, GUIDE_DASH * 2.0)
    } else {
        (length, length)
    };

    let mut start = 0.0;
    while start < length {
        let end = (start + dash).min(length);
        let a = from + dir * start;
        let b = from + dir * end;
        builder.polygon(&[a - normal, b - normal, b + normal, a + normal]);
        start += step;
    }
    builder.finish()
}
