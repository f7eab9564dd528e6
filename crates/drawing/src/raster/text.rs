//! Font lookup and text outlining
//!
//! Text is shaped one line at a time with rustybuzz and the glyph outlines
//! are fed straight into a [`PathBuilder`], so the filler sees device-space
//! contours.

use std::fmt;
use std::path::Path as FsPath;

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use glam::{Affine2, Vec2};
use rustybuzz::ttf_parser;
use tracing::debug;

use super::RasterError;
use super::path::{Path, PathBuilder};
use crate::constants::LINE_HEIGHT;
use crate::object::{FontWeight, TextObject};

/// Set of fonts available to the rasterizer
#[derive(Default)]
pub struct FontBook {
    db: Database,
}

impl fmt::Debug for FontBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontBook").field("faces", &self.db.len()).finish()
    }
}

impl FontBook {
    /// A book with no fonts; every text object fails to render
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the fonts installed on this machine
    pub fn system() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        debug!("Loaded {} system font faces", db.len());
        Self { db }
    }

    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.db.load_font_data(data);
    }

    /// Load every font in a directory. Missing directories are skipped.
    pub fn load_fonts_dir(&mut self, dir: impl AsRef<FsPath>) {
        let before = self.db.len();
        self.db.load_fonts_dir(dir.as_ref());
        debug!(
            "Loaded {} font faces from {}",
            self.db.len() - before,
            dir.as_ref().display()
        );
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.len() == 0
    }

    /// Find a face for a family name or generic family
    ///
    /// Falls back to any loaded face when the family is not installed.
    fn resolve(&self, family: &str, weight: FontWeight) -> Option<fontdb::ID> {
        let generic = family.to_ascii_lowercase();
        let families = [match generic.as_str() {
            "sans-serif" | "sans" => Family::SansSerif,
            "serif" => Family::Serif,
            "monospace" => Family::Monospace,
            "cursive" => Family::Cursive,
            "fantasy" => Family::Fantasy,
            _ => Family::Name(family),
        }];
        let query = Query {
            families: &families,
            weight: Weight(weight.value()),
            stretch: Stretch::Normal,
            style: Style::Normal,
        };

        self.db.query(&query).or_else(|| {
            let fallback = self.db.faces().next().map(|face| face.id);
            if fallback.is_some() {
                debug!("Font family {family:?} not found, using fallback face");
            }
            fallback
        })
    }

    /// Outline a text object into device-space contours
    ///
    /// Lines are centred horizontally and the block is centred vertically on
    /// the object origin.
    pub fn outline_text(&self, text: &TextObject, transform: Affine2) -> Result<Path, RasterError> {
        let unavailable = || RasterError::FontUnavailable {
            family: text.font_family.clone(),
        };
        let id = self.resolve(&text.font_family, text.font_weight).ok_or_else(unavailable)?;

        self.db
            .with_face_data(id, |data, index| {
                let face = rustybuzz::Face::from_slice(data, index).ok_or_else(|| {
                    RasterError::Shaping(format!("cannot parse face for {:?}", text.font_family))
                })?;
                outline_lines(&face, text, transform)
            })
            .ok_or_else(unavailable)?
    }
}

fn outline_lines(
    face: &rustybuzz::Face<'_>,
    text: &TextObject,
    transform: Affine2,
) -> Result<Path, RasterError> {
    let ttf: &ttf_parser::Face<'_> = face;
    let units_per_em = f32::from(ttf.units_per_em());
    let scale = text.font_size / units_per_em;
    let ascender = f32::from(ttf.ascender()) * scale;

    let lines: Vec<&str> = text.text.split('\n').collect();
    let line_height = text.font_size * LINE_HEIGHT;
    let top = -(lines.len() as f32 * line_height) / 2.0;

    let mut builder = PathBuilder::new(transform);
    for (row, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(line);
        buffer.guess_segment_properties();
        let glyphs = rustybuzz::shape(face, &[], buffer);

        let advance: i32 = glyphs.glyph_positions().iter().map(|p| p.x_advance).sum();
        let baseline = top + row as f32 * line_height + ascender;
        let mut pen_x = -(advance as f32 * scale) / 2.0;

        for (info, pos) in glyphs.glyph_infos().iter().zip(glyphs.glyph_positions()) {
            let glyph = u16::try_from(info.glyph_id)
                .map(ttf_parser::GlyphId)
                .map_err(|_| RasterError::Shaping(format!("glyph id {} out of range", info.glyph_id)))?;
            let mut sink = GlyphSink {
                builder: &mut builder,
                origin: Vec2::new(
                    pen_x + pos.x_offset as f32 * scale,
                    baseline - pos.y_offset as f32 * scale,
                ),
                scale,
            };
            // Glyphs without outlines (spaces) yield None
            ttf.outline_glyph(glyph, &mut sink);
            pen_x += pos.x_advance as f32 * scale;
        }
    }
    Ok(builder.finish())
}

/// Maps font units (y up) to object-local pixels (y down)
struct GlyphSink<'a> {
    builder: &'a mut PathBuilder,
    origin: Vec2,
    scale: f32,
}

impl GlyphSink<'_> {
    #[inline]
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin.x + x * self.scale, self.origin.y - y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for GlyphSink<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
