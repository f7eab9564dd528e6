//! Drawing objects placed on a surface
//!
//! Every object shares an [`ObjectBase`] (transform, opacity, interaction
//! flags) and carries a kind-specific payload in [`ObjectKind`]. Partial
//! updates go through [`ObjectPatch`] so call sites never poke at
//! kind-specific fields directly.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use glam::{Affine2, Vec2};
use image::RgbaImage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::encode::{EncodeError, encode_png};
use crate::surface::SurfaceError;

/// Identifier of an object within one surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Transform, opacity and interaction flags shared by every object kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectBase {
    /// Centre x in surface pixels
    pub x: f32,
    /// Centre y in surface pixels
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Rotation in degrees, clockwise
    pub angle: f32,
    /// Opacity 0.0-1.0
    pub opacity: f32,
    /// Whether the editor may select the object
    pub selectable: bool,
    /// Excluded from textures and exports
    pub export_excluded: bool,
}

impl Default for ObjectBase {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            opacity: 1.0,
            selectable: true,
            export_excluded: false,
        }
    }
}

impl ObjectBase {
    /// Base centred at the given surface position
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    /// Set a uniform scale
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale_x = scale;
        self.scale_y = scale;
        self
    }

    /// Set the rotation in degrees
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Set the opacity
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Object-local to surface transform (scale, then rotate, then translate)
    pub fn transform(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(
            Vec2::new(self.scale_x, self.scale_y),
            self.angle.to_radians(),
            Vec2::new(self.x, self.y),
        )
    }
}

/// Font weight of a text object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    /// Numeric OpenType weight
    pub fn value(self) -> u16 {
        match self {
            FontWeight::Normal => 400,
            FontWeight::Bold => 700,
        }
    }
}

/// Text payload: content plus style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    pub text: String,
    /// Family name, or a generic family (`sans-serif`, `serif`, `monospace`)
    pub font_family: String,
    /// Font size in surface pixels
    pub font_size: f32,
    pub font_weight: FontWeight,
    /// Fill color, straight RGBA 0.0-1.0
    pub fill: [f32; 4],
}

impl TextObject {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_family: "sans-serif".to_string(),
            font_size: 32.0,
            font_weight: FontWeight::Normal,
            fill: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn with_font(mut self, family: impl Into<String>, size: f32, weight: FontWeight) -> Self {
        self.font_family = family.into();
        self.font_size = size;
        self.font_weight = weight;
        self
    }

    pub fn with_fill(mut self, fill: [f32; 4]) -> Self {
        self.fill = fill;
        self
    }
}

/// Decoded bitmap together with the encoded bytes it came from
///
/// Snapshots carry the encoded bytes (base64), never a re-encoding, so a
/// serialize/deserialize/serialize cycle is byte-stable.
#[derive(Clone)]
pub struct ImageSource {
    encoded: Arc<[u8]>,
    pixels: Arc<RgbaImage>,
}

impl ImageSource {
    /// Decode an encoded image file (PNG, JPEG, BMP, ...)
    pub fn from_encoded(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let pixels = image::load_from_memory(&bytes)?.to_rgba8();
        Ok(Self {
            encoded: bytes.into(),
            pixels: Arc::new(pixels),
        })
    }

    /// Wrap an in-memory bitmap, encoding it as PNG
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self, EncodeError> {
        let encoded = encode_png(&pixels)?;
        Ok(Self {
            encoded: encoded.into(),
            pixels: Arc::new(pixels),
        })
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

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }
}

impl PartialEq for ImageSource {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.encoded, &other.encoded) || self.encoded == other.encoded
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSource")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("encoded_len", &self.encoded.len())
            .finish()
    }
}

impl Serialize for ImageSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.encoded))
    }
}

impl<'de> Deserialize<'de> for ImageSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let data = String::deserialize(deserializer)?;
        let bytes = STANDARD.decode(data).map_err(D::Error::custom)?;
        ImageSource::from_encoded(bytes).map_err(D::Error::custom)
    }
}

/// Image payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageObject {
    pub source: ImageSource,
}

/// Non-interactive layout aid, drawn only in the editor preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideLine {
    /// Start point, object-local
    pub from: [f32; 2],
    /// End point, object-local
    pub to: [f32; 2],
    pub color: [f32; 4],
    /// Stroke width in surface pixels
    pub width: f32,
    pub dashed: bool,
}

/// Kind-specific payload of a drawing object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ObjectKind {
    Text(TextObject),
    Image(ImageObject),
    Guide(GuideLine),
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Text(_) => "text",
            ObjectKind::Image(_) => "image",
            ObjectKind::Guide(_) => "guide",
        }
    }
}

/// An object on a drawing surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingObject {
    pub id: ObjectId,
    pub base: ObjectBase,
    pub kind: ObjectKind,
}

impl DrawingObject {
    pub fn is_guide(&self) -> bool {
        matches!(self.kind, ObjectKind::Guide(_))
    }

    pub fn as_text(&self) -> Option<&TextObject> {
        match &self.kind {
            ObjectKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageObject> {
        match &self.kind {
            ObjectKind::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Apply a partial update
    ///
    /// The patch is validated in full before anything is written, so an
    /// error leaves the object untouched. Returns whether any value changed.
    pub fn apply_patch(&mut self, patch: &ObjectPatch) -> Result<bool, SurfaceError> {
        patch.validate()?;
        if patch.has_text_fields() && !matches!(self.kind, ObjectKind::Text(_)) {
            return Err(SurfaceError::PatchKindMismatch {
                id: self.id,
                kind: self.kind.name(),
            });
        }

        let base = &mut self.base;
        let mut changed = false;
        changed |= assign(&mut base.x, patch.x);
        changed |= assign(&mut base.y, patch.y);
        changed |= assign(&mut base.scale_x, patch.scale_x);
        changed |= assign(&mut base.scale_y, patch.scale_y);
        changed |= assign(&mut base.angle, patch.angle);
        changed |= assign(&mut base.opacity, patch.opacity);

        if let ObjectKind::Text(text) = &mut self.kind {
            changed |= assign(&mut text.text, patch.text.clone());
            changed |= assign(&mut text.font_family, patch.font_family.clone());
            changed |= assign(&mut text.font_size, patch.font_size);
            changed |= assign(&mut text.font_weight, patch.font_weight);
            changed |= assign(&mut text.fill, patch.fill);
        }

        Ok(changed)
    }
}

fn assign<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) if *slot != value => {
            *slot = value;
            true
        }
        _ => false,
    }
}

/// Partial object update; `None` fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub scale_x: Option<f32>,
    pub scale_y: Option<f32>,
    pub angle: Option<f32>,
    pub opacity: Option<f32>,
    pub text: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub font_weight: Option<FontWeight>,
    pub fill: Option<[f32; 4]>,
}

impl ObjectPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the patch touches text-only fields
    pub fn has_text_fields(&self) -> bool {
        self.text.is_some()
            || self.font_family.is_some()
            || self.font_size.is_some()
            || self.font_weight.is_some()
            || self.fill.is_some()
    }

    pub fn validate(&self) -> Result<(), SurfaceError> {
        let finite = [
            ("x", self.x),
            ("y", self.y),
            ("scale_x", self.scale_x),
            ("scale_y", self.scale_y),
            ("angle", self.angle),
            ("opacity", self.opacity),
            ("font_size", self.font_size),
        ];
        for (field, value) in finite {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(invalid(field, "must be finite"));
            }
        }
        for (field, value) in [("scale_x", self.scale_x), ("scale_y", self.scale_y)] {
            if value == Some(0.0) {
                return Err(invalid(field, "must not be zero"));
            }
        }
        if self.opacity.is_some_and(|o| !(0.0..=1.0).contains(&o)) {
            return Err(invalid("opacity", "must be in [0, 1]"));
        }
        if self.font_size.is_some_and(|s| s <= 0.0) {
            return Err(invalid("font_size", "must be positive"));
        }
        if self
            .fill
            .is_some_and(|fill| fill.iter().any(|c| !(0.0..=1.0).contains(c)))
        {
            return Err(invalid("fill", "channels must be in [0, 1]"));
        }
        if self.font_family.as_deref().is_some_and(str::is_empty) {
            return Err(invalid("font_family", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> SurfaceError {
    SurfaceError::InvalidPatch {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_object(text: &str) -> DrawingObject {
        DrawingObject {
            id: ObjectId(1),
            base: ObjectBase::at(10.0, 20.0),
            kind: ObjectKind::Text(TextObject::new(text)),
        }
    }

    #[test]
    fn test_apply_patch() {
        let mut object = text_object("Hello");
        let patch = ObjectPatch {
            x: Some(50.0),
            text: Some("World".to_string()),
            ..Default::default()
        };

        assert!(object.apply_patch(&patch).unwrap());
        assert_eq!(object.base.x, 50.0);
        assert_eq!(object.base.y, 20.0);
        assert_eq!(object.as_text().unwrap().text, "World");
    }

    #[test]
    fn test_noop_patch_reports_unchanged() {
        let mut object = text_object("Hello");
        let patch = ObjectPatch {
            x: Some(10.0),
            text: Some("Hello".to_string()),
            ..Default::default()
        };
        assert!(!object.apply_patch(&patch).unwrap());
        assert!(!object.apply_patch(&ObjectPatch::default()).unwrap());
    }

    #[test]
    fn test_text_patch_on_guide_is_rejected() {
        let mut guide = DrawingObject {
            id: ObjectId(7),
            base: ObjectBase::default(),
            kind: ObjectKind::Guide(GuideLine {
                from: [0.0, -10.0],
                to: [0.0, 10.0],
                color: [0.5, 0.5, 0.5, 1.0],
                width: 1.0,
                dashed: true,
            }),
        };
        let before = guide.clone();
        let patch = ObjectPatch {
            x: Some(3.0),
            font_size: Some(12.0),
            ..Default::default()
        };

        let err = guide.apply_patch(&patch).unwrap_err();
        assert!(matches!(
            err,
            SurfaceError::PatchKindMismatch { kind: "guide", .. }
        ));
        // Nothing was written
        assert_eq!(guide, before);
    }

    #[test]
    fn test_invalid_patch_values() {
        let mut object = text_object("Hello");
        let bad = [
            ObjectPatch {
                opacity: Some(1.5),
                ..Default::default()
            },
            ObjectPatch {
                scale_x: Some(0.0),
                ..Default::default()
            },
            ObjectPatch {
                angle: Some(f32::NAN),
                ..Default::default()
            },
            ObjectPatch {
                font_size: Some(-2.0),
                ..Default::default()
            },
        ];
        for patch in bad {
            assert!(matches!(
                object.apply_patch(&patch),
                Err(SurfaceError::InvalidPatch { .. })
            ));
        }
    }

    #[test]
    fn test_transform_rotates_clockwise() {
        let base = ObjectBase::at(100.0, 100.0).with_angle(90.0);
        let p = base.transform().transform_point2(Vec2::new(10.0, 0.0));
        // +x rotated a quarter turn clockwise on a y-down surface points down
        assert!((p.x - 100.0).abs() < 1e-4);
        assert!((p.y - 110.0).abs() < 1e-4);
    }

    #[test]
    fn test_image_source_serde_preserves_bytes() {
        let pixels = RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]));
        let source = ImageSource::from_rgba(pixels).unwrap();

        let json = serde_json::to_string(&source).unwrap();
        let decoded: ImageSource = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.width(), 3);
        assert_eq!(decoded.height(), 2);
        assert_eq!(decoded.encoded(), source.encoded());
        assert_eq!(decoded.pixels().get_pixel(2, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_image_source_rejects_garbage() {
        let json = serde_json::to_string(&STANDARD.encode(b"not an image")).unwrap();
        assert!(serde_json::from_str::<ImageSource>(&json).is_err());
    }
}
