//! 3D scene binding for the four card faces
//!
//! The card is two panels hinged on the Y axis, opened toward the viewer by
//! `fold_degrees`. Each panel carries a front and a back face. The binder
//! owns that geometry, turns the texture set plus selection/hover state into
//! per-face materials, and maps pointer rays back to faces.
//!
//! Rendering itself lives behind [`SceneSink`]; the binder only pushes
//! materials that changed since the last sync.

use std::f32::consts::TAU;

use drawing::Texture;
use foldcard_config::{CARD_HEIGHT, CARD_WIDTH, SceneConfig, UNITS_PER_PIXEL};
use foldcard_ipc::{Face, MaterialProperties, TextureRef};
use glam::{Quat, Vec2, Vec3};
use tracing::{debug, info, trace};

use crate::registry::TextureSet;

/// Render-side collaborator receiving face materials
pub trait SceneSink {
    /// Replace the material on a face. `texture` is set whenever the
    /// material references one.
    fn apply_material(
        &mut self,
        face: Face,
        material: &MaterialProperties,
        texture: Option<&Texture>,
    );
}

/// World-space quad of one face at rest (no sway)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceQuad {
    pub face: Face,
    pub center: Vec3,
    /// Outward normal of the visible side
    pub normal: Vec3,
    /// Direction of increasing texture U
    pub u_axis: Vec3,
    /// Direction of increasing texture V (texture rows run downward)
    pub v_axis: Vec3,
    pub width: f32,
    pub height: f32,
    /// Back faces run U opposite to the panel's front
    pub flip_u: bool,
}

impl FaceQuad {
    /// Build the quad for a face with panels opened `fold` radians
    pub fn new(face: Face, fold: f32) -> Self {
        let width = CARD_WIDTH as f32 * UNITS_PER_PIXEL;
        let height = CARD_HEIGHT as f32 * UNITS_PER_PIXEL;
        let (sin, cos) = fold.sin_cos();

        // Panel direction from the spine outward, and the front normal
        let (panel_dir, front_normal) = if face.is_left() {
            (Vec3::new(-cos, 0.0, sin), Vec3::new(sin, 0.0, cos))
        } else {
            (Vec3::new(cos, 0.0, sin), Vec3::new(-sin, 0.0, cos))
        };
        // Seen from the front, U runs left to right across the spread
        let front_u = if face.is_left() { -panel_dir } else { panel_dir };

        let (normal, u_axis) = if face.is_front() {
            (front_normal, front_u)
        } else {
            (-front_normal, -front_u)
        };

        Self {
            face,
            center: panel_dir * (width / 2.0),
            normal,
            u_axis,
            v_axis: Vec3::NEG_Y,
            width,
            height,
            flip_u: !face.is_front(),
        }
    }

    /// Corners in UV order: (0,0), (1,0), (1,1), (0,1)
    pub fn corners(&self) -> [Vec3; 4] {
        [
            self.point_at(Vec2::new(0.0, 0.0)),
            self.point_at(Vec2::new(1.0, 0.0)),
            self.point_at(Vec2::new(1.0, 1.0)),
            self.point_at(Vec2::new(0.0, 1.0)),
        ]
    }

    /// World position of a texture coordinate
    pub fn point_at(&self, uv: Vec2) -> Vec3 {
        self.center
            + self.u_axis * ((uv.x - 0.5) * self.width)
            + self.v_axis * ((uv.y - 0.5) * self.height)
    }

    /// Intersect a ray with the visible side of this quad
    ///
    /// Returns the ray distance and the texture coordinate of the hit.
    pub fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<(f32, Vec2)> {
        let denom = dir.dot(self.normal);
        if denom >= -f32::EPSILON {
            return None;
        }
        let distance = (self.center - origin).dot(self.normal) / denom;
        if distance < 0.0 {
            return None;
        }
        let local = origin + dir * distance - self.center;
        let uv = Vec2::new(
            local.dot(self.u_axis) / self.width + 0.5,
            local.dot(self.v_axis) / self.height + 0.5,
        );
        let inside = (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y);
        inside.then_some((distance, uv))
    }
}

/// Result of picking a face with a pointer ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub face: Face,
    pub uv: Vec2,
    pub distance: f32,
}

/// Binds face textures onto the card geometry
#[derive(Debug)]
pub struct SceneBinder {
    config: SceneConfig,
    quads: [FaceQuad; 4],
    hovered: Option<Face>,
    applied: [Option<MaterialProperties>; 4],
}

impl SceneBinder {
    pub fn new(config: SceneConfig) -> Self {
        let fold = config.fold_degrees.to_radians();
        let quads = Face::ALL.map(|face| FaceQuad::new(face, fold));
        info!(
            "Card geometry: {}x{} units per face, folded {} degrees",
            quads[0].width, quads[0].height, config.fold_degrees
        );
        Self {
            config,
            quads,
            hovered: None,
            applied: Default::default(),
        }
    }

    pub fn quad(&self, face: Face) -> &FaceQuad {
        &self.quads[face.index()]
    }

    pub fn quads(&self) -> &[FaceQuad; 4] {
        &self.quads
    }

    pub fn hovered(&self) -> Option<Face> {
        self.hovered
    }

    /// Material for one face
    ///
    /// Selection wins over hover. Textured faces keep their texture and get
    /// a tint; untextured faces get a flat highlight or the neutral color.
    pub fn material_for(
        &self,
        face: Face,
        texture: Option<&Texture>,
        selected: bool,
        hovered: bool,
    ) -> MaterialProperties {
        let config = &self.config;
        let emissive = if selected {
            config.selected_emissive
        } else if hovered {
            config.hovered_emissive
        } else {
            [0.0; 3]
        };

        match texture {
            Some(texture) => {
                let tint = if selected {
                    config.selected_tint
                } else if hovered {
                    config.hovered_tint
                } else {
                    [1.0; 4]
                };
                MaterialProperties {
                    base_color: tint,
                    emissive,
                    base_color_texture: Some(TextureRef {
                        face,
                        revision: texture.revision(),
                    }),
                    ..Default::default()
                }
            }
            None => {
                let color = if selected {
                    config.selected_color
                } else if hovered {
                    config.hovered_color
                } else {
                    config.neutral_color
                };
                MaterialProperties {
                    emissive,
                    ..MaterialProperties::solid(color)
                }
            }
        }
    }

    /// Materials for all faces, indexed by [`Face::index`]
    pub fn materials(&self, textures: &TextureSet, selected: Face) -> [MaterialProperties; 4] {
        Face::ALL.map(|face| {
            self.material_for(
                face,
                textures.get(face),
                face == selected,
                self.hovered == Some(face),
            )
        })
    }

    /// Push changed materials to the sink; returns how many were applied
    pub fn sync(
        &mut self,
        textures: &TextureSet,
        selected: Face,
        sink: &mut dyn SceneSink,
    ) -> usize {
        let materials = self.materials(textures, selected);
        let mut applied = 0;
        for (face, material) in Face::ALL.into_iter().zip(materials) {
            let slot = &mut self.applied[face.index()];
            if slot.as_ref() == Some(&material) {
                continue;
            }
            let texture = material
                .base_color_texture
                .and_then(|_| textures.get(face));
            sink.apply_material(face, &material, texture);
            trace!("Applied material to {}: {:?}", face, material);
            *slot = Some(material);
            applied += 1;
        }
        if applied > 0 {
            debug!("Synced {} face materials", applied);
        }
        applied
    }

    /// Forget what the sink holds so the next sync re-applies everything
    pub fn reset(&mut self) {
        self.applied = Default::default();
    }

    /// Set the hovered face; returns whether it changed
    pub fn hover(&mut self, face: Option<Face>) -> bool {
        if self.hovered == face {
            return false;
        }
        self.hovered = face;
        true
    }

    /// Update hover from a pointer ray at animation time `time`
    pub fn hover_at(&mut self, origin: Vec3, dir: Vec3, time: f32) -> Option<Face> {
        let face = self.pick(origin, dir, time).map(|hit| hit.face);
        self.hover(face);
        face
    }

    /// Face under a click ray, if any
    pub fn click(&self, origin: Vec3, dir: Vec3, time: f32) -> Option<Face> {
        let hit = self.pick(origin, dir, time)?;
        info!("Clicked {} at uv ({:.2}, {:.2})", hit.face, hit.uv.x, hit.uv.y);
        Some(hit.face)
    }

    /// Nearest face hit by a world-space ray, accounting for the idle sway
    pub fn pick(&self, origin: Vec3, dir: Vec3, time: f32) -> Option<PickHit> {
        let dir = dir.try_normalize()?;
        // Move the ray into the card's rest frame
        let inverse = Quat::from_rotation_y(-self.sway_angle(time));
        let (origin, dir) = (inverse * origin, inverse * dir);

        self.quads
            .iter()
            .filter_map(|quad| {
                quad.intersect(origin, dir).map(|(distance, uv)| PickHit {
                    face: quad.face,
                    uv,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Rotation of the card around the spine at time `time` (seconds)
    pub fn sway_angle(&self, time: f32) -> f32 {
        let period = self.config.sway_period_secs;
        if period <= 0.0 {
            return 0.0;
        }
        self.config.sway_degrees.to_radians() * (TAU * time / period).sin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[derive(Default)]
    struct RecordingSink {
        applied: Vec<(Face, MaterialProperties, bool)>,
    }

    impl SceneSink for RecordingSink {
        fn apply_material(
            &mut self,
            face: Face,
            material: &MaterialProperties,
            texture: Option<&Texture>,
        ) {
            self.applied.push((face, material.clone(), texture.is_some()));
        }
    }

    fn binder() -> SceneBinder {
        SceneBinder::new(SceneConfig::default())
    }

    fn texture(revision: u64) -> Texture {
        Texture::new(RgbaImage::new(2, 2), revision)
    }

    #[test]
    fn test_quad_dimensions() {
        let binder = binder();
        for quad in binder.quads() {
            assert!((quad.width - 3.75).abs() < 1e-5);
            assert!((quad.height - 5.25).abs() < 1e-5);
            assert!(quad.normal.dot(quad.u_axis).abs() < 1e-5);
        }
    }

    #[test]
    fn test_back_faces_mirror_front() {
        let binder = binder();
        let front = binder.quad(Face::FrontLeft);
        let back = binder.quad(Face::BackLeft);
        assert_eq!(front.center, back.center);
        assert_eq!(front.normal, -back.normal);
        assert_eq!(front.u_axis, -back.u_axis);
        assert!(back.flip_u && !front.flip_u);
    }

    #[test]
    fn test_front_spread_reads_left_to_right() {
        let binder = binder();
        // U=1 of the left panel and U=0 of the right panel meet at the spine
        let left_end = binder.quad(Face::FrontLeft).point_at(Vec2::new(1.0, 0.5));
        let right_start = binder.quad(Face::FrontRight).point_at(Vec2::new(0.0, 0.5));
        assert!(left_end.length() < 1e-4);
        assert!(right_start.length() < 1e-4);
    }

    #[test]
    fn test_pick_faces() {
        let binder = binder();
        let forward = Vec3::NEG_Z;
        let hit = |x: f32, z: f32, dir: Vec3| binder.pick(Vec3::new(x, 0.0, z), dir, 0.0);

        assert_eq!(hit(-1.5, 10.0, forward).unwrap().face, Face::FrontLeft);
        assert_eq!(hit(1.5, 10.0, forward).unwrap().face, Face::FrontRight);
        assert_eq!(hit(-1.5, -10.0, Vec3::Z).unwrap().face, Face::BackLeft);
        assert_eq!(hit(1.5, -10.0, Vec3::Z).unwrap().face, Face::BackRight);
        assert!(hit(10.0, 10.0, forward).is_none());
        assert!(binder.pick(Vec3::new(-1.5, 3.0, 10.0), forward, 0.0).is_none());
    }

    #[test]
    fn test_pick_uv() {
        let binder = binder();
        let outer = binder.pick(Vec3::new(-3.2, 0.0, 10.0), Vec3::NEG_Z, 0.0).unwrap();
        let inner = binder.pick(Vec3::new(-0.3, 0.0, 10.0), Vec3::NEG_Z, 0.0).unwrap();
        assert!(outer.uv.x < 0.5 && inner.uv.x > 0.5);
        assert!((outer.uv.y - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_sway_angle() {
        let binder = binder();
        assert_eq!(binder.sway_angle(0.0), 0.0);
        let peak = binder.sway_angle(1.5);
        assert!((peak - 4.0_f32.to_radians()).abs() < 1e-5);

        let still = SceneBinder::new(SceneConfig {
            sway_period_secs: 0.0,
            ..SceneConfig::default()
        });
        assert_eq!(still.sway_angle(3.0), 0.0);
    }

    #[test]
    fn test_pick_follows_sway() {
        let binder = binder();
        let time = 1.5;
        let target = binder.quad(Face::FrontRight).point_at(Vec2::new(0.5, 0.5));
        let swayed = Quat::from_rotation_y(binder.sway_angle(time)) * target;
        let origin = swayed + Vec3::Z * 10.0;
        let hit = binder.pick(origin, swayed - origin, time).unwrap();
        assert_eq!(hit.face, Face::FrontRight);
        assert!((hit.uv - Vec2::splat(0.5)).length() < 1e-3);
    }

    #[test]
    fn test_untextured_materials() {
        let binder = binder();
        let config = SceneConfig::default();
        let materials = binder.materials(&TextureSet::default(), Face::FrontLeft);

        assert_eq!(materials[Face::FrontLeft.index()].base_color, config.selected_color);
        assert_eq!(materials[Face::BackRight.index()].base_color, config.neutral_color);
        assert!(materials.iter().all(|m| !m.is_textured()));
    }

    #[test]
    fn test_textured_materials() {
        let mut binder = binder();
        let config = SceneConfig::default();
        let mut textures = TextureSet::default();
        textures.set(Face::FrontLeft, Some(texture(3)));
        textures.set(Face::FrontRight, Some(texture(4)));
        binder.hover(Some(Face::FrontRight));

        let materials = binder.materials(&textures, Face::FrontLeft);
        let selected = &materials[Face::FrontLeft.index()];
        assert_eq!(selected.base_color, config.selected_tint);
        assert_eq!(
            selected.base_color_texture,
            Some(TextureRef {
                face: Face::FrontLeft,
                revision: 3
            })
        );
        let hovered = &materials[Face::FrontRight.index()];
        assert_eq!(hovered.base_color, config.hovered_tint);
        assert_eq!(hovered.emissive, config.hovered_emissive);
    }

    #[test]
    fn test_selection_beats_hover() {
        let mut binder = binder();
        binder.hover(Some(Face::BackLeft));
        let materials = binder.materials(&TextureSet::default(), Face::BackLeft);
        assert_eq!(
            materials[Face::BackLeft.index()].base_color,
            SceneConfig::default().selected_color
        );
    }

    #[test]
    fn test_sync_pushes_only_changes() {
        let mut binder = binder();
        let mut sink = RecordingSink::default();
        let mut textures = TextureSet::default();

        assert_eq!(binder.sync(&textures, Face::FrontLeft, &mut sink), 4);
        assert_eq!(binder.sync(&textures, Face::FrontLeft, &mut sink), 0);

        textures.set(Face::FrontLeft, Some(texture(1)));
        assert_eq!(binder.sync(&textures, Face::FrontLeft, &mut sink), 1);
        let (face, material, has_texture) = sink.applied.last().unwrap();
        assert_eq!(*face, Face::FrontLeft);
        assert!(material.is_textured() && *has_texture);

        // Moving the selection changes two faces
        assert_eq!(binder.sync(&textures, Face::BackRight, &mut sink), 2);

        binder.reset();
        assert_eq!(binder.sync(&textures, Face::BackRight, &mut sink), 4);
    }

    #[test]
    fn test_hover_and_click() {
        let mut binder = binder();
        assert_eq!(
            binder.hover_at(Vec3::new(1.0, 0.0, 10.0), Vec3::NEG_Z, 0.0),
            Some(Face::FrontRight)
        );
        assert_eq!(binder.hovered(), Some(Face::FrontRight));
        assert_eq!(binder.hover_at(Vec3::new(9.0, 0.0, 10.0), Vec3::NEG_Z, 0.0), None);
        assert_eq!(binder.hovered(), None);

        assert_eq!(
            binder.click(Vec3::new(-1.0, 0.0, -10.0), Vec3::Z, 0.0),
            Some(Face::BackLeft)
        );
        assert!(!binder.hover(None));
    }
}
