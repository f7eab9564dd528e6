//! Headless stand-in for the 3D preview
//!
//! Records the material of every face as the binder pushes it, and can write
//! the bound textures out so a replay's end state can be inspected.

use std::path::Path;

use anyhow::Result;
use drawing::Texture;
use foldcard_ipc::{Face, MaterialProperties};
use foldcard_scene::SceneSink;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct HeadlessScene {
    faces: [Option<(MaterialProperties, Option<Texture>)>; 4],
    updates: usize,
}

impl HeadlessScene {
    /// Total material updates received
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Log the current state of each face
    pub fn report(&self) {
        for face in Face::ALL {
            match &self.faces[face.index()] {
                Some((material, Some(texture))) => info!(
                    "{}: texture r{} {}x{}, tint {:?}",
                    face,
                    texture.revision(),
                    texture.width(),
                    texture.height(),
                    material.base_color
                ),
                Some((material, None)) => {
                    info!("{}: untextured, color {:?}", face, material.base_color)
                }
                None => info!("{}: no material", face),
            }
        }
    }

    /// Write `preview-<face>.png` for every textured face
    pub fn write_previews(&self, dir: &Path) -> Result<usize> {
        let mut written = 0;
        for face in Face::ALL {
            if let Some((_, Some(texture))) = &self.faces[face.index()] {
                let path = dir.join(format!("preview-{}.png", face.id()));
                std::fs::write(&path, texture.to_png()?)?;
                debug!("Wrote {}", path.display());
                written += 1;
            }
        }
        Ok(written)
    }
}

impl SceneSink for HeadlessScene {
    fn apply_material(
        &mut self,
        face: Face,
        material: &MaterialProperties,
        texture: Option<&Texture>,
    ) {
        self.faces[face.index()] = Some((material.clone(), texture.cloned()));
        self.updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawing::{FontBook, Rasterizer, encode_png};
    use foldcard_config::{EditorConfig, OVERSAMPLE};
    use foldcard_scene::Editor;

    fn png() -> Vec<u8> {
        let pixels = image::RgbaImage::from_pixel(16, 16, image::Rgba([0, 128, 255, 255]));
        encode_png(&pixels).unwrap()
    }

    #[test]
    fn test_records_synced_materials() {
        let mut editor = Editor::with_rasterizer(
            EditorConfig::default(),
            Rasterizer::new(FontBook::empty(), OVERSAMPLE),
        );
        editor.import_image_bytes("a.png", "image/png", png());
        editor.pump_imports();

        let mut scene = HeadlessScene::default();
        assert_eq!(editor.sync_scene(&mut scene), 4);
        assert_eq!(scene.updates(), 4);
        let material = |face: Face| &scene.faces[face.index()].as_ref().unwrap().0;
        assert!(material(Face::FrontLeft).is_textured());
        assert!(!material(Face::BackLeft).is_textured());

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(scene.write_previews(dir.path()).unwrap(), 1);
        assert!(dir.path().join("preview-front-left.png").exists());
    }
}
