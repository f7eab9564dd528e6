//! Material-related types for IPC messages.

use serde::{Deserialize, Serialize};

use super::Face;

/// Reference to a face texture at a specific revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureRef {
    pub face: Face,
    pub revision: u64,
}

/// Material properties for PBR rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    /// Base color, or a multiplier applied to the texture when one is bound
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub base_color_texture: Option<TextureRef>,
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.85,
            emissive: [0.0, 0.0, 0.0],
            base_color_texture: None,
        }
    }
}

impl MaterialProperties {
    /// Untextured matte material of the given color
    pub fn solid(base_color: [f32; 4]) -> Self {
        Self {
            base_color,
            ..Default::default()
        }
    }

    pub fn is_textured(&self) -> bool {
        self.base_color_texture.is_some()
    }
}
