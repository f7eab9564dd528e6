//! Shared configuration for Foldcard
//!
//! This crate is the single source of truth for the card geometry constants
//! and for the user-tunable editor settings (history, import limits, text
//! defaults, scene colors). Settings are plain serde structs that can be
//! loaded from a TOML file; every field has a default so partial files work.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Card face width in surface pixels. The 3D geometry assumes this value.
pub const CARD_WIDTH: u32 = 375;

/// Card face height in surface pixels. The 3D geometry assumes this value.
pub const CARD_HEIGHT: u32 = 525;

/// Rasterization oversampling factor for face textures.
pub const OVERSAMPLE: u32 = 2;

/// Largest image file accepted for import (10 MiB).
pub const MAX_IMPORT_BYTES: u64 = 10 * 1024 * 1024;

/// Imported images are fitted into this fraction of the surface size.
pub const IMPORT_FIT_RATIO: f32 = 0.6;

/// World units per surface pixel (1 unit = 100 pixels).
pub const UNITS_PER_PIXEL: f32 = 0.01;

/// Default number of undo snapshots kept per ledger
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// How undo/redo history is partitioned across faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryScope {
    /// Every face keeps its own edit timeline
    #[default]
    PerFace,
    /// One timeline shared by all faces (undo may cross face boundaries)
    Shared,
}

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum snapshots per ledger. `0` keeps everything.
    pub limit: usize,
    pub scope: HistoryScope,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
            scope: HistoryScope::default(),
        }
    }
}

impl HistoryConfig {
    /// The ledger bound, `None` when history is unbounded
    pub fn max_entries(&self) -> Option<usize> {
        (self.limit > 0).then_some(self.limit)
    }
}

/// Image import settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Largest accepted file size in bytes
    pub max_bytes: u64,
    /// Fraction of the surface an imported image may cover on each axis
    pub fit_ratio: f32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_bytes: MAX_IMPORT_BYTES,
            fit_ratio: IMPORT_FIT_RATIO,
        }
    }
}

/// Defaults applied to new text objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub font_family: String,
    pub font_size: f32,
    pub fill: [f32; 4],
    pub bold: bool,
    /// Extra font directories searched besides the system fonts
    pub font_dirs: Vec<String>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 32.0,
            fill: [0.1, 0.1, 0.1, 1.0],
            bold: false,
            font_dirs: Vec::new(),
        }
    }
}

/// Drawing surface settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Background painted under every face texture
    pub background: [f32; 4],
    /// Add the centre guide lines to new surfaces
    pub guides: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            background: [1.0, 1.0, 1.0, 1.0],
            guides: true,
        }
    }
}

/// 3D preview material and animation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Base color of faces with no texture
    pub neutral_color: [f32; 4],
    /// Base color of the selected face when it has no texture
    pub selected_color: [f32; 4],
    /// Base color of the hovered face when it has no texture
    pub hovered_color: [f32; 4],
    /// Multiplier applied to the texture of the selected face
    pub selected_tint: [f32; 4],
    /// Multiplier applied to the texture of the hovered face
    pub hovered_tint: [f32; 4],
    pub selected_emissive: [f32; 3],
    pub hovered_emissive: [f32; 3],
    /// Opening angle of each panel away from flat, in degrees
    pub fold_degrees: f32,
    /// Peak idle sway around the spine, in degrees
    pub sway_degrees: f32,
    /// Idle sway period in seconds
    pub sway_period_secs: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            neutral_color: [0.93, 0.92, 0.89, 1.0],
            selected_color: [0.55, 0.75, 1.0, 1.0],
            hovered_color: [0.78, 0.88, 1.0, 1.0],
            selected_tint: [0.85, 0.92, 1.0, 1.0],
            hovered_tint: [0.94, 0.97, 1.0, 1.0],
            selected_emissive: [0.04, 0.08, 0.16],
            hovered_emissive: [0.02, 0.04, 0.08],
            fold_degrees: 20.0,
            sway_degrees: 4.0,
            sway_period_secs: 6.0,
        }
    }
}

/// Complete editor configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history: HistoryConfig,
    pub import: ImportConfig,
    pub text: TextConfig,
    pub canvas: CanvasConfig,
    pub scene: SceneConfig,
}

impl EditorConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        debug!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    /// Render the config back to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.limit == 1 {
            return Err(ConfigError::Invalid {
                field: "history.limit",
                reason: "must keep at least 2 snapshots (0 for unbounded), got 1".to_string(),
            });
        }
        if self.import.max_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "import.max_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !(self.import.fit_ratio > 0.0 && self.import.fit_ratio <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "import.fit_ratio",
                reason: format!("must be in (0, 1], got {}", self.import.fit_ratio),
            });
        }
        if !(self.text.font_size.is_finite() && self.text.font_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "text.font_size",
                reason: format!("must be positive, got {}", self.text.font_size),
            });
        }
        let colors = [
            ("text.fill", self.text.fill),
            ("canvas.background", self.canvas.background),
            ("scene.neutral_color", self.scene.neutral_color),
            ("scene.selected_color", self.scene.selected_color),
            ("scene.hovered_color", self.scene.hovered_color),
            ("scene.selected_tint", self.scene.selected_tint),
            ("scene.hovered_tint", self.scene.hovered_tint),
        ];
        for (field, color) in colors {
            if color.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("channels must be in [0, 1], got {color:?}"),
                });
            }
        }
        if !(self.scene.sway_period_secs > 0.0) {
            return Err(ConfigError::Invalid {
                field: "scene.sway_period_secs",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}
