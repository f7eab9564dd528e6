//! Request payloads carried by editor commands.

use serde::{Deserialize, Serialize};

/// Request to add a text object to the active face.
///
/// Unset fields fall back to the configured text defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddTextRequest {
    pub text: String,
    pub font_family: Option<String>,
    /// Font size in surface pixels
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    /// Fill color (RGBA, 0.0-1.0)
    pub fill: Option<[f32; 4]>,
    /// Centre position in surface pixels (defaults to the face centre)
    pub position: Option<[f32; 2]>,
}

impl AddTextRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}
