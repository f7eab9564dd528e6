//! Main message enums exchanged between the editor core and its UI.

use std::path::PathBuf;

use drawing::{ObjectId, ObjectPatch};
use serde::{Deserialize, Serialize};

use crate::commands::AddTextRequest;
use crate::types::Face;

/// Messages from the UI to the editor core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EditorCommand {
    /// Face button activated
    SelectFace { face: Face },

    /// Face clicked in the 3D preview
    ClickFace { face: Face },

    /// Pointer moved over a face in the 3D preview (None when it left)
    HoverFace { face: Option<Face> },

    /// Add a text object to the active face
    AddText(AddTextRequest),

    /// Import an image file onto the active face
    ImportImage { path: PathBuf },

    /// Partially update an object on the active face
    MutateObject { id: ObjectId, patch: ObjectPatch },

    RemoveObject { id: ObjectId },

    SelectObject { id: ObjectId },

    /// Remove the selected object on the active face
    RemoveSelected,

    BringToFront { id: ObjectId },

    SendToBack { id: ObjectId },

    Undo,

    Redo,

    /// Remove all objects from the active face
    ClearCanvas,

    /// Export the active face's texture as PNG
    ExportActive,

    /// Export every textured face into one archive
    ExportAll,
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Toast-style message derived from an [`EditorEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Messages from the editor core to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EditorEvent {
    /// The live surface switched to another face
    FaceSelected { face: Face },

    Undone { face: Face },

    Redone { face: Face },

    NothingToUndo { face: Face },

    NothingToRedo { face: Face },

    /// An export file was produced
    Exported { file_name: String, bytes: usize },

    ExportFailed { face: Option<Face>, reason: String },

    ImageAdded { face: Face, id: ObjectId },

    /// An image import was refused or failed; nothing changed
    ImageRejected { reason: String },

    CanvasCleared { face: Face, removed: usize },

    /// A face texture was regenerated
    TextureUpdated { face: Face, revision: u64 },

    /// Rasterization failed; the previous texture is kept
    TextureFailed { face: Face, reason: String },

    ObjectAdded { face: Face, id: ObjectId },

    ObjectRemoved { face: Face, id: ObjectId },
}

impl EditorEvent {
    /// Whether the event is worth showing to the user as a toast
    pub fn is_toast(&self) -> bool {
        !matches!(
            self,
            EditorEvent::TextureUpdated { .. }
                | EditorEvent::ObjectAdded { .. }
                | EditorEvent::ObjectRemoved { .. }
        )
    }

    pub fn notification(&self) -> Notification {
        match self {
            EditorEvent::FaceSelected { face } => {
                Notification::info(format!("Editing {}", face.label()))
            }
            EditorEvent::Undone { face } => Notification::info(format!("Undo on {}", face.label())),
            EditorEvent::Redone { face } => Notification::info(format!("Redo on {}", face.label())),
            EditorEvent::NothingToUndo { .. } => Notification::info("Nothing to undo"),
            EditorEvent::NothingToRedo { .. } => Notification::info("Nothing to redo"),
            EditorEvent::Exported { file_name, .. } => {
                Notification::info(format!("Exported {file_name}"))
            }
            EditorEvent::ExportFailed { reason, .. } => {
                Notification::error(format!("Export failed: {reason}"))
            }
            EditorEvent::ImageAdded { face, .. } => {
                Notification::info(format!("Image added to {}", face.label()))
            }
            EditorEvent::ImageRejected { reason } => {
                Notification::error(format!("Could not add image: {reason}"))
            }
            EditorEvent::CanvasCleared { face, .. } => {
                Notification::info(format!("Cleared {}", face.label()))
            }
            EditorEvent::TextureUpdated { face, revision } => {
                Notification::info(format!("{} texture updated (r{revision})", face.label()))
            }
            EditorEvent::TextureFailed { face, reason } => {
                Notification::error(format!("Could not render {}: {reason}", face.label()))
            }
            EditorEvent::ObjectAdded { face, id } => {
                Notification::info(format!("Added {id} to {}", face.label()))
            }
            EditorEvent::ObjectRemoved { face, id } => {
                Notification::info(format!("Removed {id} from {}", face.label()))
            }
        }
    }
}
