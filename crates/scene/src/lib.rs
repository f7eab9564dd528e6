//! Face/texture sync core for Foldcard
//!
//! This crate keeps the four card faces, their textures and the 3D preview
//! in step:
//! - [`registry`] - Owns one drawing surface per face, their textures and history
//! - [`binder`] - Card geometry, per-face materials and pointer picking
//! - [`loader`] - Asynchronous image import with stale-completion protection
//! - [`export`] - PNG and zip export of face textures
//! - [`editor`] - The facade UI commands and events go through

pub mod binder;
pub mod editor;
pub mod export;
pub mod loader;
pub mod registry;

pub use binder::{FaceQuad, PickHit, SceneBinder, SceneSink};
pub use editor::{Editor, EditorError, Listener};
pub use export::{ARCHIVE_FILE_NAME, ExportError, ExportedImage, export_archive, export_face};
pub use loader::{ImageLoader, ImportCompletion, ImportTicket};
pub use registry::{
    EditOutcome, FaceRegistry, RegistryError, SurfaceHandle, SurfaceUpdate, TextureOutcome,
    TextureSet,
};
