//! Foldcard drawing system - retained-mode surfaces and their textures
//!
//! This crate provides everything a single card face needs, without any
//! knowledge of which face it is:
//! - [`object`] - Tagged drawing objects (text, image, guide line) and patches
//! - [`surface`] - The retained-mode [`DrawingSurface`] with change notifications
//! - [`raster`] - Texture snapshot generation (CPU rasterizer)
//! - [`history`] - Linear undo/redo ledger of surface snapshots
//! - [`import`] - Image file validation, decoding and placement
//! - [`encode`] - Lossless PNG encoding of textures

pub mod constants;
pub mod encode;
pub mod history;
pub mod import;
pub mod object;
pub mod raster;
pub mod surface;

pub use constants::*;
pub use encode::*;
pub use history::*;
pub use import::*;
pub use object::*;
pub use raster::*;
pub use surface::*;
