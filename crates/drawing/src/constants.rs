/// Snapshot document schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Largest texture edge the rasterizer will allocate.
pub const MAX_TEXTURE_SIZE: u32 = 4096;

/// Line height as a multiple of font size.
pub const LINE_HEIGHT: f32 = 1.16;

/// Vertical coverage samples per pixel row when filling paths.
pub const SUBSCANLINES: u32 = 4;

/// Maximum distance in device pixels between a curve and its flattening.
pub const CURVE_TOLERANCE: f32 = 0.2;

/// Guide line stroke width in surface pixels.
pub const GUIDE_WIDTH: f32 = 1.0;

/// Guide line dash length in surface pixels.
pub const GUIDE_DASH: f32 = 6.0;
