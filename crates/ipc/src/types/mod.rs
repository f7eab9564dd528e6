//! Type definitions for IPC messages.

mod face;
mod material;

pub use face::*;
pub use material::*;
