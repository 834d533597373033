//! CPU triangle rasterizer
//!
//! Features:
//! - Perspective-correct depth with a nearest-wins Z-buffer
//! - MSAA coverage masks, SSAA for flat-color triangles
//! - Mip-mapped textures, level picked by distance
//! - Deferred (G-buffer) or forward Blinn-Phong shading

mod buffer;
mod coverage;
mod math;
mod mipmap;
mod render;
mod shading;
mod transform;
mod types;

pub use buffer::*;
pub use coverage::*;
pub use math::*;
pub use mipmap::*;
pub use render::*;
pub use shading::*;
pub use transform::*;
pub use types::*;
