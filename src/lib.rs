//! Deferred Raster: a CPU triangle rasterizer
//!
//! Scenes are described in RON (see [`scene`]) and rendered by
//! [`rasterizer::Rasterizer`] into an RGBA [`rasterizer::Image`].

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod rasterizer;
pub mod scene;

pub use error::{RasterError, Result};
pub use rasterizer::{Image, RasterSettings, Rasterizer, RenderStats};
pub use scene::{load_scene, Scene, SceneAccess};
