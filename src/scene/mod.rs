//! Scene description: camera, lights, material parameters and meshes
//!
//! The rasterizer only reads scenes through [`SceneAccess`].

mod entities;
mod loader;
mod primitives;

pub use entities::*;
pub use loader::*;
pub use primitives::*;
