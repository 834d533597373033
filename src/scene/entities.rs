//! Scene descriptors consumed read-only by the rasterizer

use serde::{Serialize, Deserialize};

use super::primitives::{create_cube, create_quad};
use crate::rasterizer::{Color, Triangle, Vec3};

/// Pinhole camera. `width`/`height` size the view window at the near plane
/// in world units, which fixes the field of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub pos: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
    /// Positive distance to the near plane
    pub near_clip: f32,
    /// Positive distance to the far plane
    pub far_clip: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: Vec3::new(0.0, 0.0, 5.0),
            look_at: Vec3::ZERO,
            up: Vec3::UP,
            near_clip: 1.0,
            far_clip: 100.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

/// Point light
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub pos: Vec3,
    pub color: Color,
    pub intensity: f32,
}

/// Anti-aliasing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AntiAliasMode {
    #[default]
    None,
    /// Supersampling: only used by flat-color raw triangle drawing
    Ssaa { samples: u32 },
    /// Multisampling: coverage resolved per pixel, shading once per pixel
    Msaa { samples: u32 },
}

impl AntiAliasMode {
    pub fn samples(self) -> u32 {
        match self {
            AntiAliasMode::None => 1,
            AntiAliasMode::Ssaa { samples } | AntiAliasMode::Msaa { samples } => samples.max(1),
        }
    }

    pub fn is_msaa(self) -> bool {
        matches!(self, AntiAliasMode::Msaa { .. })
    }
}

/// Placement of one mesh instance in the world: translation * rotation * scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshTransform {
    pub translation: Vec3,
    pub scale: Vec3,
    pub rotation_axis: Vec3,
    pub rotation_degrees: f32,
}

impl Default for MeshTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation_axis: Vec3::UP,
            rotation_degrees: 0.0,
        }
    }
}

/// Mesh geometry in model space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// 2x2 square in the xy plane facing +z, two triangles
    Quad,
    /// 2x2x2 cube centred on the origin, twelve triangles
    Cube,
    Triangles(Vec<Triangle>),
}

impl Geometry {
    pub fn triangles(&self) -> Vec<Triangle> {
        match self {
            Geometry::Quad => create_quad(),
            Geometry::Cube => create_cube(),
            Geometry::Triangles(tris) => tris.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshInstance {
    pub geometry: Geometry,
    #[serde(default)]
    pub transform: MeshTransform,
}

/// A complete scene description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Output image size in pixels
    pub width: usize,
    pub height: usize,
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub ambient: Color,
    pub specular_exponent: f32,
    /// Texture file; empty means untextured
    pub texture: String,
    pub anti_alias: AntiAliasMode,
    pub background: Color,
    pub meshes: Vec<MeshInstance>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            camera: Camera::default(),
            lights: Vec::new(),
            ambient: Color::new(0.1, 0.1, 0.1),
            specular_exponent: 32.0,
            texture: String::new(),
            anti_alias: AntiAliasMode::None,
            background: Color::BLACK,
            meshes: Vec::new(),
        }
    }
}

/// Read-only view of the scene used by the rasterizer
pub trait SceneAccess {
    fn camera(&self) -> &Camera;
    fn lights(&self) -> &[Light];
    fn ambient_color(&self) -> Color;
    fn specular_exponent(&self) -> f32;
    /// Texture file name; empty when the scene is untextured
    fn texture_name(&self) -> &str;
    fn anti_alias(&self) -> AntiAliasMode;
    fn meshes(&self) -> &[MeshInstance];
    /// Output width in pixels
    fn width(&self) -> usize;
    /// Output height in pixels
    fn height(&self) -> usize;
}

impl SceneAccess for Scene {
    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn lights(&self) -> &[Light] {
        &self.lights
    }

    fn ambient_color(&self) -> Color {
        self.ambient
    }

    fn specular_exponent(&self) -> f32 {
        self.specular_exponent
    }

    fn texture_name(&self) -> &str {
        &self.texture
    }

    fn anti_alias(&self) -> AntiAliasMode {
        self.anti_alias
    }

    fn meshes(&self) -> &[MeshInstance] {
        &self.meshes
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }
}
