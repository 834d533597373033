//! Core types for the rasterizer

use std::ops::{Add, Mul};
use serde::{Serialize, Deserialize};

use super::math::{Vec2, Vec3, Vec4};

/// Linear RGBA color, nominally 0.0-1.0 per channel.
///
/// Lighting may push channels above 1.0; values are clamped only when
/// encoding to bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const RED: Color = Color { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const GREEN: Color = Color { r: 0.0, g: 1.0, b: 0.0, a: 1.0 };
    pub const BLUE: Color = Color { r: 0.0, g: 0.0, b: 1.0, a: 1.0 };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// From 0-255 channels
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            r: bytes[0] as f32 / 255.0,
            g: bytes[1] as f32 / 255.0,
            b: bytes[2] as f32 / 255.0,
            a: bytes[3] as f32 / 255.0,
        }
    }

    /// Convert to [u8; 4], clamping each channel to 0-255
    pub fn to_bytes(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Component-wise product of the color channels. Alpha is taken from `other`.
    pub fn modulate(self, other: Color) -> Self {
        Self {
            r: self.r * other.r,
            g: self.g * other.g,
            b: self.b * other.b,
            a: other.a,
        }
    }

    /// Scale color channels, leaving alpha untouched
    pub fn scale_rgb(self, s: f32) -> Self {
        Self {
            r: self.r * s,
            g: self.g * s,
            b: self.b * s,
            a: self.a,
        }
    }

    /// Maximum per-channel distance, used by tests and comparisons
    pub fn distance(self, other: Color) -> f32 {
        (self.r - other.r)
            .abs()
            .max((self.g - other.g).abs())
            .max((self.b - other.b).abs())
            .max((self.a - other.a).abs())
    }
}

/// Adds color channels; alpha keeps the left-hand value so that light
/// contributions never change surface opacity.
impl Add for Color {
    type Output = Color;
    fn add(self, other: Color) -> Color {
        Color {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
            a: self.a,
        }
    }
}

/// Scales every channel, alpha included (used by box filtering)
impl Mul<Color> for f32 {
    type Output = Color;
    fn mul(self, c: Color) -> Color {
        Color {
            r: self * c.r,
            g: self * c.g,
            b: self * c.b,
            a: self * c.a,
        }
    }
}

/// A triangle with per-vertex position, normal and texture coordinate.
///
/// Positions are homogeneous. Model/world-space triangles carry `w = 1`;
/// screen-space triangles carry pixel `x`/`y`, normalized device depth in
/// `z`, and the view-space depth (the clip-space `w`) in `w`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub pos: [Vec4; 3],
    pub normal: [Vec3; 3],
    pub uv: [Vec2; 3],
}

impl Triangle {
    pub fn new(pos: [Vec3; 3], normal: [Vec3; 3], uv: [Vec2; 3]) -> Self {
        Self {
            pos: pos.map(|p| p.extend(1.0)),
            normal,
            uv,
        }
    }

    /// Triangle with a flat normal derived from the winding and zero UVs
    pub fn from_positions(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let n = (b - a).cross(c - a).normalize();
        Self::new([a, b, c], [n; 3], [Vec2::default(); 3])
    }

    /// Screen-space positions (x, y) of the three vertices
    pub fn screen_points(&self) -> [Vec2; 3] {
        self.pos.map(|p| p.xy())
    }

    /// Twice the signed area of the xy projection
    pub fn signed_area2(&self) -> f32 {
        let [a, b, c] = self.screen_points();
        (b - a).perp_dot(c - a)
    }
}

/// One triangle as it moves through the passes: attributes are interpolated
/// from `original`, coverage and depth are tested against `transformed`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawTriangle {
    /// Draw-order id; the visibility pass records it as the pixel's owner
    pub id: u32,
    /// World-space triangle used for lighting geometry
    pub original: Triangle,
    /// Screen-space triangle used for rasterization tests
    pub transformed: Triangle,
}

impl DrawTriangle {
    pub fn new(id: u32, original: Triangle, transformed: Triangle) -> Self {
        Self { id, original, transformed }
    }
}

/// Where lighting is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadingPath {
    /// Populate the G-buffer for every triangle, then shade once per pixel
    #[default]
    Deferred,
    /// Shade inline while walking each triangle
    Forward,
}

/// Sub-pixel sample placement for supersampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplePattern {
    /// Evenly spaced grid, identical for every pixel
    Grid,
    /// Uniform random offsets from a seeded generator
    Jittered { seed: u64 },
}

/// How the light and view vectors enter the Blinn-Phong terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightVectors {
    /// Diffuse uses the raw surface-to-light vector, so N.L grows with
    /// distance before the inverse-square falloff; the half vector is the
    /// normalized sum of the raw light and view vectors
    #[default]
    Unnormalized,
    /// Unit L and V, the textbook form
    Normalized,
}

/// Rasterizer settings
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSettings {
    /// Deferred (G-buffer) or forward shading
    pub shading: ShadingPath,
    /// Sample placement for SSAA in `draw_primitive_raw`
    pub ssaa_pattern: SamplePattern,
    pub light_vectors: LightVectors,
    /// Initial Z-buffer value, "nothing drawn"
    pub depth_far: f32,
    /// Initial coverage mask value
    pub mask_default: f32,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            shading: ShadingPath::Deferred,
            ssaa_pattern: SamplePattern::Grid,
            light_vectors: LightVectors::Unnormalized,
            depth_far: DEPTH_FAR,
            mask_default: MASK_EMPTY,
        }
    }
}

/// Default Z-buffer value. Depth is stored as view-space z (the camera looks
/// down -z), so larger is nearer and anything visible beats negative infinity.
pub const DEPTH_FAR: f32 = f32::NEG_INFINITY;

/// Default coverage value: no samples covered
pub const MASK_EMPTY: f32 = 0.0;
