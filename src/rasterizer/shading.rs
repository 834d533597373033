//! Blinn-Phong lighting of one surface sample

use super::buffer::GSample;
use super::math::Vec3;
use super::types::{Color, LightVectors};
use crate::scene::Light;

/// Lighting parameters shared by every pixel of a render
#[derive(Debug, Clone, Copy)]
pub struct LightingParams<'a> {
    pub eye: Vec3,
    pub lights: &'a [Light],
    pub ambient: Color,
    pub specular_exponent: f32,
    /// Whether `GSample::texel` carries a real texture sample
    pub textured: bool,
    pub light_vectors: LightVectors,
}

/// Shade a surface sample.
///
/// Starts from ambient (modulated by the texel when textured) and adds, per
/// light, inverse-square attenuated diffuse `max(0, N.L)` and specular
/// `max(0, N.H)^exponent` terms in the light's color. `H` is always unit
/// length; whether `L` and `V` are follows [`LightVectors`].
pub fn blinn_phong(sample: &GSample, params: &LightingParams) -> Color {
    let mut result = params.ambient;
    if params.textured {
        result = result.modulate(sample.texel);
    }

    let n = sample.normal;
    let mut to_eye = params.eye - sample.pos;
    if params.light_vectors == LightVectors::Normalized {
        to_eye = to_eye.normalize();
    }

    for light in params.lights {
        let to_light = light.pos - sample.pos;
        let r2 = to_light.dot(to_light);
        if r2 <= 0.0 {
            continue;
        }

        let l = match params.light_vectors {
            LightVectors::Unnormalized => to_light,
            LightVectors::Normalized => to_light.normalize(),
        };
        let h = (l + to_eye).normalize();
        let attenuation = light.intensity / r2;

        let diffuse = attenuation * n.dot(l).max(0.0);
        let specular = attenuation * n.dot(h).max(0.0).powf(params.specular_exponent);

        result = result + light.color.scale_rgb(diffuse) + light.color.scale_rgb(specular);
    }

    result
}
