//! Core rendering passes
//!
//! Visibility is settled before any attributes are gathered: a full depth
//! pass over every triangle, then (with MSAA) a full coverage pass, then the
//! G-buffer pass, then one shading pass over the image. Each later pass only
//! touches pixels whose Z-buffer owner is the triangle being walked.

use std::path::Path;

use super::buffer::{CoverageMask, DepthSample, GBuffer, GSample, Image, ZBuffer};
use super::coverage::{
    barycentric, bounding_box, coverage, grid_offsets, point_in_triangle, weights_inside,
    SubpixelSampler, PIXEL_CENTER,
};
use super::math::{Mat4, Vec2, Vec3};
use super::mipmap::MipChain;
use super::shading::{blinn_phong, LightingParams};
use super::transform::{build_projection, build_screen_space, build_view, Transforms};
use super::types::{Color, DrawTriangle, RasterSettings, SamplePattern, ShadingPath, Triangle};
use crate::error::Result;
use crate::scene::{AntiAliasMode, MeshTransform, SceneAccess};

/// Counts from one call to [`Rasterizer::render`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Triangles that reached the passes
    pub triangles: usize,
    /// Triangles dropped for touching or crossing the camera plane
    pub culled: usize,
    /// Pixels written by shading
    pub shaded_pixels: usize,
}

/// Stages of [`Rasterizer::render`], in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    /// Buffer reset and the world-to-screen draw list
    Transform,
    Depth,
    /// MSAA coverage; a no-op without MSAA
    Coverage,
    /// G-buffer fill and shading, or the forward walk
    Shading,
}

impl RenderPass {
    pub const ALL: [RenderPass; 4] = [
        RenderPass::Transform,
        RenderPass::Depth,
        RenderPass::Coverage,
        RenderPass::Shading,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RenderPass::Transform => "transform",
            RenderPass::Depth => "depth",
            RenderPass::Coverage => "coverage",
            RenderPass::Shading => "shading",
        }
    }
}

/// Per-render state: matrices, buffers and the texture chain.
///
/// Buffers are sized to the scene's output resolution and owned exclusively
/// by the rasterizer for the duration of a render.
pub struct Rasterizer<'a> {
    scene: &'a dyn SceneAccess,
    settings: RasterSettings,
    transforms: Transforms,
    zbuffer: ZBuffer,
    msaa_mask: CoverageMask,
    gbuffer: GBuffer,
    mipmaps: Option<MipChain>,
    msaa_samples: Vec<Vec2>,
}

impl<'a> Rasterizer<'a> {
    pub fn new(scene: &'a dyn SceneAccess) -> Result<Self> {
        Self::with_settings(scene, RasterSettings::default())
    }

    /// Build matrices for the scene camera and every mesh instance, and load
    /// the texture chain when the scene names a texture.
    pub fn with_settings(scene: &'a dyn SceneAccess, settings: RasterSettings) -> Result<Self> {
        let (width, height) = (scene.width(), scene.height());
        let anti_alias = scene.anti_alias();
        let msaa_samples = if anti_alias.is_msaa() {
            grid_offsets(anti_alias.samples())
        } else {
            Vec::new()
        };

        let mut rasterizer = Self {
            scene,
            transforms: Transforms::new(scene.camera(), width, height),
            zbuffer: ZBuffer::new(width, height, DepthSample::empty(settings.depth_far)),
            msaa_mask: CoverageMask::new(width, height, settings.mask_default),
            gbuffer: GBuffer::new(width, height, None),
            mipmaps: None,
            msaa_samples,
            settings,
        };

        for mesh in scene.meshes() {
            rasterizer.add_model(&mesh.transform);
        }

        let texture = scene.texture_name();
        if !texture.is_empty() {
            rasterizer.create_mip_map(texture)?;
        }

        Ok(rasterizer)
    }

    pub fn settings(&self) -> &RasterSettings {
        &self.settings
    }

    pub fn transforms(&self) -> &Transforms {
        &self.transforms
    }

    pub fn zbuffer(&self) -> &ZBuffer {
        &self.zbuffer
    }

    pub fn coverage_mask(&self) -> &CoverageMask {
        &self.msaa_mask
    }

    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    /// Sub-pixel sample offsets used by the coverage pass
    pub fn msaa_samples(&self) -> &[Vec2] {
        &self.msaa_samples
    }

    fn msaa_enabled(&self) -> bool {
        self.scene.anti_alias().is_msaa()
    }

    // ---- transforms ----

    /// Recompute the view matrix from the scene camera
    pub fn set_view(&mut self) {
        self.transforms.view = build_view(self.scene.camera());
    }

    /// Recompute the projection matrix from the scene camera
    pub fn set_projection(&mut self) {
        self.transforms.projection = build_projection(self.scene.camera());
    }

    /// Recompute the screen-space matrix from the output size
    pub fn set_screen_space(&mut self) {
        self.transforms.screen_space = build_screen_space(self.scene.width(), self.scene.height());
    }

    /// Append a model matrix; returns the model id
    pub fn add_model(&mut self, transform: &MeshTransform) -> usize {
        self.transforms.add_model(transform)
    }

    /// Append a model matrix with an externally supplied rotation
    pub fn add_model_with_rotation(&mut self, transform: &MeshTransform, rotation: Mat4) -> usize {
        self.transforms.add_model_with_rotation(transform, rotation)
    }

    // ---- textures ----

    /// Load `path` and build its mip chain; the render becomes textured
    pub fn create_mip_map<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.mipmaps = Some(MipChain::from_file(path)?);
        Ok(())
    }

    pub fn mip_chain(&self) -> Option<&MipChain> {
        self.mipmaps.as_ref()
    }

    /// Texel for `uv` at normalized depth `depth`; white when untextured
    pub fn get_texel(&self, uv: Vec2, depth: f32) -> Color {
        self.mipmaps
            .as_ref()
            .map(|chain| chain.get_texel(uv, depth))
            .unwrap_or(Color::WHITE)
    }

    // ---- buffers ----

    /// Reset the Z-buffer to the configured far value
    pub fn init_zbuffer(&mut self) {
        let (w, h) = (self.scene.width(), self.scene.height());
        self.zbuffer.reset(w, h, DepthSample::empty(self.settings.depth_far));
    }

    /// Reset the coverage mask to the configured default
    pub fn init_msaa_mask(&mut self) {
        let (w, h) = (self.scene.width(), self.scene.height());
        self.msaa_mask.reset(w, h, self.settings.mask_default);
    }

    /// Empty every G-buffer cell
    pub fn init_gbuffer(&mut self) {
        let (w, h) = (self.scene.width(), self.scene.height());
        self.gbuffer.reset(w, h, None);
    }

    // ---- geometry ----

    /// Transform every mesh instance into draw triangles, in scene order.
    /// Returns the list and the number of triangles culled at the camera plane.
    pub fn build_draw_list(&self) -> (Vec<DrawTriangle>, usize) {
        let mut draws = Vec::new();
        let mut culled = 0;

        for (model_id, mesh) in self.scene.meshes().iter().enumerate() {
            for tri in mesh.geometry.triangles() {
                match self.transforms.transform_triangle(model_id, &tri) {
                    Some((world, screen)) => {
                        let id = draws.len() as u32;
                        draws.push(DrawTriangle::new(id, world, screen));
                    }
                    None => culled += 1,
                }
            }
        }

        if culled > 0 {
            log::debug!("Culled {} triangles crossing the camera plane", culled);
        }
        (draws, culled)
    }

    // ---- per-pixel helpers ----

    /// Barycentric weights at the pixel center and the perspective-correct
    /// view-space depth, or `None` when the center is outside the triangle
    fn resolve_depth(x: usize, y: usize, transformed: &Triangle) -> Option<(Vec3, f32)> {
        let center = Vec2::new(x as f32, y as f32) + PIXEL_CENTER;
        let bc = barycentric(center, transformed)?;
        if !weights_inside(bc) {
            return None;
        }

        // 1/z is linear in screen space, z is not
        let [a, b, c] = transformed.pos;
        let inv_depth = bc.x / a.w + bc.y / b.w + bc.z / c.w;
        let depth = 1.0 / inv_depth;
        depth.is_finite().then_some((bc, depth))
    }

    fn is_owner(&self, x: usize, y: usize, id: u32) -> bool {
        self.zbuffer.get(x, y).is_some_and(|cell| cell.owner == Some(id))
    }

    /// Interpolated surface attributes for a pixel this triangle owns
    fn surface_sample(&self, x: usize, y: usize, tri: &DrawTriangle) -> Option<GSample> {
        if self.msaa_enabled() && self.msaa_mask.get(x, y).copied().unwrap_or(0.0) == 0.0 {
            return None;
        }

        let (bc, depth) = Self::resolve_depth(x, y, &tri.transformed)?;
        if !self.is_owner(x, y, tri.id) {
            return None;
        }

        let o = &tri.original;
        let normal = (o.normal[0] * bc.x + o.normal[1] * bc.y + o.normal[2] * bc.z).normalize();
        let pos = o.pos[0].xyz() * bc.x + o.pos[1].xyz() * bc.y + o.pos[2].xyz() * bc.z;

        let texel = match &self.mipmaps {
            Some(chain) => {
                let uv = o.uv[0] * bc.x + o.uv[1] * bc.y + o.uv[2] * bc.z;
                chain.get_texel(uv, self.transforms.normalized_distance(depth))
            }
            None => Color::WHITE,
        };

        Some(GSample { normal, pos, texel })
    }

    fn lighting(&self) -> LightingParams<'a> {
        let scene = self.scene;
        LightingParams {
            eye: scene.camera().pos,
            lights: scene.lights(),
            ambient: scene.ambient_color(),
            specular_exponent: scene.specular_exponent(),
            textured: self.mipmaps.is_some(),
            light_vectors: self.settings.light_vectors,
        }
    }

    /// Apply MSAA coverage to a shaded color
    fn resolve_coverage(&self, x: usize, y: usize, color: Color) -> Color {
        if self.msaa_enabled() {
            let mask = self.msaa_mask.get(x, y).copied().unwrap_or(0.0);
            mask * color
        } else {
            color
        }
    }

    // ---- visibility ----

    /// Nearest-wins depth update; ties keep the earlier occupant
    pub fn update_depth_at_pixel(&mut self, x: usize, y: usize, tri: &DrawTriangle) {
        let Some((_, depth)) = Self::resolve_depth(x, y, &tri.transformed) else {
            return;
        };
        let Some(cell) = self.zbuffer.get(x, y) else {
            return;
        };
        if depth > cell.depth {
            self.zbuffer.set(x, y, DepthSample { depth, owner: Some(tri.id) });
        }
    }

    /// Record the fraction of MSAA samples covered, if this triangle owns the pixel
    pub fn update_msaa_at_pixel(&mut self, x: usize, y: usize, tri: &DrawTriangle) {
        if !self.is_owner(x, y, tri.id) {
            return;
        }
        let base = Vec2::new(x as f32, y as f32);
        let covered = coverage(base, &self.msaa_samples, &tri.transformed);
        self.msaa_mask.set(x, y, covered);
    }

    /// Write interpolated normal, position and texel, if this triangle owns the pixel
    pub fn update_gbuffer_at_pixel(&mut self, x: usize, y: usize, tri: &DrawTriangle) {
        if let Some(sample) = self.surface_sample(x, y, tri) {
            self.gbuffer.set(x, y, Some(sample));
        }
    }

    pub fn draw_primitive_depth(&mut self, tri: &DrawTriangle) {
        let rect = bounding_box(&tri.transformed, self.zbuffer.width(), self.zbuffer.height());
        for (x, y) in rect.pixels() {
            self.update_depth_at_pixel(x, y, tri);
        }
    }

    pub fn draw_primitive_msaa(&mut self, tri: &DrawTriangle) {
        let rect = bounding_box(&tri.transformed, self.msaa_mask.width(), self.msaa_mask.height());
        for (x, y) in rect.pixels() {
            self.update_msaa_at_pixel(x, y, tri);
        }
    }

    pub fn draw_primitive_gbuffer(&mut self, tri: &DrawTriangle) {
        let rect = bounding_box(&tri.transformed, self.gbuffer.width(), self.gbuffer.height());
        for (x, y) in rect.pixels() {
            self.update_gbuffer_at_pixel(x, y, tri);
        }
    }

    // ---- shading ----

    /// Deferred shading of one pixel from the G-buffer. Returns whether the
    /// pixel was written.
    pub fn shade_at_pixel(&self, x: usize, y: usize, image: &mut Image) -> bool {
        let Some(Some(sample)) = self.gbuffer.get(x, y) else {
            return false;
        };
        let color = blinn_phong(sample, &self.lighting());
        image.set(x, y, self.resolve_coverage(x, y, color));
        true
    }

    /// Forward shading of one pixel: interpolate and light inline. The sample
    /// is also recorded in the G-buffer.
    pub fn shade_forward_at_pixel(&mut self, x: usize, y: usize, tri: &DrawTriangle, image: &mut Image) -> bool {
        let Some(sample) = self.surface_sample(x, y, tri) else {
            return false;
        };
        self.gbuffer.set(x, y, Some(sample));
        let color = blinn_phong(&sample, &self.lighting());
        image.set(x, y, self.resolve_coverage(x, y, color));
        true
    }

    /// Forward-shade every pixel one triangle owns
    pub fn draw_primitive_shaded(&mut self, tri: &DrawTriangle, image: &mut Image) -> usize {
        let rect = bounding_box(&tri.transformed, image.width(), image.height());
        rect.pixels()
            .filter(|&(x, y)| self.shade_forward_at_pixel(x, y, tri, image))
            .count()
    }

    /// Shade the whole image from the G-buffer
    pub fn shade_deferred(&self, image: &mut Image) -> usize {
        let (w, h) = (self.gbuffer.width(), self.gbuffer.height());
        let mut shaded = 0;
        for y in 0..h {
            for x in 0..w {
                if self.shade_at_pixel(x, y, image) {
                    shaded += 1;
                }
            }
        }
        shaded
    }

    // ---- passes ----

    pub fn depth_pass(&mut self, draws: &[DrawTriangle]) {
        log::debug!("Depth pass: {} triangles", draws.len());
        for tri in draws {
            self.draw_primitive_depth(tri);
        }
    }

    /// Coverage pass; a no-op unless the scene uses MSAA
    pub fn coverage_pass(&mut self, draws: &[DrawTriangle]) {
        if !self.msaa_enabled() {
            return;
        }
        log::debug!("Coverage pass: {} samples per pixel", self.msaa_samples.len());
        for tri in draws {
            self.draw_primitive_msaa(tri);
        }
    }

    pub fn gbuffer_pass(&mut self, draws: &[DrawTriangle]) {
        log::debug!("G-buffer pass: {} triangles", draws.len());
        for tri in draws {
            self.draw_primitive_gbuffer(tri);
        }
    }

    pub fn forward_pass(&mut self, draws: &[DrawTriangle], image: &mut Image) -> usize {
        draws.iter().map(|tri| self.draw_primitive_shaded(tri, image)).sum()
    }

    /// Render the scene into `image`. The image is resized (and cleared to
    /// black) if it does not match the scene resolution.
    pub fn render(&mut self, image: &mut Image) -> RenderStats {
        self.render_with_progress(image, |_| {})
    }

    /// [`Rasterizer::render`], calling `on_pass` as each stage starts
    pub fn render_with_progress<F>(&mut self, image: &mut Image, mut on_pass: F) -> RenderStats
    where
        F: FnMut(RenderPass),
    {
        let (w, h) = (self.scene.width(), self.scene.height());
        if image.width() != w || image.height() != h {
            log::warn!(
                "Output image is {}x{}, scene is {}x{}; resizing",
                image.width(),
                image.height(),
                w,
                h
            );
            image.reset(w, h, Color::BLACK);
        }

        on_pass(RenderPass::Transform);
        self.init_zbuffer();
        self.init_msaa_mask();
        self.init_gbuffer();

        let (draws, culled) = self.build_draw_list();
        log::info!(
            "Rendering {} triangles at {}x{} ({:?}, {:?})",
            draws.len(),
            w,
            h,
            self.settings.shading,
            self.scene.anti_alias()
        );

        on_pass(RenderPass::Depth);
        self.depth_pass(&draws);
        on_pass(RenderPass::Coverage);
        self.coverage_pass(&draws);

        on_pass(RenderPass::Shading);
        let shaded_pixels = match self.settings.shading {
            ShadingPath::Deferred => {
                self.gbuffer_pass(&draws);
                self.shade_deferred(image)
            }
            ShadingPath::Forward => self.forward_pass(&draws, image),
        };
        log::debug!("Shaded {} pixels", shaded_pixels);

        RenderStats {
            triangles: draws.len(),
            culled,
            shaded_pixels,
        }
    }

    // ---- flat-color drawing ----

    /// Draw an untransformed triangle in a flat color.
    ///
    /// Without anti-aliasing the pixel center decides coverage. With SSAA (or
    /// MSAA, treated the same here) the pixel receives coverage * color,
    /// sampled with the configured pattern; uncovered pixels are left alone.
    pub fn draw_primitive_raw(&self, image: &mut Image, tri: &Triangle, mode: AntiAliasMode, color: Color) {
        draw_flat_triangle(image, tri, mode, self.settings.ssaa_pattern, color);
    }
}

/// Flat-color triangle drawing shared by [`Rasterizer::draw_primitive_raw`]
/// and callers without a scene
pub fn draw_flat_triangle(
    image: &mut Image,
    tri: &Triangle,
    mode: AntiAliasMode,
    pattern: SamplePattern,
    color: Color,
) {
    let rect = bounding_box(tri, image.width(), image.height());

    match mode {
        AntiAliasMode::None => {
            for (x, y) in rect.pixels() {
                let center = Vec2::new(x as f32, y as f32) + PIXEL_CENTER;
                if point_in_triangle(center, tri) {
                    image.set(x, y, color);
                }
            }
        }
        AntiAliasMode::Ssaa { .. } | AntiAliasMode::Msaa { .. } => {
            let mut sampler = SubpixelSampler::new(pattern, mode.samples());
            for (x, y) in rect.pixels() {
                let base = Vec2::new(x as f32, y as f32);
                let covered = coverage(base, sampler.next_offsets(), tri);
                if covered > 0.0 {
                    image.set(x, y, covered * color);
                }
            }
        }
    }
}
