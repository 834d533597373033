//! Mip-map chain construction and nearest-level texture sampling

use std::path::Path;

use super::buffer::Image;
use super::math::Vec2;
use super::types::Color;
use crate::error::Result;

/// Progressively box-filtered copies of a texture. Level 0 is the source at
/// full resolution; each further level halves both dimensions.
#[derive(Debug, Clone)]
pub struct MipChain {
    levels: Vec<Image>,
}

impl MipChain {
    /// Load a texture and build its chain
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let base = Image::load(path)?;
        log::debug!("Loaded texture {} ({}x{})", path.display(), base.width(), base.height());
        Ok(Self::build(base))
    }

    /// Build the chain from a base image.
    ///
    /// Adds floor(log2(min(width, height))) levels after the base, so the
    /// smallest level is one texel along its shorter side.
    pub fn build(base: Image) -> Self {
        let shortest = base.width().min(base.height());
        let extra = if shortest == 0 { 0 } else { shortest.ilog2() as usize };

        let mut levels = Vec::with_capacity(extra + 1);
        levels.push(base);
        for _ in 0..extra {
            let next = downsample(&levels[levels.len() - 1]);
            levels.push(next);
        }

        log::debug!(
            "Built mip chain: {} levels, {}x{} down to {}x{}",
            levels.len(),
            levels[0].width(),
            levels[0].height(),
            levels[levels.len() - 1].width(),
            levels[levels.len() - 1].height()
        );
        Self { levels }
    }

    pub fn levels(&self) -> &[Image] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level index for a normalized depth in [-1, 1]:
    /// floor(len * (1 + depth) / 2), clamped to the chain
    pub fn level_for_depth(&self, depth: f32) -> usize {
        let raw = self.levels.len() as f32 * (1.0 + depth) / 2.0;
        // NaN and negatives saturate to 0
        (raw.floor() as usize).min(self.levels.len().saturating_sub(1))
    }

    /// Nearest texel from the level picked by `depth`. UVs are clamped to [0, 1].
    pub fn get_texel(&self, uv: Vec2, depth: f32) -> Color {
        let Some(level) = self.levels.get(self.level_for_depth(depth)) else {
            return Color::WHITE;
        };
        let tx = texel_index(uv.x, level.width());
        let ty = texel_index(uv.y, level.height());
        level.get(tx, ty).copied().unwrap_or(Color::WHITE)
    }
}

fn texel_index(t: f32, size: usize) -> usize {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    ((t * size as f32) as usize).min(size.saturating_sub(1))
}

/// Average each 2x2 block, halving both dimensions
fn downsample(src: &Image) -> Image {
    let width = src.width() / 2;
    let height = src.height() / 2;
    let mut dst = Image::new(width, height, Color::default());

    let texel = |x: usize, y: usize| src.get(x, y).copied().unwrap_or_default();
    for y in 0..height {
        for x in 0..width {
            let block = [
                texel(2 * x, 2 * y),
                texel(2 * x + 1, 2 * y),
                texel(2 * x, 2 * y + 1),
                texel(2 * x + 1, 2 * y + 1),
            ];
            dst.set(x, y, box_average(&block));
        }
    }
    dst
}

fn box_average(block: &[Color; 4]) -> Color {
    let sum = block.iter().fold([0.0f32; 4], |acc, c| {
        [acc[0] + c.r, acc[1] + c.g, acc[2] + c.b, acc[3] + c.a]
    });
    Color::with_alpha(sum[0] / 4.0, sum[1] / 4.0, sum[2] / 4.0, sum[3] / 4.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: usize, height: usize, a: Color, b: Color) -> Image {
        let mut img = Image::new(width, height, a);
        for y in 0..height {
            for x in 0..width {
                if (x + y) % 2 == 1 {
                    img.set(x, y, b);
                }
            }
        }
        img
    }

    #[test]
    fn test_level_zero_is_source() {
        let src = checkerboard(8, 8, Color::RED, Color::BLUE);
        let chain = MipChain::build(src.clone());
        assert_eq!(chain.levels()[0], src);
    }

    #[test]
    fn test_dimensions_halve() {
        let chain = MipChain::build(Image::new(16, 8, Color::WHITE));
        // 8 is the shorter side: 3 extra levels
        let dims: Vec<_> = chain.levels().iter().map(|l| (l.width(), l.height())).collect();
        assert_eq!(dims, vec![(16, 8), (8, 4), (4, 2), (2, 1)]);
    }

    #[test]
    fn test_odd_dimensions_floor() {
        let chain = MipChain::build(Image::new(7, 5, Color::WHITE));
        let dims: Vec<_> = chain.levels().iter().map(|l| (l.width(), l.height())).collect();
        assert_eq!(dims, vec![(7, 5), (3, 2), (1, 1)]);
    }

    #[test]
    fn test_solid_texture_stays_solid() {
        let solid = Color::with_alpha(0.2, 0.4, 0.6, 0.8);
        let chain = MipChain::build(Image::new(32, 32, solid));
        for level in chain.levels() {
            assert!(level.cells().iter().all(|c| c.distance(solid) < 1e-6));
        }
    }

    #[test]
    fn test_checkerboard_averages_to_grey() {
        let chain = MipChain::build(checkerboard(4, 4, Color::BLACK, Color::WHITE));
        let grey = Color::new(0.5, 0.5, 0.5);
        assert!(chain.levels()[1].cells().iter().all(|c| c.distance(grey) < 1e-6));
    }

    #[test]
    fn test_level_selection_follows_depth() {
        let chain = MipChain::build(Image::new(8, 8, Color::WHITE));
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.level_for_depth(-1.0), 0);
        assert_eq!(chain.level_for_depth(0.0), 2);
        assert_eq!(chain.level_for_depth(1.0), 3);
        assert_eq!(chain.level_for_depth(5.0), 3);
        assert_eq!(chain.level_for_depth(f32::NAN), 0);
    }

    #[test]
    fn test_get_texel_picks_nearest_and_clamps() {
        let mut base = Image::new(2, 2, Color::BLACK);
        base.set(1, 0, Color::RED);
        base.set(0, 1, Color::GREEN);
        let chain = MipChain::build(base);

        assert_eq!(chain.get_texel(Vec2::new(0.75, 0.25), -1.0), Color::RED);
        assert_eq!(chain.get_texel(Vec2::new(0.25, 0.75), -1.0), Color::GREEN);
        assert_eq!(chain.get_texel(Vec2::new(1.0, -3.0), -1.0), Color::RED);
        assert_eq!(chain.get_texel(Vec2::new(0.25, 0.25), -1.0), Color::BLACK);
    }
}
