//! Point-in-triangle and barycentric tests on the screen-space projection

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::math::{Vec2, Vec3};
use super::types::{SamplePattern, Triangle};

/// Offset from a pixel's corner to its center
pub const PIXEL_CENTER: Vec2 = Vec2 { x: 0.5, y: 0.5 };

/// Twice-area below which a triangle is treated as degenerate
const DEGENERATE_AREA: f32 = 1e-6;

/// Strict-interior test against the xy projection of `tri`.
///
/// Inside iff all three edge cross products (p - v_i) x (v_{i+1} - v_i)
/// share the same strict sign, for either winding. Points on an edge are
/// outside, so triangles sharing an edge never both claim a sample on it.
pub fn point_in_triangle(p: Vec2, tri: &Triangle) -> bool {
    let [a, b, c] = tri.screen_points();
    let s1 = (p - a).perp_dot(b - a);
    let s2 = (p - b).perp_dot(c - b);
    let s3 = (p - c).perp_dot(a - c);

    (s1 > 0.0 && s2 > 0.0 && s3 > 0.0) || (s1 < 0.0 && s2 < 0.0 && s3 < 0.0)
}

/// Barycentric weights of `p` with respect to the xy projection of `tri`.
///
/// The weights sum to 1; any negative weight means `p` lies outside.
/// Returns `None` for a degenerate (zero-area) triangle.
pub fn barycentric(p: Vec2, tri: &Triangle) -> Option<Vec3> {
    let [v1, v2, v3] = tri.screen_points();
    let d = (v2.y - v3.y) * (v1.x - v3.x) + (v3.x - v2.x) * (v1.y - v3.y);

    if d.is_nan() || d.abs() < DEGENERATE_AREA {
        return None;
    }

    let u = ((v2.y - v3.y) * (p.x - v3.x) + (v3.x - v2.x) * (p.y - v3.y)) / d;
    let v = ((v3.y - v1.y) * (p.x - v3.x) + (v1.x - v3.x) * (p.y - v3.y)) / d;
    let w = 1.0 - u - v;

    Some(Vec3::new(u, v, w))
}

/// Inclusive inside test on barycentric weights
pub fn weights_inside(bc: Vec3) -> bool {
    bc.x >= 0.0 && bc.y >= 0.0 && bc.z >= 0.0
}

/// Pixel-aligned rectangle, `x0..x1` by `y0..y1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Pixels in row-major order
    pub fn pixels(self) -> impl Iterator<Item = (usize, usize)> {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| (x, y)))
    }
}

/// Screen-space bounding box of `tri`, clipped to a `width` x `height` image
pub fn bounding_box(tri: &Triangle, width: usize, height: usize) -> PixelRect {
    let [a, b, c] = tri.screen_points();
    let min_x = a.x.min(b.x).min(c.x).max(0.0) as usize;
    let max_x = (a.x.max(b.x).max(c.x) + 1.0).min(width as f32) as usize;
    let min_y = a.y.min(b.y).min(c.y).max(0.0) as usize;
    let max_y = (a.y.max(b.y).max(c.y) + 1.0).min(height as f32) as usize;

    PixelRect {
        x0: min_x,
        y0: min_y,
        x1: max_x,
        y1: max_y,
    }
}

/// Side length of the square grid used for `samples` samples per pixel
pub fn grid_side(samples: u32) -> u32 {
    ((samples.max(1) as f32).sqrt().round() as u32).max(1)
}

/// Evenly spaced sample offsets inside the unit pixel, row-major.
///
/// `samples` is rounded to the nearest square count.
pub fn grid_offsets(samples: u32) -> Vec<Vec2> {
    let side = grid_side(samples);
    if side * side != samples {
        log::warn!(
            "{} samples per pixel is not a square count, using a {}x{} grid",
            samples,
            side,
            side
        );
    }

    let step = 1.0 / side as f32;
    (0..side)
        .flat_map(|j| (0..side).map(move |i| Vec2::new((i as f32 + 0.5) * step, (j as f32 + 0.5) * step)))
        .collect()
}

/// Exactly `samples` stratified offsets inside the unit pixel.
///
/// Rows of at most `ceil(sqrt(samples))` points each, evenly spaced; a short
/// last row is spread across the full pixel width. Square counts give the
/// same layout as [`grid_offsets`].
pub fn stratified_offsets(samples: u32) -> Vec<Vec2> {
    let samples = samples.max(1);
    let per_row = (samples as f32).sqrt().ceil() as u32;
    let rows = (samples + per_row - 1) / per_row;
    let row_step = 1.0 / rows as f32;

    (0..rows)
        .flat_map(|j| {
            let count = per_row.min(samples - j * per_row);
            let step = 1.0 / count as f32;
            let y = (j as f32 + 0.5) * row_step;
            (0..count).map(move |i| Vec2::new((i as f32 + 0.5) * step, y))
        })
        .collect()
}

/// Fraction of `offsets` (relative to the pixel corner `base`) strictly inside `tri`
pub fn coverage(base: Vec2, offsets: &[Vec2], tri: &Triangle) -> f32 {
    if offsets.is_empty() {
        return 0.0;
    }
    let inside = offsets
        .iter()
        .filter(|&&o| point_in_triangle(base + o, tri))
        .count();
    inside as f32 / offsets.len() as f32
}

/// Produces supersampling offsets per pixel.
///
/// The jittered pattern draws fresh offsets for every pixel from one seeded
/// generator, so a render is reproducible for a given seed.
pub struct SubpixelSampler {
    grid: Vec<Vec2>,
    rng: Option<ChaCha8Rng>,
    samples: usize,
    scratch: Vec<Vec2>,
}

impl SubpixelSampler {
    pub fn new(pattern: SamplePattern, samples: u32) -> Self {
        let samples = samples.max(1);
        match pattern {
            SamplePattern::Grid => {
                let grid = stratified_offsets(samples);
                Self {
                    samples: grid.len(),
                    grid,
                    rng: None,
                    scratch: Vec::new(),
                }
            }
            SamplePattern::Jittered { seed } => Self {
                grid: Vec::new(),
                rng: Some(ChaCha8Rng::seed_from_u64(seed)),
                samples: samples as usize,
                scratch: Vec::with_capacity(samples as usize),
            },
        }
    }

    /// Samples taken per pixel
    pub fn len(&self) -> usize {
        self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Offsets for the next pixel
    pub fn next_offsets(&mut self) -> &[Vec2] {
        match self.rng.as_mut() {
            None => &self.grid,
            Some(rng) => {
                self.scratch.clear();
                for _ in 0..self.samples {
                    self.scratch.push(Vec2::new(rng.gen::<f32>(), rng.gen::<f32>()));
                }
                &self.scratch
            }
        }
    }
}
