//! Per-pixel grids: output image, Z-buffer, coverage mask and G-buffer

use std::path::Path;

use super::math::Vec3;
use super::types::Color;
use crate::error::{RasterError, Result};

/// Dense 2D grid addressed by (x, y), row-major
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> PixelBuffer<T> {
    pub fn new(width: usize, height: usize, default: T) -> Self {
        Self {
            width,
            height,
            cells: vec![default; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Cell at (x, y), or None outside the grid
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if self.in_bounds(x, y) {
            Some(&self.cells[y * self.width + x])
        } else {
            None
        }
    }

    /// Overwrite the cell at (x, y). Writes outside the grid are dropped.
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        debug_assert!(
            self.in_bounds(x, y),
            "pixel ({}, {}) outside {}x{} buffer",
            x,
            y,
            self.width,
            self.height
        );
        if self.in_bounds(x, y) {
            self.cells[y * self.width + x] = value;
        }
    }

    /// Resize to `width` x `height` and reset every cell to `value`
    pub fn reset(&mut self, width: usize, height: usize, value: T) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells.resize(width * height, value);
    }

    /// Cells in row-major order
    pub fn cells(&self) -> &[T] {
        &self.cells
    }
}

/// RGBA output or texture image
pub type Image = PixelBuffer<Color>;

/// Z-buffer cell: resolved depth and the draw id of the triangle that owns it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthSample {
    pub depth: f32,
    pub owner: Option<u32>,
}

impl DepthSample {
    pub fn empty(depth_far: f32) -> Self {
        Self { depth: depth_far, owner: None }
    }
}

pub type ZBuffer = PixelBuffer<DepthSample>;

/// Fraction of sub-pixel samples covered by the owning triangle
pub type CoverageMask = PixelBuffer<f32>;

/// Surface attributes captured for deferred shading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GSample {
    /// World-space unit normal
    pub normal: Vec3,
    /// World-space position
    pub pos: Vec3,
    /// Sampled texture color, white when untextured
    pub texel: Color,
}

/// `None` means no surface is visible at the pixel
pub type GBuffer = PixelBuffer<Option<GSample>>;

impl Image {
    /// Decode a raster file (PNG, JPEG or BMP)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| RasterError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_dynamic(img)
    }

    /// Decode an in-memory encoded image
    pub fn from_encoded(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes).map_err(|source| RasterError::Decode {
            path: "<memory>".into(),
            source,
        })?;
        Self::from_dynamic(img)
    }

    fn from_dynamic(img: image::DynamicImage) -> Result<Self> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyImage);
        }

        let cells: Vec<Color> = rgba.pixels().map(|p| Color::from_bytes(p.0)).collect();

        Ok(Self {
            width: width as usize,
            height: height as usize,
            cells,
        })
    }

    /// Encode to a file; the format follows the extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut bytes = Vec::with_capacity(self.cells.len() * 4);
        for c in &self.cells {
            bytes.extend_from_slice(&c.to_bytes());
        }

        let rgba = image::RgbaImage::from_raw(self.width as u32, self.height as u32, bytes)
            .ok_or(RasterError::EmptyImage)?;
        rgba.save(path).map_err(|source| RasterError::Encode {
            path: path.to_path_buf(),
            source,
        })
    }
}
