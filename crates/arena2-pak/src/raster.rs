//! Fixed-size indexed-colour raster.

use crate::{Error, Result};

/// Raster width in pixels.
pub const PAK_WIDTH: usize = 1001;

/// Raster height in pixels.
pub const PAK_HEIGHT: usize = 500;

/// A 1001×500 indexed-colour raster, stored row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct PakRaster {
    pixels: Vec<u8>,
}

impl PakRaster {
    /// Total number of pixels.
    pub const LEN: usize = PAK_WIDTH * PAK_HEIGHT;

    /// Wrap a pixel buffer of exactly [`PakRaster::LEN`] bytes.
    pub fn new(pixels: Vec<u8>) -> Result<Self> {
        if pixels.len() != Self::LEN {
            return Err(Error::InvalidRasterSize {
                expected: Self::LEN,
                actual: pixels.len(),
            });
        }
        Ok(Self { pixels })
    }

    /// A raster filled with index 0.
    pub fn blank() -> Self {
        Self {
            pixels: vec![0; Self::LEN],
        }
    }

    #[inline]
    pub const fn width(&self) -> usize {
        PAK_WIDTH
    }

    #[inline]
    pub const fn height(&self) -> usize {
        PAK_HEIGHT
    }

    /// Pixel value at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= PAK_WIDTH || y >= PAK_HEIGHT {
            return None;
        }
        Some(self.pixels[y * PAK_WIDTH + x])
    }

    /// Set the pixel at `(x, y)`. Out-of-range coordinates are ignored.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < PAK_WIDTH && y < PAK_HEIGHT {
            self.pixels[y * PAK_WIDTH + x] = value;
        }
    }

    /// One row of pixels.
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.pixels[y * PAK_WIDTH..(y + 1) * PAK_WIDTH]
    }

    /// All pixels, row-major.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume the raster and return its pixels.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

impl std::fmt::Debug for PakRaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PakRaster")
            .field("width", &PAK_WIDTH)
            .field("height", &PAK_HEIGHT)
            .finish()
    }
}
