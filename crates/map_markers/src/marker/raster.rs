//! Decoded raster marker bitmaps.
use crate::error::{Error, Result};
use crate::symbolizer::Color;

/// An RGBA8 bitmap stored row-major, top row first, straight alpha.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl RasterImage {
    /// Wraps decoded pixels. Fails if the buffer does not match the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Result<Self> {
        let expected = (width as usize) * (height as usize);
        if pixels.len() != expected {
            return Err(Error::InvalidConfig(format!(
                "raster of {width}x{height} needs {expected} pixels, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A bitmap filled with one color.
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pixels: vec![[color.r, color.g, color.b, color.a]; len],
        }
    }

    /// Interleaved RGBA bytes, as produced by most image decoders.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(Error::InvalidConfig(
                "RGBA byte buffer length must be a multiple of 4".into(),
            ));
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    /// Pixel at integer coordinates, `None` outside the bitmap.
    pub fn pixel(&self, x: i64, y: i64) -> Option<[u8; 4]> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.pixels[(y as usize) * (self.width as usize) + (x as usize)])
    }
}
