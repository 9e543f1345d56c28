//! Channel rasters - fixed-size pixel storage with an injected color space

mod access;
mod dirty_tracking;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use impasto_config::DEFAULT_TILE_SIZE;

use crate::color_space::ColorSpace;
use crate::types::{Rect, TileCoord};

/// Errors raised when constructing a raster from existing pixel data
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("Pixel data is {actual} bytes, expected {expected} for {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid tile size: {0}")]
    InvalidTileSize(u32),
}

/// A pixel buffer anchored at the origin.
///
/// Pixels are stored row-major in the encoding of the raster's color space.
/// Every write through the normalised accessors marks the containing tile
/// dirty so hosts can upload incrementally.
#[derive(Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    color_space: Arc<dyn ColorSpace>,
    data: Vec<u8>,
    pub(crate) tile_size: u32,
    pub(crate) dirty_tiles: HashSet<TileCoord>,
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("color_space", &self.color_space.id())
            .field("dirty_tiles", &self.dirty_tiles.len())
            .finish()
    }
}

impl Raster {
    /// Create a raster with all bytes zeroed (fully transparent)
    pub fn new(width: u32, height: u32, color_space: Arc<dyn ColorSpace>) -> Self {
        let len = Self::byte_len(width, height, color_space.as_ref());
        Self {
            width,
            height,
            color_space,
            data: vec![0; len],
            tile_size: DEFAULT_TILE_SIZE,
            dirty_tiles: HashSet::new(),
        }
    }

    /// Wrap existing encoded pixel data
    pub fn from_bytes(
        width: u32,
        height: u32,
        color_space: Arc<dyn ColorSpace>,
        data: Vec<u8>,
    ) -> Result<Self, RasterError> {
        let expected = Self::byte_len(width, height, color_space.as_ref());
        if data.len() != expected {
            return Err(RasterError::SizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            color_space,
            data,
            tile_size: DEFAULT_TILE_SIZE,
            dirty_tiles: HashSet::new(),
        })
    }

    /// Copy typed pixels (e.g. `[u8; 4]` or `[half::f16; 2]`) into a raster
    pub fn from_pixels<P: bytemuck::Pod>(
        width: u32,
        height: u32,
        color_space: Arc<dyn ColorSpace>,
        pixels: &[P],
    ) -> Result<Self, RasterError> {
        Self::from_bytes(width, height, color_space, bytemuck::cast_slice(pixels).to_vec())
    }

    /// Change the tile size used for dirty tracking
    pub fn with_tile_size(mut self, tile_size: u32) -> Result<Self, RasterError> {
        if tile_size == 0 {
            return Err(RasterError::InvalidTileSize(tile_size));
        }
        self.tile_size = tile_size;
        self.dirty_tiles.clear();
        Ok(self)
    }

    fn byte_len(width: u32, height: u32, color_space: &dyn ColorSpace) -> usize {
        (width as usize) * (height as usize) * color_space.pixel_size()
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel extent of the raster
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    #[inline]
    pub fn color_space(&self) -> &Arc<dyn ColorSpace> {
        &self.color_space
    }

    #[inline]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Get the total number of pixels
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Raw encoded pixel data for upload
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Typed view of the pixel data, None if `P` does not match the layout
    pub fn pixels<P: bytemuck::Pod>(&self) -> Option<&[P]> {
        bytemuck::try_cast_slice(&self.data).ok()
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        Some(index * self.color_space.pixel_size())
    }

    /// Encoded bytes of one pixel, None if out of bounds
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<&[u8]> {
        let offset = self.offset(x, y)?;
        self.data.get(offset..offset + self.color_space.pixel_size())
    }

    /// Mutable encoded bytes of one pixel.
    ///
    /// Writes through this accessor are not dirty-tracked.
    #[inline]
    pub fn pixel_mut(&mut self, x: i32, y: i32) -> Option<&mut [u8]> {
        let offset = self.offset(x, y)?;
        let size = self.color_space.pixel_size();
        self.data.get_mut(offset..offset + size)
    }
}
