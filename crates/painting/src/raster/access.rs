//! Normalised pixel access through the raster's color space

use super::Raster;
use crate::types::Rect;

impl Raster {
    /// Decode a pixel into `out`. Returns false (and leaves `out` empty)
    /// when the coordinates are outside the raster.
    pub fn read_normalised(&self, x: i32, y: i32, out: &mut Vec<f32>) -> bool {
        match self.pixel(x, y) {
            Some(pixel) => {
                self.color_space.normalised_channels(pixel, out);
                true
            }
            None => {
                out.clear();
                false
            }
        }
    }

    /// Encode `values` into a pixel and mark its tile dirty.
    /// Returns false when the coordinates are outside the raster.
    pub fn write_normalised(&mut self, x: i32, y: i32, values: &[f32]) -> bool {
        let color_space = self.color_space.clone();
        let Some(pixel) = self.pixel_mut(x, y) else {
            return false;
        };
        color_space.from_normalised_channels(values, pixel);
        self.mark_rect_dirty(Rect::new(x, y, 1, 1));
        true
    }

    /// Opacity of a pixel, None if out of bounds
    #[inline]
    pub fn opacity_at(&self, x: i32, y: i32) -> Option<f32> {
        self.pixel(x, y).map(|pixel| self.color_space.opacity(pixel))
    }

    /// Fill every pixel with the same normalised value and mark all tiles dirty
    pub fn fill_normalised(&mut self, values: &[f32]) {
        let pixel_size = self.color_space.pixel_size();
        if pixel_size == 0 {
            return;
        }
        let mut encoded = vec![0u8; pixel_size];
        self.color_space.from_normalised_channels(values, &mut encoded);
        for pixel in self.data.chunks_exact_mut(pixel_size) {
            pixel.copy_from_slice(&encoded);
        }
        self.mark_rect_dirty(self.bounds());
    }
}
