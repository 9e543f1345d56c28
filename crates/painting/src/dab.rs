//! Rendered dabs - brush footprints handed over by the brush engine
//!
//! A dab is a small raster placed at an offset on the canvas. Only its
//! per-pixel opacity is used for routing, so any color space works.

use tracing::trace;

use crate::color_space::PixelFormat;
use crate::raster::{Raster, RasterError};
use crate::types::Rect;

/// Falloff from the dab center (0) to its edge (1).
/// `hardness` 0 is a linear ramp, 1 a hard edge.
#[inline]
pub fn hardness_falloff(distance_normalized: f32, hardness: f32) -> f32 {
    if distance_normalized > 1.0 {
        return 0.0;
    }
    let hardness = hardness.clamp(0.0, 1.0);
    let soft = 1.0 - distance_normalized.max(0.0);
    soft * (1.0 - hardness) + hardness
}

/// A dab rendered into its own raster, placed at (`x`, `y`) on the canvas
#[derive(Debug, Clone)]
pub struct RenderedDab {
    raster: Raster,
    x: i32,
    y: i32,
    opacity: f32,
}

impl RenderedDab {
    /// `opacity` is the stroke pressure/opacity for this dab
    pub fn new(raster: Raster, x: i32, y: i32, opacity: f32) -> Self {
        Self {
            raster,
            x,
            y,
            opacity,
        }
    }

    /// Build an 8-bit alpha dab from row-major coverage values in [0, 1]
    pub fn from_alpha_mask(
        width: u32,
        height: u32,
        mask: &[f32],
        x: i32,
        y: i32,
        opacity: f32,
    ) -> Result<Self, RasterError> {
        let bytes: Vec<u8> = mask
            .iter()
            .map(|&alpha| (alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();
        let raster = Raster::from_bytes(width, height, PixelFormat::Alpha8.color_space(), bytes)?;
        Ok(Self::new(raster, x, y, opacity))
    }

    /// Rasterize a round dab centered at (`center_x`, `center_y`) in
    /// canvas pixels
    pub fn round(center_x: f32, center_y: f32, radius: f32, hardness: f32, opacity: f32) -> Self {
        let color_space = PixelFormat::Alpha8.color_space();
        if radius <= 0.0 {
            return Self::new(Raster::new(0, 0, color_space), center_x as i32, center_y as i32, opacity);
        }

        let x_min = (center_x - radius).floor() as i32;
        let y_min = (center_y - radius).floor() as i32;
        let x_max = (center_x + radius).ceil() as i32;
        let y_max = (center_y + radius).ceil() as i32;
        let width = (x_max - x_min).max(0) as u32;
        let height = (y_max - y_min).max(0) as u32;

        let mut raster = Raster::new(width, height, color_space);
        for py in 0..height as i32 {
            for px in 0..width as i32 {
                // Sample at pixel centers
                let dx = (x_min + px) as f32 + 0.5 - center_x;
                let dy = (y_min + py) as f32 + 0.5 - center_y;
                let distance = (dx * dx + dy * dy).sqrt() / radius;
                let falloff = hardness_falloff(distance, hardness);
                if falloff > 0.0 {
                    raster.write_normalised(px, py, &[falloff]);
                }
            }
        }
        raster.take_dirty_tiles();
        trace!(
            "Rasterized round dab at ({:.1}, {:.1}) r={:.1} into {}x{}",
            center_x, center_y, radius, width, height
        );
        Self::new(raster, x_min, y_min, opacity)
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Placement rectangle on the canvas
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x,
            self.y,
            self.raster.width() as i32,
            self.raster.height() as i32,
        )
    }

    /// Zero-sized, or in a color space without channels
    pub fn is_empty(&self) -> bool {
        self.bounds().is_empty() || self.raster.color_space().channel_count() == 0
    }

    /// Coverage at a canvas position; 0 outside the dab
    pub fn alpha_at(&self, canvas_x: i32, canvas_y: i32) -> f32 {
        let (Some(x), Some(y)) = (canvas_x.checked_sub(self.x), canvas_y.checked_sub(self.y)) else {
            return 0.0;
        };
        self.raster.opacity_at(x, y).unwrap_or(0.0)
    }

    /// Visit every canvas pixel the dab covers inside `target`, passing the
    /// canvas coordinates and the coverage there
    pub(crate) fn for_each_covered_pixel(&self, target: Rect, mut visit: impl FnMut(i32, i32, f32)) {
        let Some(area) = self.bounds().intersect(&target) else {
            return;
        };
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                visit(x, y, self.alpha_at(x, y));
            }
        }
    }
}
