//! Height and scalar (roughness, metallic) channel passes

use crate::channel_matrix::{ChannelMatrix, clamp01};
use crate::dab::RenderedDab;
use crate::raster::Raster;

/// Height deposited by a full-coverage dab at the given pressure
#[inline]
pub fn base_height(height_scale_mm: f32, height_creaminess: f32, pressure: f32) -> f32 {
    height_scale_mm * pressure.powf(height_creaminess)
}

/// Pull height toward the dab's base height, weighted by coverage
pub(crate) fn apply_height(raster: &mut Raster, dab: &RenderedDab, matrix: &ChannelMatrix, pressure: f32) {
    let target = base_height(matrix.height_scale_mm(), matrix.height_creaminess(), pressure);
    let opacity = matrix.opacity_height();
    let mut channels = Vec::with_capacity(raster.color_space().channel_count());

    dab.for_each_covered_pixel(raster.bounds(), |x, y, alpha| {
        let weight = clamp01(opacity * alpha);
        if weight > 0.0 {
            blend_pixel(raster, &mut channels, x, y, target, weight);
        }
    });
}

/// Pull a scalar channel toward `target`, weighted by raw coverage
pub(crate) fn apply_scalar(raster: &mut Raster, dab: &RenderedDab, target: f32) {
    let mut channels = Vec::with_capacity(raster.color_space().channel_count());

    dab.for_each_covered_pixel(raster.bounds(), |x, y, alpha| {
        if alpha > 0.0 {
            blend_pixel(raster, &mut channels, x, y, target, alpha);
        }
    });
}

/// Lerp the first channel toward `target` and grow coverage (second
/// channel) to at least `weight`
#[inline]
fn blend_pixel(raster: &mut Raster, channels: &mut Vec<f32>, x: i32, y: i32, target: f32, weight: f32) {
    if !raster.read_normalised(x, y, channels) {
        return;
    }
    let Some(value) = channels.first_mut() else {
        return;
    };
    *value += (target - *value) * weight;
    if let Some(coverage) = channels.get_mut(1) {
        *coverage = clamp01(coverage.max(weight));
    }
    raster.write_normalised(x, y, channels);
}
