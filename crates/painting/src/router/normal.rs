//! Normal reconstruction from height and reoriented normal mapping (RNM)

use glam::{Vec2, Vec3};

use crate::channel_matrix::{ChannelMatrix, clamp01};
use crate::dab::RenderedDab;
use crate::raster::Raster;

/// Unit-length `v`, or +Z when `v` is zero or not finite
#[inline]
pub fn ensure_normalized(v: Vec3) -> Vec3 {
    v.try_normalize().unwrap_or(Vec3::Z)
}

/// Decode normalised channel values (`0.5 * (n + 1)` per component)
pub fn decode_normal(values: &[f32]) -> Vec3 {
    let component = |i: usize| values.get(i).copied().unwrap_or(0.0) * 2.0 - 1.0;
    ensure_normalized(Vec3::new(component(0), component(1), component(2)))
}

/// Encode `normal` into normalised channel values, alpha forced opaque.
///
/// `out` is grown to at least three entries.
pub fn encode_normal(normal: Vec3, out: &mut Vec<f32>) {
    let n = ensure_normalized(normal);
    if out.len() < 3 {
        out.resize(3, 0.0);
    }
    out[0] = clamp01(0.5 * (n.x + 1.0));
    out[1] = clamp01(0.5 * (n.y + 1.0));
    out[2] = clamp01(0.5 * (n.z + 1.0));
    if let Some(alpha) = out.get_mut(3) {
        *alpha = 1.0;
    }
}

/// Reoriented normal mapping: perturb `base` by `detail` as if `detail`
/// were expressed in `base`'s tangent frame
pub fn rnm_blend(base: Vec3, detail: Vec3) -> Vec3 {
    let base = ensure_normalized(base);
    let detail = ensure_normalized(detail);
    let base_xy = Vec2::new(base.x, base.y);
    let detail_xy = Vec2::new(detail.x, detail.y);

    let blended = Vec3::new(
        base_xy.x * detail.z + detail_xy.x * base.z,
        base_xy.y * detail.z + detail_xy.y * base.z,
        base.z * detail.z - base_xy.dot(detail_xy),
    );
    ensure_normalized(blended)
}

/// First channel of the height raster; 0 outside it
#[inline]
fn sample_height(height: &Raster, scratch: &mut Vec<f32>, x: i32, y: i32) -> f32 {
    if height.read_normalised(x, y, scratch) {
        scratch.first().copied().unwrap_or(0.0)
    } else {
        0.0
    }
}

/// Blend a detail normal derived from the height gradient into the normal
/// raster under the dab
pub(crate) fn apply_normal(height: &Raster, normal: &mut Raster, dab: &RenderedDab, matrix: &ChannelMatrix) {
    let strength = matrix.normal_strength();
    let gradient_scale = strength.max(0.0);
    let mut height_scratch = Vec::with_capacity(height.color_space().channel_count());
    let mut normal_channels = Vec::with_capacity(normal.color_space().channel_count());

    dab.for_each_covered_pixel(normal.bounds(), |x, y, alpha| {
        let weight = clamp01(strength * alpha);
        if weight <= 0.0 {
            return;
        }

        let left = sample_height(height, &mut height_scratch, x - 1, y);
        let right = sample_height(height, &mut height_scratch, x + 1, y);
        let up = sample_height(height, &mut height_scratch, x, y - 1);
        let down = sample_height(height, &mut height_scratch, x, y + 1);

        let dx = (right - left) * 0.5 * gradient_scale;
        let dy = (down - up) * 0.5 * gradient_scale;
        let detail = ensure_normalized(Vec3::new(-dx, -dy, 1.0));

        if !normal.read_normalised(x, y, &mut normal_channels) {
            return;
        }
        let base = decode_normal(&normal_channels);
        let combined = rnm_blend(base, detail);
        let blended = ensure_normalized(base * (1.0 - weight) + combined * weight);

        encode_normal(blended, &mut normal_channels);
        normal.write_normalised(x, y, &normal_channels);
    });
}
