//! Dab routing - drives one brush stroke into the material channels
//!
//! The router owns the current [`ChannelMatrix`] and a target
//! [`MaterialGroup`]. For every rendered dab it updates, in order, the
//! Height, Roughness, Metallic and Normal rasters of the group. Base color
//! is left to the regular paint path.

mod channels;
mod normal;

pub use channels::base_height;
pub use normal::{decode_normal, encode_normal, ensure_normalized, rnm_blend};

use tracing::{debug, trace};

use crate::channel_matrix::{ChannelMatrix, clamp01};
use crate::dab::RenderedDab;
use crate::material_group::MaterialGroup;
use crate::node::NodeTree;
use crate::types::{ChannelIndex, Rect};

/// Routes rendered dabs into the channel rasters of a material group
#[derive(Debug, Clone, Default)]
pub struct DabRouter {
    group: Option<MaterialGroup>,
    matrix: ChannelMatrix,
    stroke_active: bool,
}

impl DabRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matrix(matrix: ChannelMatrix) -> Self {
        Self {
            matrix,
            ..Self::default()
        }
    }

    pub fn set_target_group(&mut self, group: Option<MaterialGroup>) {
        self.group = group;
    }

    pub fn target_group(&self) -> Option<MaterialGroup> {
        self.group
    }

    pub fn set_channel_matrix(&mut self, matrix: ChannelMatrix) {
        self.matrix = matrix;
    }

    pub fn channel_matrix(&self) -> ChannelMatrix {
        self.matrix
    }

    pub fn is_stroke_active(&self) -> bool {
        self.stroke_active
    }

    /// Start a stroke and make sure the target group has all its channels
    pub fn begin_stroke(&mut self, tree: &mut NodeTree) {
        self.stroke_active = true;
        if let Some(group) = self.group {
            group.ensure_channel_children(tree);
        }
        debug!("begin_stroke: target={:?}", self.group.map(|g| g.node()));
    }

    pub fn end_stroke(&mut self) {
        self.stroke_active = false;
        debug!("end_stroke");
    }

    /// Apply `dabs` in order to the target group's channel rasters.
    ///
    /// `apply_rect` is the engine's dirty rectangle for the batch; writes
    /// are bounded by each dab's own placement instead.
    pub fn apply_dabs(&mut self, tree: &mut NodeTree, apply_rect: Rect, dabs: &[RenderedDab]) {
        let Some(group) = self.group else {
            trace!("apply_dabs: no target group");
            return;
        };
        if dabs.is_empty() {
            return;
        }
        self.stroke_active = true;
        group.ensure_channel_children(tree);

        debug!(
            "apply_dabs: {} dabs, rect=({}, {}) {}x{}",
            dabs.len(),
            apply_rect.x,
            apply_rect.y,
            apply_rect.width,
            apply_rect.height
        );

        // Channels backed by something other than a paint layer are skipped
        let raster_layer = |channel: ChannelIndex| {
            group
                .channel_layer(tree, channel)
                .filter(|&id| tree.raster(id).is_some())
        };
        let height = raster_layer(ChannelIndex::Height);
        let normal = raster_layer(ChannelIndex::Normal);
        let roughness = raster_layer(ChannelIndex::Roughness);
        let metallic = raster_layer(ChannelIndex::Metallic);

        let matrix = self.matrix;
        for dab in dabs {
            if dab.is_empty() {
                trace!("  skipping empty dab at ({}, {})", dab.x(), dab.y());
                continue;
            }
            let pressure = clamp01(dab.opacity());
            trace!(
                "  dab at ({}, {}) {}x{}, pressure={:.2}",
                dab.x(),
                dab.y(),
                dab.raster().width(),
                dab.raster().height(),
                pressure
            );

            if matrix.affect_height() {
                if let Some(raster) = height.and_then(|id| tree.raster_mut(id)) {
                    channels::apply_height(raster, dab, &matrix, pressure);
                }
            }

            if matrix.affect_roughness() {
                if let Some(raster) = roughness.and_then(|id| tree.raster_mut(id)) {
                    channels::apply_scalar(raster, dab, clamp01(matrix.roughness_value()));
                }
            }

            if matrix.affect_metallic() {
                if let Some(raster) = metallic.and_then(|id| tree.raster_mut(id)) {
                    channels::apply_scalar(raster, dab, clamp01(matrix.metallic_value()));
                }
            }

            if matrix.affect_normal() {
                if let (Some(height), Some(normal)) = (height, normal) {
                    match tree.raster_pair_mut(height, normal) {
                        Ok((height, normal)) => normal::apply_normal(height, normal, dab, &matrix),
                        Err(err) => debug!("  normal pass skipped: {}", err),
                    }
                }
            }
        }
    }
}
