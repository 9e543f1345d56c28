//! Tiles touched since the host last collected them

use tracing::trace;

use super::Raster;
use crate::types::{Rect, TileCoord};

impl Raster {
    /// Record every tile overlapping `rect`; the part outside the raster is
    /// ignored.
    pub(crate) fn mark_rect_dirty(&mut self, rect: Rect) {
        let Some(area) = rect.intersect(&self.bounds()) else {
            return;
        };
        // Intersected with bounds, so the corners are non-negative
        let tile = self.tile_size;
        let first = TileCoord {
            x: area.x as u32 / tile,
            y: area.y as u32 / tile,
        };
        let last = TileCoord {
            x: (area.right() - 1) as u32 / tile,
            y: (area.bottom() - 1) as u32 / tile,
        };

        self.dirty_tiles.extend(
            (first.y..=last.y).flat_map(|y| (first.x..=last.x).map(move |x| TileCoord { x, y })),
        );
        if area.width > 1 || area.height > 1 {
            trace!(
                "Tiles ({}, {})..=({}, {}) dirty, {} pending",
                first.x,
                first.y,
                last.x,
                last.y,
                self.dirty_tiles.len()
            );
        }
    }

    /// Hand over the dirty tiles in row-major order and start afresh
    pub fn take_dirty_tiles(&mut self) -> Vec<TileCoord> {
        let mut tiles: Vec<TileCoord> = self.dirty_tiles.drain().collect();
        tiles.sort_by_key(|tile| (tile.y, tile.x));
        tiles
    }

    #[inline]
    pub fn has_dirty_tiles(&self) -> bool {
        !self.dirty_tiles.is_empty()
    }

    #[inline]
    pub fn dirty_tile_count(&self) -> usize {
        self.dirty_tiles.len()
    }
}
