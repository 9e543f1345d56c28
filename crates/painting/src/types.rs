use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color_space::PixelFormat;

/// Identity of a material channel.
///
/// The declaration order is the canonical stacking order of channel layers
/// inside a material group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChannelIndex {
    BaseColor = 0,
    Height = 1,
    Normal = 2,
    Roughness = 3,
    Metallic = 4,
}

impl ChannelIndex {
    /// Number of material channels
    pub const COUNT: usize = 5;

    /// All channels in canonical order
    pub const ALL: [ChannelIndex; Self::COUNT] = [
        ChannelIndex::BaseColor,
        ChannelIndex::Height,
        ChannelIndex::Normal,
        ChannelIndex::Roughness,
        ChannelIndex::Metallic,
    ];

    /// Position in canonical order (0..5)
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Channel for a canonical position, if in range
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Identifier stored in node metadata
    pub fn id(self) -> &'static str {
        match self {
            ChannelIndex::BaseColor => "BaseColor",
            ChannelIndex::Height => "Height",
            ChannelIndex::Normal => "Normal",
            ChannelIndex::Roughness => "Roughness",
            ChannelIndex::Metallic => "Metallic",
        }
    }

    /// Name given to channel layers
    pub fn display_name(self) -> &'static str {
        self.id()
    }

    /// Parse a stored identifier (case-insensitive)
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.id().eq_ignore_ascii_case(id))
    }

    /// Pixel format a channel layer is expected to use
    pub fn expected_format(self) -> PixelFormat {
        match self {
            ChannelIndex::BaseColor => PixelFormat::Rgba8,
            ChannelIndex::Normal => PixelFormat::RgbaF16,
            ChannelIndex::Height | ChannelIndex::Roughness | ChannelIndex::Metallic => {
                PixelFormat::GrayAF16
            }
        }
    }
}

impl fmt::Display for ChannelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Integer pixel rectangle (x, y is the top-left corner)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Exclusive right edge, saturating at `i32::MAX`
    #[inline]
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Overlap of two rectangles, None when they do not intersect
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let width = i64::from(self.right().min(other.right())) - i64::from(x);
        let height = i64::from(self.bottom().min(other.bottom())) - i64::from(y);
        if width <= 0 || height <= 0 {
            return None;
        }
        // Never wider than either input, so this always fits
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        Some(Rect::new(x, y, width, height))
    }
}

/// Tile coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_ids_round_trip() {
        for channel in ChannelIndex::ALL {
            assert_eq!(ChannelIndex::from_id(channel.id()), Some(channel));
            assert_eq!(ChannelIndex::from_index(channel.index()), Some(channel));
        }
        assert_eq!(ChannelIndex::from_index(5), None);
    }

    #[test]
    fn test_channel_id_case_insensitive() {
        assert_eq!(ChannelIndex::from_id("height"), Some(ChannelIndex::Height));
        assert_eq!(ChannelIndex::from_id("METALLIC"), Some(ChannelIndex::Metallic));
        assert_eq!(ChannelIndex::from_id(""), None);
        assert_eq!(ChannelIndex::from_id("Emission"), None);
    }

    #[test]
    fn test_expected_formats() {
        assert_eq!(ChannelIndex::BaseColor.expected_format(), PixelFormat::Rgba8);
        assert_eq!(ChannelIndex::Height.expected_format(), PixelFormat::GrayAF16);
        assert_eq!(ChannelIndex::Normal.expected_format(), PixelFormat::RgbaF16);
        assert_eq!(ChannelIndex::Roughness.expected_format(), PixelFormat::GrayAF16);
        assert_eq!(ChannelIndex::Metallic.expected_format(), PixelFormat::GrayAF16);
    }

    #[test]
    fn test_canonical_order() {
        assert!(ChannelIndex::BaseColor < ChannelIndex::Height);
        assert!(ChannelIndex::Roughness < ChannelIndex::Metallic);
    }

    #[test]
    fn test_rect_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, -5, 10, 10);
        assert_eq!(a.intersect(&b), Some(Rect::new(5, 0, 5, 5)));

        let far = Rect::new(20, 20, 4, 4);
        assert_eq!(a.intersect(&far), None);

        // Touching edges do not overlap
        let touching = Rect::new(10, 0, 4, 4);
        assert_eq!(a.intersect(&touching), None);
    }

    #[test]
    fn test_rect_near_i32_limits() {
        let edge = Rect::new(i32::MAX - 1, 0, 4, 1);
        assert_eq!(edge.right(), i32::MAX);
        assert_eq!(edge.intersect(&Rect::new(0, 0, 64, 64)), None);

        let huge = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        let everything = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(huge.intersect(&everything), Some(huge));

        let wide = Rect::new(i32::MIN, 0, i32::MAX, 1);
        let tail = Rect::new(-10, 0, i32::MAX, 1);
        assert_eq!(wide.intersect(&tail), Some(Rect::new(-10, 0, 9, 1)));
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(2, 3, 4, 5);
        assert!(rect.contains(2, 3));
        assert!(rect.contains(5, 7));
        assert!(!rect.contains(6, 7));
        assert!(!rect.contains(1, 3));
        assert!(Rect::new(0, 0, 0, 4).is_empty());
    }
}
