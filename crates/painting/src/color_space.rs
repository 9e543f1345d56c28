//! Pixel encodings used by channel rasters and rendered dabs
//!
//! Rasters never interpret their bytes directly. Every read and write goes
//! through a [`ColorSpace`] handed to the raster when it is created, so a
//! host can plug in its own encodings next to the built-in ones.

use std::fmt;
use std::sync::Arc;

use half::f16;
use serde::{Deserialize, Serialize};

/// Pixel codec capability injected into rasters.
pub trait ColorSpace: fmt::Debug + Send + Sync {
    /// Stable identifier used for format comparisons
    fn id(&self) -> &str;

    /// Human readable name
    fn name(&self) -> &str;

    /// Number of channels per pixel
    fn channel_count(&self) -> usize;

    /// Bytes per pixel
    fn pixel_size(&self) -> usize;

    /// Decode one pixel into normalised channel values.
    ///
    /// `out` is resized to [`channel_count`](Self::channel_count).
    fn normalised_channels(&self, pixel: &[u8], out: &mut Vec<f32>);

    /// Encode normalised channel values into one pixel.
    ///
    /// Missing trailing values leave the corresponding bytes untouched.
    fn from_normalised_channels(&self, values: &[f32], pixel: &mut [u8]);

    /// Opacity of a pixel in [0, 1]
    fn opacity(&self, pixel: &[u8]) -> f32;
}

/// Built-in pixel formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Single 8-bit alpha channel (dab masks)
    Alpha8,
    /// 8-bit RGBA
    Rgba8,
    /// 16-bit float gray + alpha
    GrayAF16,
    /// 16-bit float RGBA
    RgbaF16,
}

impl PixelFormat {
    pub fn id(self) -> &'static str {
        match self {
            PixelFormat::Alpha8 => "ALPHA8",
            PixelFormat::Rgba8 => "RGBA8",
            PixelFormat::GrayAF16 => "GRAYAF16",
            PixelFormat::RgbaF16 => "RGBAF16",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::Alpha8 => "Alpha (8-bit integer)",
            PixelFormat::Rgba8 => "RGB/Alpha (8-bit integer/channel)",
            PixelFormat::GrayAF16 => "Gray/Alpha (16-bit float/channel)",
            PixelFormat::RgbaF16 => "RGB/Alpha (16-bit float/channel)",
        }
    }

    pub fn channel_count(self) -> usize {
        match self {
            PixelFormat::Alpha8 => 1,
            PixelFormat::GrayAF16 => 2,
            PixelFormat::Rgba8 | PixelFormat::RgbaF16 => 4,
        }
    }

    pub fn bytes_per_channel(self) -> usize {
        match self {
            PixelFormat::Alpha8 | PixelFormat::Rgba8 => 1,
            PixelFormat::GrayAF16 | PixelFormat::RgbaF16 => 2,
        }
    }

    /// Index of the channel carrying opacity
    pub fn alpha_channel(self) -> usize {
        self.channel_count() - 1
    }

    /// Codec for this format
    pub fn color_space(self) -> Arc<dyn ColorSpace> {
        Arc::new(BuiltinColorSpace { format: self })
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Codec backing the [`PixelFormat`] variants.
///
/// Integer channels normalise to [0, 1]. Float channels are passed through
/// unchanged, so height values above 1.0 survive a round trip.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinColorSpace {
    format: PixelFormat,
}

impl BuiltinColorSpace {
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    fn read_channel(&self, pixel: &[u8], channel: usize) -> f32 {
        match self.format.bytes_per_channel() {
            1 => pixel.get(channel).map_or(0.0, |&v| v as f32 / 255.0),
            _ => {
                let offset = channel * 2;
                match pixel.get(offset..offset + 2) {
                    Some(bytes) => f16::from_le_bytes([bytes[0], bytes[1]]).to_f32(),
                    None => 0.0,
                }
            }
        }
    }

    #[inline]
    fn write_channel(&self, pixel: &mut [u8], channel: usize, value: f32) {
        match self.format.bytes_per_channel() {
            1 => {
                if let Some(slot) = pixel.get_mut(channel) {
                    *slot = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
                }
            }
            _ => {
                let offset = channel * 2;
                if let Some(slot) = pixel.get_mut(offset..offset + 2) {
                    slot.copy_from_slice(&f16::from_f32(value).to_le_bytes());
                }
            }
        }
    }
}

impl ColorSpace for BuiltinColorSpace {
    fn id(&self) -> &str {
        self.format.id()
    }

    fn name(&self) -> &str {
        self.format.name()
    }

    fn channel_count(&self) -> usize {
        self.format.channel_count()
    }

    fn pixel_size(&self) -> usize {
        self.format.channel_count() * self.format.bytes_per_channel()
    }

    fn normalised_channels(&self, pixel: &[u8], out: &mut Vec<f32>) {
        out.clear();
        out.extend((0..self.channel_count()).map(|channel| self.read_channel(pixel, channel)));
    }

    fn from_normalised_channels(&self, values: &[f32], pixel: &mut [u8]) {
        for (channel, &value) in values.iter().take(self.channel_count()).enumerate() {
            self.write_channel(pixel, channel, value);
        }
    }

    fn opacity(&self, pixel: &[u8]) -> f32 {
        self.read_channel(pixel, self.format.alpha_channel()).clamp(0.0, 1.0)
    }
}
