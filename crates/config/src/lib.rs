//! Shared configuration for Impasto
//!
//! This crate provides the single source of truth for brush channel
//! defaults and canvas settings shared by the painting core and any host
//! application that embeds it.

use serde::{Deserialize, Serialize};

/// Default canvas width in pixels
pub const DEFAULT_CANVAS_WIDTH: u32 = 1024;

/// Default canvas height in pixels
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1024;

/// Default tile size used for dirty tracking on channel rasters
pub const DEFAULT_TILE_SIZE: u32 = 64;

/// Default strength of the normal reconstruction
pub const DEFAULT_NORMAL_STRENGTH: f32 = 0.7;

/// Default roughness painted when the roughness channel is enabled
pub const DEFAULT_ROUGHNESS_VALUE: f32 = 0.65;

/// Default metallic value painted when the metallic channel is enabled
pub const DEFAULT_METALLIC_VALUE: f32 = 0.0;

/// Default height amplitude (millimetres) of a full-pressure dab
pub const DEFAULT_HEIGHT_SCALE_MM: f32 = 0.4;

/// Default pressure-response exponent for height
pub const DEFAULT_HEIGHT_CREAMINESS: f32 = 1.6;

/// Errors raised while loading configuration documents
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Canvas configuration used when creating channel rasters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Tile edge length for dirty tracking
    pub tile_size: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

impl CanvasConfig {
    /// Create a new canvas config with the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }

    /// Number of pixels on the canvas
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// Initial values for a brush channel matrix.
///
/// Values are not clamped here; the painting core clamps them when a
/// matrix is built from these defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelDefaults {
    pub affect_base_color: bool,
    pub affect_height: bool,
    pub affect_normal: bool,
    pub affect_roughness: bool,
    pub affect_metallic: bool,
    pub opacity_base_color: f32,
    pub opacity_height: f32,
    pub normal_strength: f32,
    pub roughness_value: f32,
    pub metallic_value: f32,
    #[serde(rename = "heightScaleMM")]
    pub height_scale_mm: f32,
    pub height_creaminess: f32,
}

impl Default for ChannelDefaults {
    fn default() -> Self {
        Self {
            affect_base_color: true,
            affect_height: true,
            affect_normal: true,
            affect_roughness: false,
            affect_metallic: false,
            opacity_base_color: 1.0,
            opacity_height: 1.0,
            normal_strength: DEFAULT_NORMAL_STRENGTH,
            roughness_value: DEFAULT_ROUGHNESS_VALUE,
            metallic_value: DEFAULT_METALLIC_VALUE,
            height_scale_mm: DEFAULT_HEIGHT_SCALE_MM,
            height_creaminess: DEFAULT_HEIGHT_CREAMINESS,
        }
    }
}

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintConfig {
    pub canvas: CanvasConfig,
    pub channels: ChannelDefaults,
}

impl PaintConfig {
    /// Parse a configuration document. Missing sections keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize the configuration as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PaintConfig::default();
        assert_eq!(config.canvas.width, DEFAULT_CANVAS_WIDTH);
        assert_eq!(config.canvas.height, DEFAULT_CANVAS_HEIGHT);
        assert_eq!(config.canvas.tile_size, DEFAULT_TILE_SIZE);
        assert!(config.channels.affect_base_color);
        assert!(!config.channels.affect_roughness);
        assert_eq!(config.channels.height_creaminess, DEFAULT_HEIGHT_CREAMINESS);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config =
            PaintConfig::from_json_str(r#"{ "canvas": { "width": 256 }, "channels": { "heightScaleMM": 1.5 } }"#)
                .unwrap();
        assert_eq!(config.canvas.width, 256);
        assert_eq!(config.canvas.height, DEFAULT_CANVAS_HEIGHT);
        assert_eq!(config.channels.height_scale_mm, 1.5);
        assert_eq!(config.channels.normal_strength, DEFAULT_NORMAL_STRENGTH);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = PaintConfig::default();
        config.canvas = CanvasConfig::new(300, 200);
        config.channels.affect_metallic = true;

        let text = config.to_json_string().unwrap();
        let parsed = PaintConfig::from_json_str(&text).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.canvas.pixel_count(), 60_000);
    }

    #[test]
    fn test_malformed_document() {
        assert!(PaintConfig::from_json_str("{ not json").is_err());
    }
}
