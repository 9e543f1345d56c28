//! Brush channel matrix - which material channels a brush affects, and how
//!
//! The matrix is a plain value type. Every numeric setter clamps its input,
//! so a matrix never holds out-of-range values no matter where they came
//! from (UI, preset file, legacy document).

mod serialization;

use impasto_config::ChannelDefaults;
use serde::{Deserialize, Serialize};

use crate::constants::{MATRIX_EPSILON, MIN_HEIGHT_CREAMINESS};
use crate::types::ChannelIndex;

/// Clamp to [0, 1]; NaN saturates to 1
#[inline]
pub(crate) fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        return 1.0;
    }
    value.clamp(0.0, 1.0)
}

#[inline]
fn fuzzy_eq(lhs: f32, rhs: f32) -> bool {
    (lhs - rhs).abs() <= MATRIX_EPSILON
}

/// Per-brush routing configuration for the five material channels
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "ChannelDefaults", into = "ChannelDefaults")]
pub struct ChannelMatrix {
    affect_base_color: bool,
    affect_height: bool,
    affect_normal: bool,
    affect_roughness: bool,
    affect_metallic: bool,

    opacity_base_color: f32,
    opacity_height: f32,
    normal_strength: f32,
    roughness_value: f32,
    metallic_value: f32,
    height_scale_mm: f32,
    height_creaminess: f32,
}

impl Default for ChannelMatrix {
    fn default() -> Self {
        Self::from_defaults(&ChannelDefaults::default())
    }
}

impl ChannelMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a matrix from configured defaults, clamping every value
    pub fn from_defaults(defaults: &ChannelDefaults) -> Self {
        let mut matrix = Self {
            affect_base_color: defaults.affect_base_color,
            affect_height: defaults.affect_height,
            affect_normal: defaults.affect_normal,
            affect_roughness: defaults.affect_roughness,
            affect_metallic: defaults.affect_metallic,
            opacity_base_color: 1.0,
            opacity_height: 1.0,
            normal_strength: 0.0,
            roughness_value: 0.0,
            metallic_value: 0.0,
            height_scale_mm: 0.0,
            height_creaminess: 1.0,
        };
        matrix.set_opacity_base_color(defaults.opacity_base_color);
        matrix.set_opacity_height(defaults.opacity_height);
        matrix.set_normal_strength(defaults.normal_strength);
        matrix.set_roughness_value(defaults.roughness_value);
        matrix.set_metallic_value(defaults.metallic_value);
        matrix.set_height_scale_mm(defaults.height_scale_mm);
        matrix.set_height_creaminess(defaults.height_creaminess);
        matrix
    }

    pub fn affect_base_color(&self) -> bool {
        self.affect_base_color
    }

    pub fn set_affect_base_color(&mut self, value: bool) {
        self.affect_base_color = value;
    }

    pub fn affect_height(&self) -> bool {
        self.affect_height
    }

    pub fn set_affect_height(&mut self, value: bool) {
        self.affect_height = value;
    }

    pub fn affect_normal(&self) -> bool {
        self.affect_normal
    }

    pub fn set_affect_normal(&mut self, value: bool) {
        self.affect_normal = value;
    }

    pub fn affect_roughness(&self) -> bool {
        self.affect_roughness
    }

    pub fn set_affect_roughness(&mut self, value: bool) {
        self.affect_roughness = value;
    }

    pub fn affect_metallic(&self) -> bool {
        self.affect_metallic
    }

    pub fn set_affect_metallic(&mut self, value: bool) {
        self.affect_metallic = value;
    }

    pub fn opacity_base_color(&self) -> f32 {
        self.opacity_base_color
    }

    pub fn set_opacity_base_color(&mut self, value: f32) {
        self.opacity_base_color = clamp01(value);
    }

    pub fn opacity_height(&self) -> f32 {
        self.opacity_height
    }

    pub fn set_opacity_height(&mut self, value: f32) {
        self.opacity_height = clamp01(value);
    }

    pub fn normal_strength(&self) -> f32 {
        self.normal_strength
    }

    pub fn set_normal_strength(&mut self, value: f32) {
        self.normal_strength = clamp01(value);
    }

    pub fn roughness_value(&self) -> f32 {
        self.roughness_value
    }

    pub fn set_roughness_value(&mut self, value: f32) {
        self.roughness_value = clamp01(value);
    }

    pub fn metallic_value(&self) -> f32 {
        self.metallic_value
    }

    pub fn set_metallic_value(&mut self, value: f32) {
        self.metallic_value = clamp01(value);
    }

    /// Height amplitude of a full-pressure dab, in millimetres
    pub fn height_scale_mm(&self) -> f32 {
        self.height_scale_mm
    }

    /// Non-finite input is ignored
    pub fn set_height_scale_mm(&mut self, value: f32) {
        if value.is_finite() {
            self.height_scale_mm = value.max(0.0);
        }
    }

    /// Pressure-response exponent for height
    pub fn height_creaminess(&self) -> f32 {
        self.height_creaminess
    }

    /// Non-finite input is ignored
    pub fn set_height_creaminess(&mut self, value: f32) {
        if value.is_finite() {
            self.height_creaminess = value.max(MIN_HEIGHT_CREAMINESS);
        }
    }

    /// Whether `channel` is enabled
    pub fn affects(&self, channel: ChannelIndex) -> bool {
        match channel {
            ChannelIndex::BaseColor => self.affect_base_color,
            ChannelIndex::Height => self.affect_height,
            ChannelIndex::Normal => self.affect_normal,
            ChannelIndex::Roughness => self.affect_roughness,
            ChannelIndex::Metallic => self.affect_metallic,
        }
    }

    pub fn set_affects(&mut self, channel: ChannelIndex, value: bool) {
        match channel {
            ChannelIndex::BaseColor => self.set_affect_base_color(value),
            ChannelIndex::Height => self.set_affect_height(value),
            ChannelIndex::Normal => self.set_affect_normal(value),
            ChannelIndex::Roughness => self.set_affect_roughness(value),
            ChannelIndex::Metallic => self.set_affect_metallic(value),
        }
    }

    /// The single scalar paired with each channel: opacity for base color
    /// and height, strength for normal, painted value for roughness and
    /// metallic.
    pub fn strength(&self, channel: ChannelIndex) -> f32 {
        match channel {
            ChannelIndex::BaseColor => self.opacity_base_color,
            ChannelIndex::Height => self.opacity_height,
            ChannelIndex::Normal => self.normal_strength,
            ChannelIndex::Roughness => self.roughness_value,
            ChannelIndex::Metallic => self.metallic_value,
        }
    }

    pub fn set_strength(&mut self, channel: ChannelIndex, value: f32) {
        match channel {
            ChannelIndex::BaseColor => self.set_opacity_base_color(value),
            ChannelIndex::Height => self.set_opacity_height(value),
            ChannelIndex::Normal => self.set_normal_strength(value),
            ChannelIndex::Roughness => self.set_roughness_value(value),
            ChannelIndex::Metallic => self.set_metallic_value(value),
        }
    }

    /// Paint base color only. Strengths are left as they are.
    pub fn apply_color_only_preset(&mut self) {
        self.affect_base_color = true;
        self.affect_height = false;
        self.affect_normal = false;
        self.affect_roughness = false;
        self.affect_metallic = false;
    }

    /// Stop painting base color; the texture channels keep their flags.
    pub fn apply_texture_only_preset(&mut self) {
        self.affect_base_color = false;
    }
}

impl PartialEq for ChannelMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.affect_base_color == other.affect_base_color
            && self.affect_height == other.affect_height
            && self.affect_normal == other.affect_normal
            && self.affect_roughness == other.affect_roughness
            && self.affect_metallic == other.affect_metallic
            && fuzzy_eq(self.opacity_base_color, other.opacity_base_color)
            && fuzzy_eq(self.opacity_height, other.opacity_height)
            && fuzzy_eq(self.normal_strength, other.normal_strength)
            && fuzzy_eq(self.roughness_value, other.roughness_value)
            && fuzzy_eq(self.metallic_value, other.metallic_value)
            && fuzzy_eq(self.height_scale_mm, other.height_scale_mm)
            && fuzzy_eq(self.height_creaminess, other.height_creaminess)
    }
}

impl From<ChannelDefaults> for ChannelMatrix {
    fn from(defaults: ChannelDefaults) -> Self {
        Self::from_defaults(&defaults)
    }
}

impl From<ChannelMatrix> for ChannelDefaults {
    fn from(matrix: ChannelMatrix) -> Self {
        ChannelDefaults {
            affect_base_color: matrix.affect_base_color,
            affect_height: matrix.affect_height,
            affect_normal: matrix.affect_normal,
            affect_roughness: matrix.affect_roughness,
            affect_metallic: matrix.affect_metallic,
            opacity_base_color: matrix.opacity_base_color,
            opacity_height: matrix.opacity_height,
            normal_strength: matrix.normal_strength,
            roughness_value: matrix.roughness_value,
            metallic_value: matrix.metallic_value,
            height_scale_mm: matrix.height_scale_mm,
            height_creaminess: matrix.height_creaminess,
        }
    }
}
