//! Key-value and attributed-tree persistence for [`ChannelMatrix`]

use serde_json::{Map, Value};
use tracing::trace;

use super::ChannelMatrix;
use crate::constants::{LEGACY_CHANNEL_TAG, MATRIX_ELEMENT_TAG, MATRIX_FORMAT_VERSION};
use crate::document::DocumentElement;
use crate::types::ChannelIndex;

type BoolField = (&'static str, fn(&ChannelMatrix) -> bool, fn(&mut ChannelMatrix, bool));
type FloatField = (&'static str, fn(&ChannelMatrix) -> f32, fn(&mut ChannelMatrix, f32));

const BOOL_FIELDS: [BoolField; 5] = [
    ("affectBaseColor", ChannelMatrix::affect_base_color, ChannelMatrix::set_affect_base_color),
    ("affectHeight", ChannelMatrix::affect_height, ChannelMatrix::set_affect_height),
    ("affectNormal", ChannelMatrix::affect_normal, ChannelMatrix::set_affect_normal),
    ("affectRoughness", ChannelMatrix::affect_roughness, ChannelMatrix::set_affect_roughness),
    ("affectMetallic", ChannelMatrix::affect_metallic, ChannelMatrix::set_affect_metallic),
];

const FLOAT_FIELDS: [FloatField; 7] = [
    ("opacityBaseColor", ChannelMatrix::opacity_base_color, ChannelMatrix::set_opacity_base_color),
    ("opacityHeight", ChannelMatrix::opacity_height, ChannelMatrix::set_opacity_height),
    ("normalStrength", ChannelMatrix::normal_strength, ChannelMatrix::set_normal_strength),
    ("roughnessValue", ChannelMatrix::roughness_value, ChannelMatrix::set_roughness_value),
    ("metallicValue", ChannelMatrix::metallic_value, ChannelMatrix::set_metallic_value),
    ("heightScaleMM", ChannelMatrix::height_scale_mm, ChannelMatrix::set_height_scale_mm),
    ("heightCreaminess", ChannelMatrix::height_creaminess, ChannelMatrix::set_height_creaminess),
];

impl ChannelMatrix {
    /// Key-value form: one entry per field, no version marker
    pub fn to_json(&self) -> Map<String, Value> {
        let mut object = Map::new();
        for (key, get, _) in BOOL_FIELDS {
            object.insert(key.to_string(), Value::Bool(get(self)));
        }
        for (key, get, _) in FLOAT_FIELDS {
            object.insert(key.to_string(), Value::from(f64::from(get(self))));
        }
        object
    }

    /// Load the key-value form. Missing or wrongly typed keys, and numbers
    /// outside the f32 range, keep their default value.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let mut matrix = Self::default();
        if object.is_empty() {
            return matrix;
        }

        for (key, _, set) in BOOL_FIELDS {
            if let Some(value) = object.get(key).and_then(Value::as_bool) {
                set(&mut matrix, value);
            }
        }
        for (key, _, set) in FLOAT_FIELDS {
            if let Some(value) = object.get(key).and_then(json_float) {
                set(&mut matrix, value);
            }
        }
        matrix
    }

    /// Attributed-tree form with flat attributes and per-channel entries
    /// for older readers
    pub fn to_element(&self) -> DocumentElement {
        let mut element = DocumentElement::new(MATRIX_ELEMENT_TAG);
        element.set_attribute("version", MATRIX_FORMAT_VERSION);
        for (key, get, _) in BOOL_FIELDS {
            element.set_attribute(key, get(self));
        }
        for (key, get, _) in FLOAT_FIELDS {
            element.set_attribute(key, get(self));
        }

        for channel in ChannelIndex::ALL {
            let mut entry = DocumentElement::new(LEGACY_CHANNEL_TAG);
            entry.set_attribute("id", channel.index());
            entry.set_attribute("enabled", self.affects(channel));
            entry.set_attribute("strength", self.strength(channel));
            element.append_child(entry);
        }
        element
    }

    /// Load the attributed-tree form.
    ///
    /// Flat attributes are read only for version 2 and later. Per-channel
    /// entries are applied afterwards regardless of version and win over
    /// the flat attributes.
    pub fn from_element(element: &DocumentElement) -> Self {
        let mut matrix = Self::default();
        if element.is_null() {
            return matrix;
        }

        let version = element
            .attribute("version")
            .and_then(|text| text.trim().parse::<i32>().ok())
            .unwrap_or(1);

        if version >= MATRIX_FORMAT_VERSION {
            for (key, _, set) in BOOL_FIELDS {
                if let Some(text) = element.attribute(key) {
                    set(&mut matrix, text == "true");
                }
            }
            for (key, _, set) in FLOAT_FIELDS {
                if let Some(value) = element.attribute(key).and_then(parse_float) {
                    set(&mut matrix, value);
                }
            }
        }

        for entry in element.children_named(LEGACY_CHANNEL_TAG) {
            let Some(channel) = entry
                .attribute("id")
                .and_then(|text| text.trim().parse::<usize>().ok())
                .and_then(ChannelIndex::from_index)
            else {
                trace!("Ignoring channel entry without a valid id");
                continue;
            };
            let enabled = entry.attribute("enabled") == Some("true");
            let strength = entry.attribute("strength").and_then(parse_float).unwrap_or(1.0);
            matrix.set_affects(channel, enabled);
            matrix.set_strength(channel, strength);
        }

        matrix
    }
}

fn json_float(value: &Value) -> Option<f32> {
    value
        .as_f64()
        .map(|value| value as f32)
        .filter(|value| value.is_finite())
}

fn parse_float(text: &str) -> Option<f32> {
    text.trim().parse::<f32>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel_matrix::tests::arb_matrix;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_json_round_trip_any_matrix(matrix in arb_matrix()) {
            prop_assert_eq!(ChannelMatrix::from_json(&matrix.to_json()), matrix);
        }

        #[test]
        fn test_element_round_trip_any_matrix(matrix in arb_matrix()) {
            prop_assert_eq!(ChannelMatrix::from_element(&matrix.to_element()), matrix);
        }
    }

    #[test]
    fn test_json_out_of_range_numbers_keep_defaults() {
        let value = serde_json::json!({
            "heightScaleMM": 1e300,
            "heightCreaminess": -1e300,
            "opacityHeight": 1e300,
        });
        let matrix = ChannelMatrix::from_json(value.as_object().unwrap());
        assert_eq!(matrix.height_scale_mm(), 0.4);
        assert_eq!(matrix.height_creaminess(), 1.6);
        assert_eq!(matrix.opacity_height(), 1.0);
    }

    fn custom_matrix() -> ChannelMatrix {
        let mut matrix = ChannelMatrix::default();
        matrix.set_affect_base_color(false);
        matrix.set_affect_roughness(true);
        matrix.set_opacity_height(0.25);
        matrix.set_normal_strength(0.5);
        matrix.set_roughness_value(0.3);
        matrix.set_metallic_value(0.9);
        matrix.set_height_scale_mm(1.25);
        matrix.set_height_creaminess(2.0);
        matrix
    }

    #[test]
    fn test_json_round_trip() {
        let matrix = custom_matrix();
        let object = matrix.to_json();
        assert_eq!(object.len(), 12);
        assert!(!object.contains_key("version"));
        assert_eq!(ChannelMatrix::from_json(&object), matrix);
    }

    #[test]
    fn test_json_empty_object_is_default() {
        assert_eq!(ChannelMatrix::from_json(&Map::new()), ChannelMatrix::default());
    }

    #[test]
    fn test_json_partial_and_wrong_types() {
        let value = serde_json::json!({
            "affectMetallic": true,
            "metallicValue": 2.0,
            "opacityHeight": "half",
            "affectNormal": 0,
        });
        let matrix = ChannelMatrix::from_json(value.as_object().unwrap());
        assert!(matrix.affect_metallic());
        assert_eq!(matrix.metallic_value(), 1.0);
        assert_eq!(matrix.opacity_height(), 1.0);
        assert!(matrix.affect_normal());
    }

    #[test]
    fn test_element_round_trip() {
        let matrix = custom_matrix();
        let element = matrix.to_element();
        assert_eq!(element.tag(), MATRIX_ELEMENT_TAG);
        assert_eq!(element.attribute("version"), Some("2"));
        assert_eq!(element.attribute("affectBaseColor"), Some("false"));
        assert_eq!(element.attribute("heightScaleMM"), Some("1.25"));
        assert_eq!(element.children_named(LEGACY_CHANNEL_TAG).count(), 5);
        assert_eq!(ChannelMatrix::from_element(&element), matrix);
    }

    #[test]
    fn test_element_legacy_entries() {
        let element = custom_matrix().to_element();
        let entry = &element.children()[2];
        assert_eq!(entry.attribute("id"), Some("2"));
        assert_eq!(entry.attribute("enabled"), Some("true"));
        assert_eq!(entry.attribute("strength"), Some("0.5"));
    }

    #[test]
    fn test_null_element_is_default() {
        assert_eq!(ChannelMatrix::from_element(&DocumentElement::default()), ChannelMatrix::default());
    }

    #[test]
    fn test_version_one_ignores_flat_attributes() {
        let mut element = DocumentElement::new(MATRIX_ELEMENT_TAG);
        element.set_attribute("affectMetallic", "true");
        element.set_attribute("metallicValue", 0.8);

        let matrix = ChannelMatrix::from_element(&element);
        assert_eq!(matrix, ChannelMatrix::default());
    }

    #[test]
    fn test_version_one_legacy_entries() {
        let mut element = DocumentElement::new(MATRIX_ELEMENT_TAG);
        let mut entry = DocumentElement::new(LEGACY_CHANNEL_TAG);
        entry.set_attribute("id", 3);
        entry.set_attribute("enabled", "true");
        element.append_child(entry);

        let matrix = ChannelMatrix::from_element(&element);
        assert!(matrix.affect_roughness());
        // Missing strength falls back to full strength
        assert_eq!(matrix.roughness_value(), 1.0);
    }

    #[test]
    fn test_legacy_entries_override_flat_attributes() {
        let mut element = ChannelMatrix::default().to_element();
        element.set_attribute("affectHeight", "true");
        element.set_attribute("opacityHeight", 0.9);

        let mut entry = DocumentElement::new(LEGACY_CHANNEL_TAG);
        entry.set_attribute("id", 1);
        entry.set_attribute("enabled", "false");
        entry.set_attribute("strength", 0.2);
        element.append_child(entry);

        let matrix = ChannelMatrix::from_element(&element);
        assert!(!matrix.affect_height());
        assert_eq!(matrix.opacity_height(), 0.2);
    }

    #[test]
    fn test_malformed_attributes() {
        let mut element = DocumentElement::new(MATRIX_ELEMENT_TAG);
        element.set_attribute("version", 2);
        element.set_attribute("affectBaseColor", "yes");
        element.set_attribute("normalStrength", "strong");
        element.set_attribute("heightCreaminess", "-3");

        let mut bad_id = DocumentElement::new(LEGACY_CHANNEL_TAG);
        bad_id.set_attribute("id", 9);
        bad_id.set_attribute("enabled", "true");
        element.append_child(bad_id);

        let mut no_id = DocumentElement::new(LEGACY_CHANNEL_TAG);
        no_id.set_attribute("enabled", "true");
        element.append_child(no_id);

        let matrix = ChannelMatrix::from_element(&element);
        assert!(!matrix.affect_base_color());
        assert_eq!(matrix.normal_strength(), ChannelMatrix::default().normal_strength());
        assert_eq!(matrix.height_creaminess(), 0.01);
        assert!(!matrix.affect_roughness());
        assert!(!matrix.affect_metallic());
    }
}
