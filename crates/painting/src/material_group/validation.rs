use thiserror::Error;

use super::MaterialGroup;
use crate::constants::CHANNEL_PROPERTY_KEY;
use crate::node::NodeTree;
use crate::types::ChannelIndex;

/// Structural problems found in a material group. Advisory only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("{0} channel is missing.")]
    MissingChannel(ChannelIndex),
    #[error("{name} is not assigned to a material channel.")]
    UnassignedLayer { name: String },
    #[error("Duplicate channel {0} detected.")]
    DuplicateChannel(ChannelIndex),
    #[error("{channel} channel layer {name} has no pixel data.")]
    NotAPaintLayer { channel: ChannelIndex, name: String },
    #[error("{channel} channel should use color space {expected} but is {actual}.")]
    FormatMismatch {
        channel: ChannelIndex,
        expected: String,
        actual: String,
    },
}

impl MaterialGroup {
    /// Every structural problem, without changing anything.
    ///
    /// Missing channels come first, followed by per-child findings in
    /// sibling order.
    pub fn validation_issues(&self, tree: &NodeTree) -> Vec<ValidationIssue> {
        let mut issues: Vec<ValidationIssue> = self
            .missing_channels(tree)
            .into_iter()
            .map(ValidationIssue::MissingChannel)
            .collect();

        let mut seen = [false; ChannelIndex::COUNT];
        for (_, node) in self.layer_children(tree) {
            let stored = node.properties().string_property(CHANNEL_PROPERTY_KEY);
            let Some(channel) = ChannelIndex::from_id(stored) else {
                issues.push(ValidationIssue::UnassignedLayer {
                    name: node.name().to_string(),
                });
                continue;
            };

            if seen[channel.index()] {
                issues.push(ValidationIssue::DuplicateChannel(channel));
            }
            seen[channel.index()] = true;

            let expected = channel.expected_format();
            match node.color_space() {
                Some(actual) if actual.id() != expected.id() => {
                    issues.push(ValidationIssue::FormatMismatch {
                        channel,
                        expected: expected.name().to_string(),
                        actual: actual.name().to_string(),
                    });
                }
                Some(_) => {}
                // The router cannot paint into it
                None => issues.push(ValidationIssue::NotAPaintLayer {
                    channel,
                    name: node.name().to_string(),
                }),
            }
        }

        issues
    }

    pub fn is_valid_material_stack(&self, tree: &NodeTree) -> bool {
        self.validation_issues(tree).is_empty()
    }
}
