use tracing::debug;

use super::MaterialGroup;
use crate::constants::MATERIAL_GROUP_PROPERTY_KEY;
use crate::node::{NodeId, NodeTree};
use crate::types::ChannelIndex;

impl MaterialGroup {
    /// Turn a plain group into a material group in place.
    ///
    /// The first five children are tagged by position (BaseColor, Height,
    /// Normal, Roughness, Metallic); non-layer children among them use up a
    /// position without being tagged. Missing channels are then created.
    /// A node that already is a material group is returned unchanged, and a
    /// node that is not a group yields None.
    pub fn convert_from_group(tree: &mut NodeTree, group: NodeId) -> Option<Self> {
        if let Some(existing) = Self::from_node(tree, group) {
            return Some(existing);
        }
        let node = tree.node_mut(group).filter(|node| node.is_group())?;
        node.properties_mut()
            .set_bool(MATERIAL_GROUP_PROPERTY_KEY, true);
        let material = Self { node: group };

        let children = tree.children(group).to_vec();
        for (&child, channel) in children.iter().zip(ChannelIndex::ALL) {
            if tree.node(child).is_some_and(|node| node.is_layer()) {
                material.tag_channel_layer(tree, child, channel);
            }
        }

        let missing = material.missing_channels(tree);
        material.add_missing_channels(tree, &missing);
        material.normalize_channel_metadata(tree);
        debug!("Converted {:?} to a material group", group);
        Some(material)
    }
}
