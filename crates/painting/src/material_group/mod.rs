//! Material groups - a group node owning one child raster per material channel
//!
//! Channel children are identified by the `materialChannel` node property.
//! Children without that property may be adopted by name. The structure is
//! eventually consistent: [`MaterialGroup::normalize_channel_metadata`]
//! restores at most one tag per channel and canonical order among tagged
//! children, leaving untagged children where they are.

mod conversion;
mod validation;

pub use validation::ValidationIssue;

use tracing::{debug, warn};

use crate::constants::{CHANNEL_PROPERTY_KEY, FLAT_NORMAL_ENCODED, MATERIAL_GROUP_PROPERTY_KEY};
use crate::node::{Node, NodeError, NodeId, NodeTree};
use crate::raster::Raster;
use crate::types::ChannelIndex;

/// Handle to a group node carrying the material marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialGroup {
    node: NodeId,
}

/// Channel identity stored on a node, if it parses
fn stored_channel(node: &Node) -> Option<ChannelIndex> {
    ChannelIndex::from_id(node.properties().string_property(CHANNEL_PROPERTY_KEY))
}

/// Give `node` the canonical name and id of `channel`
fn apply_channel_metadata(node: &mut Node, channel: ChannelIndex) {
    node.set_name(channel.display_name());
    node.properties_mut()
        .set_string(CHANNEL_PROPERTY_KEY, channel.id());
}

impl MaterialGroup {
    /// Add an empty material group under `parent`, ahead of `before`
    pub fn create(
        tree: &mut NodeTree,
        parent: NodeId,
        before: Option<NodeId>,
        name: &str,
    ) -> Result<Self, NodeError> {
        let mut node = Node::group(name);
        node.properties_mut()
            .set_bool(MATERIAL_GROUP_PROPERTY_KEY, true);
        let id = tree.add_node(node, parent, before)?;
        debug!("Created material group '{}' as {:?}", name, id);
        Ok(Self { node: id })
    }

    /// Recognise an existing material group by its marker property
    pub fn from_node(tree: &NodeTree, id: NodeId) -> Option<Self> {
        let node = tree.node(id)?;
        (node.is_group() && node.properties().bool_property(MATERIAL_GROUP_PROPERTY_KEY))
            .then_some(Self { node: id })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Layer children in sibling order
    fn layer_children<'a>(
        self,
        tree: &'a NodeTree,
    ) -> impl Iterator<Item = (NodeId, &'a Node)> + 'a {
        tree.children(self.node).iter().filter_map(move |&id| {
            tree.node(id)
                .filter(|node| node.is_layer())
                .map(|node| (id, node))
        })
    }

    /// The child owning `channel`: the child tagged with it, else the first
    /// child with no stored id whose name matches the channel name.
    pub fn channel_layer(&self, tree: &NodeTree, channel: ChannelIndex) -> Option<NodeId> {
        let mut fallback = None;
        for (id, node) in self.layer_children(tree) {
            let stored = node.properties().string_property(CHANNEL_PROPERTY_KEY);
            if ChannelIndex::from_id(stored) == Some(channel) {
                return Some(id);
            }
            if fallback.is_none()
                && stored.is_empty()
                && node.name().eq_ignore_ascii_case(channel.display_name())
            {
                fallback = Some(id);
            }
        }
        fallback
    }

    /// Channels with no owning child, in canonical order
    pub fn missing_channels(&self, tree: &NodeTree) -> Vec<ChannelIndex> {
        ChannelIndex::ALL
            .into_iter()
            .filter(|&channel| self.channel_layer(tree, channel).is_none())
            .collect()
    }

    /// Sibling a new `channel` child has to go ahead of to keep canonical
    /// order: the first tagged child whose channel sorts after it.
    pub fn insertion_anchor(&self, tree: &NodeTree, channel: ChannelIndex) -> Option<NodeId> {
        self.layer_children(tree)
            .find(|(_, node)| stored_channel(node).is_some_and(|found| found > channel))
            .map(|(id, _)| id)
    }

    /// Tag `child` as the layer for `channel`, renaming it to match
    pub fn tag_channel_layer(&self, tree: &mut NodeTree, child: NodeId, channel: ChannelIndex) {
        match tree.node_mut(child) {
            Some(node) => apply_channel_metadata(node, channel),
            None => warn!("Cannot tag unknown node {:?} as {}", child, channel),
        }
    }

    /// A detached, tagged paint node for `channel` in the channel's pixel
    /// format and sized to the image. None without image context.
    pub fn create_channel_layer_template(
        &self,
        tree: &NodeTree,
        channel: ChannelIndex,
    ) -> Option<Node> {
        let image = tree.image()?;
        let color_space = channel.expected_format().color_space();
        let raster = Raster::new(image.width, image.height, color_space.clone());
        let mut raster = match raster.with_tile_size(image.tile_size) {
            Ok(raster) => raster,
            Err(err) => {
                warn!("{}; keeping the default tile size", err);
                Raster::new(image.width, image.height, color_space)
            }
        };
        if channel == ChannelIndex::Normal {
            raster.fill_normalised(&FLAT_NORMAL_ENCODED);
        }

        let mut node = Node::paint(channel.display_name(), raster);
        apply_channel_metadata(&mut node, channel);
        Some(node)
    }

    /// Create and insert a child for each of `channels`, each placed at its
    /// canonical position
    pub fn add_missing_channels(&self, tree: &mut NodeTree, channels: &[ChannelIndex]) {
        for &channel in channels {
            let Some(template) = self.create_channel_layer_template(tree, channel) else {
                debug!("No image context; {} channel not created", channel);
                continue;
            };
            let anchor = self.insertion_anchor(tree, channel);
            match tree.add_node(template, self.node, anchor) {
                Ok(id) => debug!("Added {} channel {:?} to {:?}", channel, id, self.node),
                Err(err) => warn!("Failed to add {} channel: {}", channel, err),
            }
        }
    }

    /// Make sure every channel has a child. Calling it again is a no-op.
    pub fn ensure_channel_children(&self, tree: &mut NodeTree) {
        self.normalize_channel_metadata(tree);
        for channel in ChannelIndex::ALL {
            if self.channel_layer(tree, channel).is_none() {
                self.add_missing_channels(tree, &[channel]);
            }
        }
        self.normalize_channel_metadata(tree);
    }

    /// Re-associate children with channels.
    ///
    /// Tagged children get their canonical name and id back; a later child
    /// tagged with an already claimed channel loses its tag. Untagged
    /// children whose name matches an unclaimed channel are adopted. Tagged
    /// children are then put in canonical order within the positions they
    /// already occupy.
    pub fn normalize_channel_metadata(&self, tree: &mut NodeTree) {
        let children = tree.children(self.node).to_vec();
        let mut claimed = [false; ChannelIndex::COUNT];

        for &child in &children {
            let Some(node) = tree.node_mut(child).filter(|node| node.is_layer()) else {
                continue;
            };
            let Some(channel) = stored_channel(node) else {
                continue;
            };
            if claimed[channel.index()] {
                debug!("Dropping duplicate {} tag from '{}'", channel, node.name());
                node.properties_mut().remove(CHANNEL_PROPERTY_KEY);
                continue;
            }
            apply_channel_metadata(node, channel);
            claimed[channel.index()] = true;
        }

        for &child in &children {
            let Some(node) = tree.node_mut(child).filter(|node| node.is_layer()) else {
                continue;
            };
            if stored_channel(node).is_some() {
                continue;
            }
            let adopted = ChannelIndex::ALL.into_iter().find(|candidate| {
                !claimed[candidate.index()]
                    && node.name().eq_ignore_ascii_case(candidate.display_name())
            });
            if let Some(channel) = adopted {
                debug!("Adopting '{}' as the {} channel", node.name(), channel);
                apply_channel_metadata(node, channel);
                claimed[channel.index()] = true;
            }
        }

        self.restore_canonical_order(tree, &children);
    }

    fn restore_canonical_order(&self, tree: &mut NodeTree, children: &[NodeId]) {
        let tagged: Vec<(usize, ChannelIndex)> = children
            .iter()
            .enumerate()
            .filter_map(|(slot, &id)| {
                tree.node(id)
                    .filter(|node| node.is_layer())
                    .and_then(stored_channel)
                    .map(|channel| (slot, channel))
            })
            .collect();

        let mut sorted = tagged.clone();
        sorted.sort_by_key(|&(_, channel)| channel);
        if sorted == tagged {
            return;
        }

        let mut order = children.to_vec();
        for (&(slot, _), &(source, _)) in tagged.iter().zip(&sorted) {
            order[slot] = children[source];
        }
        if let Err(err) = tree.reorder_children(self.node, &order) {
            warn!("Failed to restore channel order: {}", err);
        }
    }
}

impl NodeTree {
    /// Add a material group with all five channel children under `parent`
    pub fn add_material_group(
        &mut self,
        parent: NodeId,
        name: &str,
    ) -> Result<MaterialGroup, NodeError> {
        let group = MaterialGroup::create(self, parent, None, name)?;
        group.add_missing_channels(self, &ChannelIndex::ALL);
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_space::PixelFormat;
    use crate::node::ImageInfo;
    use pretty_assertions::assert_eq;

    fn setup() -> (NodeTree, MaterialGroup) {
        let mut tree = NodeTree::with_image(ImageInfo::new(8, 8));
        let root = tree.root();
        let group = MaterialGroup::create(&mut tree, root, None, "Material").unwrap();
        (tree, group)
    }

    fn add_layer(tree: &mut NodeTree, group: MaterialGroup, name: &str, format: PixelFormat) -> NodeId {
        let node = Node::paint(name, Raster::new(8, 8, format.color_space()));
        tree.add_node(node, group.node(), None).unwrap()
    }

    fn child_names(tree: &NodeTree, group: MaterialGroup) -> Vec<String> {
        tree.children(group.node())
            .iter()
            .map(|&id| tree.node(id).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_fresh_group_missing_all() {
        let (tree, group) = setup();
        assert_eq!(group.missing_channels(&tree), ChannelIndex::ALL.to_vec());
        assert_eq!(MaterialGroup::from_node(&tree, group.node()), Some(group));
        assert_eq!(MaterialGroup::from_node(&tree, tree.root()), None);
    }

    #[test]
    fn test_ensure_channel_children_idempotent() {
        let (mut tree, group) = setup();
        group.ensure_channel_children(&mut tree);
        let first = tree.children(group.node()).to_vec();
        group.ensure_channel_children(&mut tree);

        assert_eq!(tree.children(group.node()), first.as_slice());
        assert_eq!(
            child_names(&tree, group),
            vec!["BaseColor", "Height", "Normal", "Roughness", "Metallic"]
        );
        assert!(group.missing_channels(&tree).is_empty());
        for channel in ChannelIndex::ALL {
            let id = group.channel_layer(&tree, channel).unwrap();
            let node = tree.node(id).unwrap();
            assert_eq!(node.properties().string_property(CHANNEL_PROPERTY_KEY), channel.id());
            assert_eq!(node.color_space().unwrap().id(), channel.expected_format().id());
        }
    }

    #[test]
    fn test_new_normal_channel_is_flat() {
        let (mut tree, group) = setup();
        group.ensure_channel_children(&mut tree);
        let normal = group.channel_layer(&tree, ChannelIndex::Normal).unwrap();

        let mut values = Vec::new();
        tree.raster(normal).unwrap().read_normalised(3, 3, &mut values);
        assert_eq!(values, FLAT_NORMAL_ENCODED.to_vec());
    }

    #[test]
    fn test_no_image_creates_nothing() {
        let mut tree = NodeTree::new();
        let root = tree.root();
        let group = MaterialGroup::create(&mut tree, root, None, "Material").unwrap();
        group.ensure_channel_children(&mut tree);

        assert!(tree.children(group.node()).is_empty());
        assert!(group.create_channel_layer_template(&tree, ChannelIndex::Height).is_none());
    }

    #[test]
    fn test_insertion_keeps_canonical_order() {
        let (mut tree, group) = setup();
        let metallic = add_layer(&mut tree, group, "m", PixelFormat::GrayAF16);
        group.tag_channel_layer(&mut tree, metallic, ChannelIndex::Metallic);
        let height = add_layer(&mut tree, group, "h", PixelFormat::GrayAF16);
        group.tag_channel_layer(&mut tree, height, ChannelIndex::Height);

        assert_eq!(group.insertion_anchor(&tree, ChannelIndex::BaseColor), Some(metallic));
        assert_eq!(group.insertion_anchor(&tree, ChannelIndex::Metallic), None);

        group.ensure_channel_children(&mut tree);
        assert_eq!(
            child_names(&tree, group),
            vec!["BaseColor", "Height", "Normal", "Roughness", "Metallic"]
        );
    }

    #[test]
    fn test_adopt_by_name() {
        let (mut tree, group) = setup();
        let layer = add_layer(&mut tree, group, "height", PixelFormat::GrayAF16);

        // Untagged but matching by name
        assert_eq!(group.channel_layer(&tree, ChannelIndex::Height), Some(layer));

        group.normalize_channel_metadata(&mut tree);
        let node = tree.node(layer).unwrap();
        assert_eq!(node.name(), "Height");
        assert_eq!(node.properties().string_property(CHANNEL_PROPERTY_KEY), "Height");
    }

    #[test]
    fn test_name_fallback_requires_empty_id() {
        let (mut tree, group) = setup();
        let layer = add_layer(&mut tree, group, "Height", PixelFormat::GrayAF16);
        tree.node_mut(layer)
            .unwrap()
            .properties_mut()
            .set_string(CHANNEL_PROPERTY_KEY, "Emission");

        assert_eq!(group.channel_layer(&tree, ChannelIndex::Height), None);
    }

    #[test]
    fn test_claimed_channel_not_adopted() {
        let (mut tree, group) = setup();
        let tagged = add_layer(&mut tree, group, "anything", PixelFormat::GrayAF16);
        group.tag_channel_layer(&mut tree, tagged, ChannelIndex::Roughness);
        let untagged = add_layer(&mut tree, group, "Roughness", PixelFormat::GrayAF16);

        group.normalize_channel_metadata(&mut tree);
        assert_eq!(group.channel_layer(&tree, ChannelIndex::Roughness), Some(tagged));
        assert_eq!(
            tree.node(untagged).unwrap().properties().string_property(CHANNEL_PROPERTY_KEY),
            ""
        );
    }

    #[test]
    fn test_normalize_fixes_case_and_name() {
        let (mut tree, group) = setup();
        let layer = add_layer(&mut tree, group, "bumps", PixelFormat::GrayAF16);
        tree.node_mut(layer)
            .unwrap()
            .properties_mut()
            .set_string(CHANNEL_PROPERTY_KEY, "HEIGHT");

        group.normalize_channel_metadata(&mut tree);
        let node = tree.node(layer).unwrap();
        assert_eq!(node.name(), "Height");
        assert_eq!(node.properties().string_property(CHANNEL_PROPERTY_KEY), "Height");
    }

    #[test]
    fn test_normalize_drops_duplicate_tags() {
        let (mut tree, group) = setup();
        let first = add_layer(&mut tree, group, "a", PixelFormat::GrayAF16);
        let second = add_layer(&mut tree, group, "b", PixelFormat::GrayAF16);
        group.tag_channel_layer(&mut tree, first, ChannelIndex::Height);
        group.tag_channel_layer(&mut tree, second, ChannelIndex::Height);

        group.normalize_channel_metadata(&mut tree);
        assert_eq!(group.channel_layer(&tree, ChannelIndex::Height), Some(first));
        assert_eq!(
            tree.node(second).unwrap().properties().string_property(CHANNEL_PROPERTY_KEY),
            ""
        );
    }

    #[test]
    fn test_normalize_restores_order_around_untagged() {
        let (mut tree, group) = setup();
        let metallic = add_layer(&mut tree, group, "m", PixelFormat::GrayAF16);
        let loose = add_layer(&mut tree, group, "Sketch", PixelFormat::Rgba8);
        let base = add_layer(&mut tree, group, "c", PixelFormat::Rgba8);
        group.tag_channel_layer(&mut tree, metallic, ChannelIndex::Metallic);
        group.tag_channel_layer(&mut tree, base, ChannelIndex::BaseColor);

        group.normalize_channel_metadata(&mut tree);
        assert_eq!(tree.children(group.node()), &[base, loose, metallic]);
    }

    #[test]
    fn test_masks_are_ignored() {
        let (mut tree, group) = setup();
        let mask = tree.add_node(Node::mask("Height"), group.node(), None).unwrap();

        assert_eq!(group.channel_layer(&tree, ChannelIndex::Height), None);
        group.normalize_channel_metadata(&mut tree);
        assert_eq!(tree.node(mask).unwrap().properties().string_property(CHANNEL_PROPERTY_KEY), "");
    }

    #[test]
    fn test_add_material_group() {
        let mut tree = NodeTree::with_image(ImageInfo::new(4, 4));
        let root = tree.root();
        let group = tree.add_material_group(root, "Material Group").unwrap();

        assert_eq!(tree.children(group.node()).len(), 5);
        assert!(group.missing_channels(&tree).is_empty());
        assert!(tree.node(group.node()).unwrap().properties().bool_property(MATERIAL_GROUP_PROPERTY_KEY));
    }
}
