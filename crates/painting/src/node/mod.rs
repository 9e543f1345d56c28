//! Layer node arena
//!
//! Nodes live in a flat arena addressed by [`NodeId`]. Each node keeps its
//! children in sibling order and a non-owning back-reference to its parent.
//! Removed slots are left empty so ids are never reused.

mod types;

pub use types::*;

use impasto_config::CanvasConfig;
use tracing::trace;

use crate::raster::Raster;

/// Ordered tree of layer nodes under a single root group
#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    image: Option<ImageInfo>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Create a tree without image context
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::group("root"))],
            root: NodeId(0),
            image: None,
        }
    }

    pub fn with_image(image: ImageInfo) -> Self {
        let mut tree = Self::new();
        tree.image = Some(image);
        tree
    }

    pub fn from_canvas(canvas: &CanvasConfig) -> Self {
        Self::with_image(ImageInfo::from(canvas))
    }

    /// Image context used to size new rasters
    pub fn image(&self) -> Option<ImageInfo> {
        self.image
    }

    pub fn set_image(&mut self, image: Option<ImageInfo>) {
        self.image = image;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot()).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.slot()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Children of `id` in sibling order; empty for unknown ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Position of `id` among its siblings
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// Whether `ancestor` is `id` itself or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    fn get(&self, id: NodeId) -> Result<&Node, NodeError> {
        self.node(id).ok_or(NodeError::UnknownNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, NodeError> {
        self.node_mut(id).ok_or(NodeError::UnknownNode(id))
    }

    fn require_group(&self, id: NodeId) -> Result<(), NodeError> {
        if self.get(id)?.is_group() {
            Ok(())
        } else {
            Err(NodeError::NotAGroup(id))
        }
    }

    /// Sibling position a node is inserted at: ahead of `before`, or last
    fn insert_position(&self, parent: NodeId, before: Option<NodeId>) -> Result<usize, NodeError> {
        let children = self.children(parent);
        match before {
            Some(anchor) => children
                .iter()
                .position(|&child| child == anchor)
                .ok_or(NodeError::InvalidAnchor { parent, anchor }),
            None => Ok(children.len()),
        }
    }

    /// Insert `node` under `parent`, directly ahead of `before` (or last).
    ///
    /// Any children the node value carries are discarded; build subtrees by
    /// adding nodes one at a time.
    pub fn add_node(
        &mut self,
        mut node: Node,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<NodeId, NodeError> {
        self.require_group(parent)?;
        let position = self.insert_position(parent, before)?;

        let id = NodeId(self.nodes.len() as u32);
        node.parent = Some(parent);
        node.children.clear();
        trace!("Adding node {:?} '{}' under {:?} at {}", id, node.name(), parent, position);
        self.nodes.push(Some(node));
        self.get_mut(parent)?.children.insert(position, id);
        Ok(id)
    }

    /// Remove `id` and its whole subtree, returning the detached node
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, NodeError> {
        if id == self.root {
            return Err(NodeError::RootNode);
        }
        let parent = self.get(id)?.parent;
        if let Some(parent) = parent {
            self.get_mut(parent)?.children.retain(|&child| child != id);
        }

        let mut pending = vec![id];
        let mut removed = None;
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(current.slot()).and_then(Option::take) {
                pending.extend(node.children.iter().copied());
                if current == id {
                    removed = Some(node);
                }
            }
        }

        let mut node = removed.ok_or(NodeError::UnknownNode(id))?;
        node.parent = None;
        node.children.clear();
        Ok(node)
    }

    /// Re-parent `id` under `parent`, directly ahead of `before` (or last)
    pub fn move_node(
        &mut self,
        id: NodeId,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), NodeError> {
        if id == self.root {
            return Err(NodeError::RootNode);
        }
        self.get(id)?;
        self.require_group(parent)?;
        if self.is_ancestor_or_self(id, parent) {
            return Err(NodeError::WouldCreateCycle { node: id, parent });
        }
        if let Some(anchor) = before {
            if anchor == id || !self.children(parent).contains(&anchor) {
                return Err(NodeError::InvalidAnchor { parent, anchor });
            }
        }

        if let Some(old_parent) = self.get(id)?.parent {
            self.get_mut(old_parent)?.children.retain(|&child| child != id);
        }
        let position = self.insert_position(parent, before)?;
        self.get_mut(parent)?.children.insert(position, id);
        self.get_mut(id)?.parent = Some(parent);
        Ok(())
    }

    /// Replace the sibling order of `parent`'s children.
    ///
    /// `order` must contain exactly the current children.
    pub fn reorder_children(&mut self, parent: NodeId, order: &[NodeId]) -> Result<(), NodeError> {
        let children = &self.get(parent)?.children;
        let mut current = children.clone();
        let mut requested = order.to_vec();
        current.sort_unstable();
        requested.sort_unstable();
        if current != requested {
            return Err(NodeError::InvalidOrder(parent));
        }
        self.get_mut(parent)?.children = order.to_vec();
        Ok(())
    }

    pub fn raster(&self, id: NodeId) -> Option<&Raster> {
        self.node(id).and_then(Node::raster)
    }

    pub fn raster_mut(&mut self, id: NodeId) -> Option<&mut Raster> {
        self.node_mut(id).and_then(Node::raster_mut)
    }

    /// Borrow one raster for reading and another for writing at the same time
    pub fn raster_pair_mut(
        &mut self,
        read: NodeId,
        write: NodeId,
    ) -> Result<(&Raster, &mut Raster), NodeError> {
        if read == write {
            return Err(NodeError::Aliased(read));
        }
        self.get(read)?;
        self.get(write)?;

        let (read_slot, write_slot) = (read.slot(), write.slot());
        let (read_node, write_node) = if read_slot < write_slot {
            let (head, tail) = self.nodes.split_at_mut(write_slot);
            (&head[read_slot], &mut tail[0])
        } else {
            let (head, tail) = self.nodes.split_at_mut(read_slot);
            (&tail[0], &mut head[write_slot])
        };

        let read_raster = read_node
            .as_ref()
            .and_then(Node::raster)
            .ok_or(NodeError::NoRaster(read))?;
        let write_raster = write_node
            .as_mut()
            .and_then(Node::raster_mut)
            .ok_or(NodeError::NoRaster(write))?;
        Ok((read_raster, write_raster))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_space::PixelFormat;

    fn paint(name: &str) -> Node {
        Node::paint(name, Raster::new(4, 4, PixelFormat::GrayAF16.color_space()))
    }

    #[test]
    fn test_add_node_order() {
        let mut tree = NodeTree::new();
        let root = tree.root();
        let a = tree.add_node(paint("a"), root, None).unwrap();
        let c = tree.add_node(paint("c"), root, None).unwrap();
        let b = tree.add_node(paint("b"), root, Some(c)).unwrap();

        assert_eq!(tree.children(root), &[a, b, c]);
        assert_eq!(tree.parent(b), Some(root));
        assert_eq!(tree.index_of(c), Some(2));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_add_node_errors() {
        let mut tree = NodeTree::new();
        let root = tree.root();
        let layer = tree.add_node(paint("layer"), root, None).unwrap();
        let group = tree.add_node(Node::group("group"), root, None).unwrap();

        assert_eq!(
            tree.add_node(paint("x"), layer, None),
            Err(NodeError::NotAGroup(layer))
        );
        assert_eq!(
            tree.add_node(paint("x"), group, Some(layer)),
            Err(NodeError::InvalidAnchor { parent: group, anchor: layer })
        );
        assert_eq!(
            tree.add_node(paint("x"), NodeId(99), None),
            Err(NodeError::UnknownNode(NodeId(99)))
        );
    }

    #[test]
    fn test_remove_subtree() {
        let mut tree = NodeTree::new();
        let root = tree.root();
        let group = tree.add_node(Node::group("group"), root, None).unwrap();
        let child = tree.add_node(paint("child"), group, None).unwrap();
        let sibling = tree.add_node(paint("sibling"), root, None).unwrap();

        let removed = tree.remove_node(group).unwrap();
        assert_eq!(removed.name(), "group");
        assert!(!tree.contains(group));
        assert!(!tree.contains(child));
        assert_eq!(tree.children(root), &[sibling]);
        assert_eq!(tree.remove_node(root).unwrap_err(), NodeError::RootNode);
    }

    #[test]
    fn test_move_node() {
        let mut tree = NodeTree::new();
        let root = tree.root();
        let outer = tree.add_node(Node::group("outer"), root, None).unwrap();
        let inner = tree.add_node(Node::group("inner"), outer, None).unwrap();
        let layer = tree.add_node(paint("layer"), root, None).unwrap();

        tree.move_node(layer, inner, None).unwrap();
        assert_eq!(tree.children(inner), &[layer]);
        assert_eq!(tree.children(root), &[outer]);
        assert!(tree.is_ancestor_or_self(outer, layer));

        assert_eq!(
            tree.move_node(outer, inner, None),
            Err(NodeError::WouldCreateCycle { node: outer, parent: inner })
        );
        // Failed moves leave the tree untouched
        assert_eq!(tree.children(root), &[outer]);
    }

    #[test]
    fn test_reorder_children() {
        let mut tree = NodeTree::new();
        let root = tree.root();
        let a = tree.add_node(paint("a"), root, None).unwrap();
        let b = tree.add_node(paint("b"), root, None).unwrap();

        tree.reorder_children(root, &[b, a]).unwrap();
        assert_eq!(tree.children(root), &[b, a]);
        assert_eq!(
            tree.reorder_children(root, &[b]),
            Err(NodeError::InvalidOrder(root))
        );
    }

    #[test]
    fn test_raster_pair_mut() {
        let mut tree = NodeTree::new();
        let root = tree.root();
        let a = tree.add_node(paint("a"), root, None).unwrap();
        let b = tree.add_node(paint("b"), root, None).unwrap();
        let group = tree.add_node(Node::group("group"), root, None).unwrap();

        tree.raster_mut(b).unwrap().write_normalised(0, 0, &[0.75, 1.0]);
        {
            let (read, write) = tree.raster_pair_mut(b, a).unwrap();
            let mut values = Vec::new();
            read.read_normalised(0, 0, &mut values);
            write.write_normalised(1, 1, &values);
        }
        assert_eq!(tree.raster(a).unwrap().opacity_at(1, 1), Some(1.0));

        assert!(matches!(tree.raster_pair_mut(a, a), Err(NodeError::Aliased(_))));
        assert!(matches!(tree.raster_pair_mut(a, group), Err(NodeError::NoRaster(_))));
    }

    #[test]
    fn test_properties() {
        let mut node = Node::group("group");
        node.properties_mut().set_bool("flag", true);
        node.properties_mut().set_string("id", "Height");

        assert!(node.properties().bool_property("flag"));
        assert!(!node.properties().bool_property("id"));
        assert_eq!(node.properties().string_property("id"), "Height");
        assert_eq!(node.properties().string_property("missing"), "");
        assert!(node.is_layer());
        assert!(!Node::mask("mask").is_layer());
    }
}
