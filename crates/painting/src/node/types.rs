//! Type definitions for the layer node arena.

use std::collections::BTreeMap;
use std::sync::Arc;

use impasto_config::CanvasConfig;

use crate::color_space::ColorSpace;
use crate::raster::Raster;

/// Type-safe node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

/// A value stored in a node's property bag
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    String(String),
}

/// String-keyed metadata attached to a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeProperties {
    values: BTreeMap<String, PropertyValue>,
}

impl NodeProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), PropertyValue::Bool(value));
    }

    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.values
            .insert(key.to_string(), PropertyValue::String(value.into()));
    }

    /// Boolean value of `key`; false when absent or not a boolean
    pub fn bool_property(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(PropertyValue::Bool(true)))
    }

    /// String value of `key`; empty when absent or not a string
    pub fn string_property(&self, key: &str) -> &str {
        match self.values.get(key) {
            Some(PropertyValue::String(value)) => value,
            _ => "",
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// What a node is. Closed set; query capabilities instead of matching
/// where possible.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Paintable layer owning pixel storage
    Paint(Raster),
    /// Layer holding an ordered list of children
    Group,
    /// Non-layer node (selection or filter mask)
    Mask,
}

/// A node in the layer arena
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    kind: NodeKind,
    properties: NodeProperties,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: NodeProperties::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn paint(name: impl Into<String>, raster: Raster) -> Self {
        Self::with_kind(name, NodeKind::Paint(raster))
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Group)
    }

    pub fn mask(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Mask)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn properties(&self) -> &NodeProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut NodeProperties {
        &mut self.properties
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in sibling order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Paint layers and groups are layers; masks are not
    pub fn is_layer(&self) -> bool {
        matches!(self.kind, NodeKind::Paint(_) | NodeKind::Group)
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group)
    }

    pub fn raster(&self) -> Option<&Raster> {
        match &self.kind {
            NodeKind::Paint(raster) => Some(raster),
            _ => None,
        }
    }

    pub fn raster_mut(&mut self) -> Option<&mut Raster> {
        match &mut self.kind {
            NodeKind::Paint(raster) => Some(raster),
            _ => None,
        }
    }

    /// Pixel encoding of the node, for nodes that own pixels
    pub fn color_space(&self) -> Option<&Arc<dyn ColorSpace>> {
        self.raster().map(Raster::color_space)
    }
}

/// Image context new channel rasters are sized from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
}

impl ImageInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tile_size: impasto_config::DEFAULT_TILE_SIZE,
        }
    }
}

impl From<&CanvasConfig> for ImageInfo {
    fn from(canvas: &CanvasConfig) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            tile_size: canvas.tile_size,
        }
    }
}

/// Errors that can occur during node arena operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NodeError {
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("Node {0:?} cannot hold children")]
    NotAGroup(NodeId),
    #[error("Node {anchor:?} is not a child of {parent:?}")]
    InvalidAnchor { parent: NodeId, anchor: NodeId },
    #[error("The root node cannot be removed or moved")]
    RootNode,
    #[error("Moving {node:?} under {parent:?} would create a cycle")]
    WouldCreateCycle { node: NodeId, parent: NodeId },
    #[error("New child order for {0:?} is not a permutation of its children")]
    InvalidOrder(NodeId),
    #[error("Node {0:?} has no pixel data")]
    NoRaster(NodeId),
    #[error("Node {0:?} requested for reading and writing at once")]
    Aliased(NodeId),
}
