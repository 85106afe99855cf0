//! The persisted layout document: an ordered tree of tagged, attributed nodes.
//!
//! # Arena layout (for beginners)
//!
//! Instead of linking nodes together with pointers (which Rust's ownership
//! rules make awkward for a tree that is both walked and grown at the same
//! time), every [`Node`] lives in one `Vec` owned by the [`Document`].  Nodes
//! refer to each other by [`NodeId`], which is just an index into that `Vec`.
//!
//! ```text
//! nodes[0]  <layout name="L" version="3.0">     parent: None,    children: [1, 3]
//! nodes[1]    <toolbar align="start">            parent: Some(0), children: [2]
//! nodes[2]      <button label="Save"/>           parent: Some(1), children: []
//! nodes[3]    <tabview/>                         parent: Some(0), children: []
//! ```
//!
//! Node 0 is always the root and always carries the [`LAYOUT_ROOT`] tag.
//! Nodes are never removed once appended; the whole document is discarded
//! and rebuilt when a different layout is loaded.

pub mod cursor;
pub mod xml;

use thiserror::Error;

pub use cursor::{AttributeSlot, DocumentCursor};

/// Tag of the root node of every layout document.
pub const LAYOUT_ROOT: &str = "layout";

/// Attribute value that stands for an explicit null.
///
/// Distinct from "attribute absent", which means "use the declared default".
pub const NULL_VALUE: &str = "\\null\\";

/// Errors raised while reading or writing document text.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The text is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The XML writer failed to emit an event.
    #[error("failed to write document: {0}")]
    Write(#[from] std::io::Error),

    /// A tag or attribute name is not valid UTF-8.
    #[error("document is not valid UTF-8: {0}")]
    Encoding(String),

    /// The root element is not [`LAYOUT_ROOT`].
    #[error("expected signature not found: root element is <{found}>")]
    SignatureMismatch { found: String },

    /// The text contains no element at all.
    #[error("document has no root element")]
    Empty,

    /// An element was opened but never closed.
    #[error("unclosed element <{0}> at end of document")]
    Unbalanced(String),

    /// A second top-level element follows the root.
    #[error("unexpected element <{0}> after the root element")]
    TrailingContent(String),
}

/// Index of a [`Node`] inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One tagged, attributed position in a [`Document`].
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    tag: String,
    /// Insertion-ordered; keys are unique within a node.
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    fn new(tag: &str, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
            parent,
        }
    }

    /// Returns the node's tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the raw stored value of `name`, or `None` if the attribute is absent.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns all attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of attributes on this node.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Returns the child node ids in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the parent node id, or `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(value);
            }
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }
}

/// An ordered tree of [`Node`]s with exactly one root.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Creates a document containing only a root node tagged `root_tag`.
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![Node::new(root_tag, None)],
        }
    }

    /// Creates the empty layout skeleton: a bare [`LAYOUT_ROOT`] node.
    pub fn skeleton() -> Self {
        Self::new(LAYOUT_ROOT)
    }

    /// Returns the id of the root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this document.  Ids are only ever
    /// handed out by [`Document::append_child`] and [`Document::root`], and
    /// nodes are never removed, so a foreign id is a programming error.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Appends a new child tagged `tag` under `parent` and returns its id.
    pub fn append_child(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(tag, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Sets (or replaces) the attribute `name` on node `id`.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        self.nodes[id.0].set_attribute(name, value);
    }

    /// Returns the total number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::skeleton()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
