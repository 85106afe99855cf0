//! The single movable position used to walk and grow a [`Document`].
//!
//! # Why one mutable cursor? (for beginners)
//!
//! Both directions of layout persistence are depth-first walks.  Serialize
//! grows the document one node at a time while it walks the live element
//! tree; deserialize walks the document while it grows the element tree.  A
//! single cursor that moves down, across and back up mirrors that recursive
//! shape exactly and never allocates per step.
//!
//! The price is calling discipline:
//!
//! - every successful [`DocumentCursor::move_down`] (or
//!   [`DocumentCursor::new_child`]) must be paired with a later
//!   [`DocumentCursor::move_up`];
//! - only one traversal may use a cursor at a time.  `&mut self` on every
//!   move makes the second rule a compile-time guarantee.
//!
//! # Representation
//!
//! The cursor is the current [`NodeId`] plus a stack of [`Frame`]s, one per
//! ancestor, recording which child slot of that ancestor the walk is in.
//! Moving to the next sibling bumps the top frame's index; moving up pops it.
//! Every move is O(1).

use super::{xml, Document, DocumentError, NodeId, LAYOUT_ROOT, NULL_VALUE};
use crate::property::codec::{parse_boolean, parse_integer, ConversionError};

/// What a node holds for a given attribute name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeSlot<'a> {
    /// The attribute is not present: the reader's default applies.
    Absent,
    /// The attribute holds the explicit-null marker.
    Null,
    /// The attribute holds an ordinary value.
    Value(&'a str),
}

impl<'a> AttributeSlot<'a> {
    fn from_raw(raw: Option<&'a str>) -> Self {
        match raw {
            None => Self::Absent,
            Some(NULL_VALUE) => Self::Null,
            Some(value) => Self::Value(value),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    parent: NodeId,
    index: usize,
}

/// Owns a [`Document`] and the one current position within it.
#[derive(Debug, Clone)]
pub struct DocumentCursor {
    document: Document,
    current: NodeId,
    path: Vec<Frame>,
    name: Option<String>,
    version: Option<String>,
}

impl DocumentCursor {
    /// Creates a cursor over the empty layout skeleton, positioned at the root.
    pub fn new() -> Self {
        Self::over(Document::skeleton())
    }

    /// Creates a cursor over `document`, positioned at its root.
    ///
    /// The layout name and version are not read here; see
    /// [`DocumentCursor::validate`].
    pub fn over(document: Document) -> Self {
        let current = document.root();
        Self {
            document,
            current,
            path: Vec::new(),
            name: None,
            version: None,
        }
    }

    /// Parses `text` and validates it as a layout document.
    ///
    /// # Errors
    ///
    /// Returns any [`DocumentError`] from parsing, or
    /// [`DocumentError::SignatureMismatch`] from validation.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let mut cursor = Self::over(xml::parse(text)?);
        cursor.validate()?;
        Ok(cursor)
    }

    /// Checks the root signature, caches `name` and `version`, and positions
    /// the cursor on the first top-level node (or the root if there is none).
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::SignatureMismatch`] when the root tag is not
    /// [`LAYOUT_ROOT`].
    pub fn validate(&mut self) -> Result<(), DocumentError> {
        self.move_top();
        if self.object_name() != LAYOUT_ROOT {
            return Err(DocumentError::SignatureMismatch {
                found: self.object_name().to_string(),
            });
        }
        self.name = Some(self.read_string("name", Some("")).unwrap_or_default());
        self.version = Some(self.read_string("version", Some("")).unwrap_or_default());
        self.move_down();
        Ok(())
    }

    /// Returns the underlying document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Renders the document as XML text.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if the writer fails.
    pub fn to_xml(&self) -> Result<String, DocumentError> {
        xml::write(&self.document)
    }

    // ── Navigation ────────────────────────────────────────────────────────────

    /// Moves to the root.
    ///
    /// Returns `true` only when a layout with a non-empty name is loaded,
    /// i.e. this is a real layout rather than a freshly cleared skeleton.
    pub fn move_top(&mut self) -> bool {
        self.path.clear();
        self.current = self.document.root();
        self.name.as_deref().map_or(false, |n| !n.is_empty())
    }

    /// Moves to the first child of the current node.
    ///
    /// Returns `false`, leaving the position unchanged, when there is none.
    pub fn move_down(&mut self) -> bool {
        match self.document.node(self.current).children().first() {
            Some(&first) => {
                self.path.push(Frame {
                    parent: self.current,
                    index: 0,
                });
                self.current = first;
                true
            }
            None => false,
        }
    }

    /// Moves to the next sibling of the current node.
    ///
    /// Returns `false`, leaving the position unchanged, at the last sibling
    /// or at the root.
    pub fn move_next(&mut self) -> bool {
        let Some(frame) = self.path.last_mut() else {
            return false;
        };
        let siblings = self.document.node(frame.parent).children();
        match siblings.get(frame.index + 1) {
            Some(&next) => {
                frame.index += 1;
                self.current = next;
                true
            }
            None => false,
        }
    }

    /// Moves to the parent of the current node.
    ///
    /// Returns `false` at the root.
    pub fn move_up(&mut self) -> bool {
        match self.path.pop() {
            Some(frame) => {
                self.current = frame.parent;
                true
            }
            None => false,
        }
    }

    /// Appends a child tagged `tag` under the current node and moves to it.
    pub fn new_child(&mut self, tag: &str) {
        let id = self.document.append_child(self.current, tag);
        let index = self.document.node(self.current).children().len() - 1;
        self.path.push(Frame {
            parent: self.current,
            index,
        });
        self.current = id;
    }

    /// Returns the tag of the current node.
    pub fn object_name(&self) -> &str {
        self.document.node(self.current).tag()
    }

    /// Returns the id of the current node.
    pub fn position(&self) -> NodeId {
        self.current
    }

    /// Returns how many levels below the root the current node is.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    // ── Attribute access ──────────────────────────────────────────────────────

    /// Returns what the current node holds for attribute `name`.
    pub fn attribute(&self, name: &str) -> AttributeSlot<'_> {
        AttributeSlot::from_raw(self.document.node(self.current).attribute(name))
    }

    /// Returns `true` if the current node has attribute `name`, null or not.
    pub fn has_attribute(&self, name: &str) -> bool {
        !matches!(self.attribute(name), AttributeSlot::Absent)
    }

    /// Reads `name` as a string.
    ///
    /// Absent yields `default`; explicit null yields `None`.
    pub fn read_string(&self, name: &str, default: Option<&str>) -> Option<String> {
        match self.attribute(name) {
            AttributeSlot::Absent => default.map(str::to_owned),
            AttributeSlot::Null => None,
            AttributeSlot::Value(value) => Some(value.to_owned()),
        }
    }

    /// Reads `name` as a boolean.
    ///
    /// Absent yields `Some(default)`; explicit null yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Parse`] if the stored text is not a boolean.
    pub fn read_boolean(&self, name: &str, default: bool) -> Result<Option<bool>, ConversionError> {
        match self.attribute(name) {
            AttributeSlot::Absent => Ok(Some(default)),
            AttributeSlot::Null => Ok(None),
            AttributeSlot::Value(value) => parse_boolean(value).map(Some),
        }
    }

    /// Reads `name` as a 32-bit integer.
    ///
    /// Absent yields `Some(default)`; explicit null yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Parse`] if the stored text is not an integer.
    pub fn read_integer(&self, name: &str, default: i32) -> Result<Option<i32>, ConversionError> {
        match self.attribute(name) {
            AttributeSlot::Absent => Ok(Some(default)),
            AttributeSlot::Null => Ok(None),
            AttributeSlot::Value(value) => parse_integer(value).map(Some),
        }
    }

    /// Writes `name` on the current node; `None` stores the explicit-null marker.
    pub fn write_string(&mut self, name: &str, value: Option<&str>) {
        self.document
            .set_attribute(self.current, name, value.unwrap_or(NULL_VALUE));
    }

    /// Writes a boolean; `None` stores the explicit-null marker.
    pub fn write_boolean(&mut self, name: &str, value: Option<bool>) {
        let text = value.map(|v| v.to_string());
        self.write_string(name, text.as_deref());
    }

    /// Writes an integer; `None` stores the explicit-null marker.
    pub fn write_integer(&mut self, name: &str, value: Option<i32>) {
        let text = value.map(|v| v.to_string());
        self.write_string(name, text.as_deref());
    }

    // ── Root attributes ───────────────────────────────────────────────────────

    /// Returns the layout name, or `None` if nothing has been loaded.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the layout name, both cached and on the root node.
    pub fn set_name(&mut self, value: &str) {
        self.name = Some(value.to_string());
        let root = self.document.root();
        self.document.set_attribute(root, "name", value);
    }

    /// Returns the layout version, or `None` if nothing has been loaded.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Sets the layout version, both cached and on the root node.
    pub fn set_version(&mut self, value: &str) {
        self.version = Some(value.to_string());
        let root = self.document.root();
        self.document.set_attribute(root, "version", value);
    }

    /// Returns `true` when the document has no content below the root.
    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    /// Discards all content and returns to the unloaded skeleton.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for DocumentCursor {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
