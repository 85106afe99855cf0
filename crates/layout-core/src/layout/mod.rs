//! `LayoutDocument`: the layout persistence engine.
//!
//! A `LayoutDocument` owns exactly one [`DocumentCursor`] and nothing else.
//! Everything above the cursor is a walk:
//!
//! - [`LayoutDocument::serialize`] walks a live
//!   [`ElementTree`](crate::element::ElementTree) depth-first
//!   and grows a fresh document in lock-step (see `serialize.rs`);
//! - [`LayoutDocument::deserialize`] walks the loaded document depth-first
//!   and grows the element tree, resolving each tag through an
//!   [`ElementRegistry`] (see `deserialize.rs`);
//! - the `load_*` / `save_*` adapters move document text in and out of a
//!   [`LayoutStore`] (see `storage.rs`).
//!
//! # Loaded vs. not loaded
//!
//! A document is either fully loaded or the empty skeleton `<layout/>`.
//! Every load resets first and resets again if anything fails, so a caller
//! never observes a half-parsed layout.
//!
//! A successful load or [`LayoutDocument::serialize`] marks the layout as
//! loaded, even when the result has no top-level nodes: a bare root element
//! persists only as attributes on `<layout>`.

pub mod deserialize;
pub mod serialize;
pub mod storage;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::document::{DocumentCursor, DocumentError};
use crate::element::TreeError;
use crate::property::codec::ConversionError;
use crate::registry::{ElementRegistry, TypeDescriptor};

pub use deserialize::{DeserializeOptions, Deserialized, Diagnostic, UnresolvedPolicy};
pub use storage::{LayoutIdentifier, LayoutStore, ResourceAddress, StorageError};

/// Version stamped on every layout saved through [`LayoutDocument::save_to_property`].
pub const LAYOUT_VERSION: &str = "3.0";

/// Nesting limit applied by both traversals unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Errors raised by the persistence engine.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The document text could not be parsed or is not a layout.
    #[error("malformed layout: {0}")]
    Malformed(#[from] DocumentError),

    /// A property value could not be converted to or from attribute text.
    #[error("property '{property}' of <{tag}>: {source}")]
    Conversion {
        tag: String,
        property: String,
        #[source]
        source: ConversionError,
    },

    /// The element tree refused a structural change.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The layout store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The tree or document nests deeper than the configured limit.
    #[error("layout nesting exceeds the limit of {limit} levels")]
    DepthExceeded { limit: usize },

    /// The layout was neither loaded nor produced by serialize.
    #[error("no layout is loaded")]
    NotLoaded,
}

/// A layout document plus its single traversal cursor.
#[derive(Debug, Clone, Default)]
pub struct LayoutDocument {
    cursor: DocumentCursor,
    loaded: bool,
}

impl LayoutDocument {
    /// Creates an empty, not-loaded layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards all content and returns to the empty skeleton.
    pub fn clear(&mut self) {
        self.cursor.clear();
        self.loaded = false;
    }

    pub fn cursor(&self) -> &DocumentCursor {
        &self.cursor
    }

    /// Mutable access for callers that drive the cursor directly.
    pub fn cursor_mut(&mut self) -> &mut DocumentCursor {
        &mut self.cursor
    }

    /// Returns the layout name, or `None` if nothing has been loaded.
    pub fn name(&self) -> Option<&str> {
        self.cursor.name()
    }

    pub fn set_name(&mut self, value: &str) {
        self.cursor.set_name(value);
    }

    /// Returns the layout version, or `None` if nothing has been loaded.
    pub fn version(&self) -> Option<&str> {
        self.cursor.version()
    }

    pub fn set_version(&mut self, value: &str) {
        self.cursor.set_version(value);
    }

    /// Returns `true` if the layout has no content below the root.
    pub fn is_empty(&self) -> bool {
        self.cursor.is_empty()
    }

    /// Returns `true` after a successful load or serialize, until the next
    /// [`LayoutDocument::clear`].
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Parses `text` as the new content of this layout.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Malformed`]; the layout is left empty.
    pub fn load_from_text(&mut self, text: &str) -> Result<&mut Self, LayoutError> {
        self.clear();
        self.cursor = DocumentCursor::parse(text)?;
        self.loaded = true;
        debug!(
            name = self.name().unwrap_or_default(),
            version = self.version().unwrap_or_default(),
            "layout loaded"
        );
        Ok(self)
    }

    /// Re-checks the root signature, refreshes name and version, and
    /// positions the cursor on the first top-level node.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Malformed`]; the layout is left empty.
    pub fn validate_document(&mut self) -> Result<(), LayoutError> {
        if let Err(err) = self.cursor.validate() {
            self.clear();
            return Err(err.into());
        }
        Ok(())
    }

    /// Tag of the first top-level node, or `None` for an empty layout.
    pub fn root_tag(&self) -> Option<&str> {
        let document = self.cursor.document();
        document
            .node(document.root())
            .children()
            .first()
            .map(|&id| document.node(id).tag())
    }

    /// Type descriptor of the first top-level node, if its tag is registered.
    pub fn root_descriptor(&self, registry: &ElementRegistry) -> Option<Arc<TypeDescriptor>> {
        self.root_tag().and_then(|tag| registry.resolve(tag))
    }

    /// Renders the layout as indented XML.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Malformed`] if the writer fails.
    pub fn to_xml(&self) -> Result<String, LayoutError> {
        Ok(self.cursor.to_xml()?)
    }

    /// Clipboard representation: the XML text.
    pub fn to_clipboard(&self) -> Result<String, LayoutError> {
        self.to_xml()
    }

    /// Builds a new layout from clipboard text.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Malformed`] if `data` is not a layout.
    pub fn from_clipboard(data: &str) -> Result<Self, LayoutError> {
        let mut layout = Self::new();
        layout.load_from_text(data)?;
        Ok(layout)
    }

    /// Reads attribute `key` of the cursor's current node.
    ///
    /// Both absent and explicit null yield `None`.
    pub fn property(&self, key: &str) -> Option<String> {
        self.cursor.read_string(key, None)
    }

    /// Returns `true` if the cursor's current node carries attribute `key`.
    pub fn has_property(&self, key: &str) -> bool {
        self.cursor.has_attribute(key)
    }
}

impl fmt::Display for LayoutDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = self.to_xml().map_err(|_| fmt::Error)?;
        f.write_str(&xml)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
