//! # layout-core
//!
//! The layout persistence engine: turns a live tree of configurable UI
//! elements into a portable XML document and rebuilds the tree from that
//! document later, possibly in another process, after an upgrade, or against
//! a partly different set of available element types.
//!
//! This crate has no file-system, network or UI dependencies.  Storage is
//! reached through the [`LayoutStore`] trait, implemented by the host.
//!
//! # Architecture overview (for beginners)
//!
//! Leaves first:
//!
//! - **`property`** – Typed property values ([`PropertyValue`]), one
//!   [`AttributeCodec`](property::codec::AttributeCodec) per property type to
//!   convert them to and from attribute text, and the per-type
//!   `(name, codec, default)` declarations ([`PropertyDescriptor`]).
//!
//! - **`registry`** – Maps a document tag to a [`TypeDescriptor`]: the
//!   type's properties, which parents and children it accepts, whether it
//!   is internal (never persisted), and the factory that creates it.
//!
//! - **`element`** – The live [`ElementTree`] being persisted.
//!
//! - **`document`** – The persisted form: an arena of tagged, attributed
//!   nodes, its XML reader/writer, and the single [`DocumentCursor`] used to
//!   walk and grow it.
//!
//! - **`layout`** – [`LayoutDocument`], which serializes an element tree
//!   through the cursor, deserializes a document back into a tree, and loads
//!   and saves document text through a [`LayoutStore`].
//!
//! # Example
//!
//! Elements are rebuilt under a root context (here a `desktop`) and the
//! context is what gets serialized: its children become the top-level nodes.
//!
//! ```
//! use layout_core::{
//!     DeserializeOptions, ElementRegistry, ElementTree, LayoutDocument, PropertyDescriptor,
//!     TypeDescriptor,
//! };
//!
//! let mut registry = ElementRegistry::new();
//! let desktop = registry.register(TypeDescriptor::new("desktop")).unwrap();
//! registry
//!     .register(TypeDescriptor::new("toolbar").with_property(
//!         PropertyDescriptor::choice("align", ["start", "center", "end"])
//!             .with_default(Some("end".into())),
//!     ))
//!     .unwrap();
//!
//! let mut layout = LayoutDocument::new();
//! layout
//!     .load_from_text(r#"<layout name="L" version="1"><toolbar align="start"/></layout>"#)
//!     .unwrap();
//!
//! let mut tree = ElementTree::new();
//! let root = tree.insert(desktop, None).unwrap();
//! let outcome = layout
//!     .deserialize(&registry, &mut tree, Some(root), &DeserializeOptions::default())
//!     .unwrap();
//! assert_eq!(tree.get(outcome.root.unwrap()).unwrap().tag(), "toolbar");
//!
//! let copy = LayoutDocument::serialize(&tree, root).unwrap();
//! assert_eq!(copy.root_tag(), Some("toolbar"));
//! assert!(copy.to_xml().unwrap().contains(r#"<toolbar align="start"/>"#));
//! ```

pub mod document;
pub mod element;
pub mod layout;
pub mod property;
pub mod registry;

// Re-export the most-used types at the crate root so callers can write
// `layout_core::LayoutDocument` instead of `layout_core::layout::LayoutDocument`.
pub use document::{AttributeSlot, Document, DocumentCursor, DocumentError, NodeId};
pub use element::{Element, ElementId, ElementTree, Snapshot, TreeError};
pub use layout::{
    DeserializeOptions, Deserialized, Diagnostic, LayoutDocument, LayoutError, LayoutIdentifier,
    LayoutStore, ResourceAddress, StorageError, UnresolvedPolicy, DEFAULT_MAX_DEPTH,
    LAYOUT_VERSION,
};
pub use property::codec::ConversionError;
pub use property::{PropertyDescriptor, PropertyValue};
pub use registry::{
    DuplicateAction, ElementFactory, ElementRegistry, HydratingFactory, RegistryError,
    TypeDescriptor,
};
