//! OpenLayoutUseCase: loads a stored layout and rebuilds its element tree.
//!
//! # The desktop round trip (for beginners)
//!
//! A desktop is always the top of an element tree.  When a desktop is saved,
//! its own properties are written on the `<layout>` node and its children
//! become the top-level nodes.  Opening reverses that: the desktop is
//! created first from the `<layout>` node's attributes, and the rest of the
//! document is deserialized underneath it.
//!
//! A layout whose first top-level node is itself a `<desktop>` (a subtree
//! copy) is deserialized without a parent instead.  Internal elements at the
//! top level are then skipped whatever the configured `ignore_internal`.

use layout_core::{
    DeserializeOptions, Deserialized, ElementId, ElementRegistry, ElementTree, LayoutDocument,
    LayoutError, LayoutStore,
};
use thiserror::Error;
use tracing::{info, warn};

/// Tag of the element type that anchors every opened layout.
pub const DESKTOP_TAG: &str = "desktop";

/// Error type for opening a layout.
#[derive(Debug, Error)]
pub enum OpenLayoutError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// The registry has no desktop type to anchor the layout.
    #[error("element type <{DESKTOP_TAG}> is not registered")]
    MissingDesktop,

    /// The layout produced no element at all.
    #[error("layout '{0}' contains no elements")]
    NoElements(String),
}

/// A loaded layout together with the tree rebuilt from it.
#[derive(Debug)]
pub struct OpenedLayout {
    pub layout: LayoutDocument,
    pub tree: ElementTree,
    /// Top of the rebuilt tree.
    pub desktop: ElementId,
    pub outcome: Deserialized,
}

/// Loads layouts from a store and rebuilds them against a registry.
pub struct OpenLayoutUseCase<'a> {
    store: &'a dyn LayoutStore,
    registry: &'a ElementRegistry,
    options: DeserializeOptions,
}

impl<'a> OpenLayoutUseCase<'a> {
    pub fn new(store: &'a dyn LayoutStore, registry: &'a ElementRegistry, options: DeserializeOptions) -> Self {
        Self {
            store,
            registry,
            options,
        }
    }

    /// Opens `resource` (any address accepted by
    /// [`LayoutDocument::load_from_resource`]).
    ///
    /// # Errors
    ///
    /// Returns [`OpenLayoutError::Layout`] if loading or deserializing fails,
    /// [`OpenLayoutError::MissingDesktop`] if the registry cannot anchor the
    /// tree, and [`OpenLayoutError::NoElements`] if nothing was created.
    pub fn open(&self, resource: &str) -> Result<OpenedLayout, OpenLayoutError> {
        let mut layout = LayoutDocument::new();
        layout.load_from_resource(self.store, resource)?;
        self.rebuild(layout, resource)
    }

    /// Rebuilds the element tree of an already loaded layout.
    ///
    /// # Errors
    ///
    /// As for [`OpenLayoutUseCase::open`].
    pub fn rebuild(&self, mut layout: LayoutDocument, label: &str) -> Result<OpenedLayout, OpenLayoutError> {
        let mut tree = ElementTree::new();

        let (desktop, outcome) = if layout.root_tag() == Some(DESKTOP_TAG) {
            let options = DeserializeOptions {
                ignore_internal: true,
                ..self.options
            };
            let outcome = layout.deserialize(self.registry, &mut tree, None, &options)?;
            let desktop = outcome
                .root
                .ok_or_else(|| OpenLayoutError::NoElements(label.to_string()))?;
            (desktop, outcome)
        } else {
            let descriptor = self
                .registry
                .resolve(DESKTOP_TAG)
                .ok_or(OpenLayoutError::MissingDesktop)?;
            let cursor = layout.cursor_mut();
            cursor.move_top();
            let desktop = descriptor.create_instance(&mut tree, None, cursor)?;
            let outcome = layout.deserialize(self.registry, &mut tree, Some(desktop), &self.options)?;
            if outcome.root.is_none() {
                tree.activate(desktop);
            }
            (desktop, outcome)
        };

        for diagnostic in &outcome.diagnostics {
            warn!(layout = label, "{diagnostic}");
        }
        info!(
            layout = label,
            elements = tree.len(),
            diagnostics = outcome.diagnostics.len(),
            "layout opened"
        );

        Ok(OpenedLayout {
            layout,
            tree,
            desktop,
            outcome,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
