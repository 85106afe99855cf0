//! SaveLayoutUseCase: serializes an element tree and stores it by name.

use layout_core::{ElementId, ElementTree, LayoutDocument, LayoutError, LayoutIdentifier, LayoutStore};
use tracing::info;

use super::open_layout::OpenedLayout;

/// Writes element trees to a [`LayoutStore`].
pub struct SaveLayoutUseCase<'a> {
    store: &'a dyn LayoutStore,
    max_depth: usize,
}

impl<'a> SaveLayoutUseCase<'a> {
    pub fn new(store: &'a dyn LayoutStore, max_depth: usize) -> Self {
        Self { store, max_depth }
    }

    /// Serializes the subtree under `root` and stores it as `id`.
    ///
    /// Returns the layout that was written.
    ///
    /// # Errors
    ///
    /// Returns any serialization or storage error.  A root with no children
    /// still saves, as attributes on `<layout>`.
    pub fn save(
        &self,
        tree: &ElementTree,
        root: ElementId,
        id: &LayoutIdentifier,
    ) -> Result<LayoutDocument, LayoutError> {
        let mut layout = LayoutDocument::serialize_with_limit(tree, root, self.max_depth)?;
        layout.save_to_property(self.store, id)?;
        info!(layout = %id, elements = tree.len(), "layout saved");
        Ok(layout)
    }

    /// Stores an opened layout under a new identifier.
    ///
    /// # Errors
    ///
    /// As for [`SaveLayoutUseCase::save`].
    pub fn save_opened(&self, opened: &OpenedLayout, id: &LayoutIdentifier) -> Result<LayoutDocument, LayoutError> {
        self.save(&opened.tree, opened.desktop, id)
    }
}

/// Re-serializes an opened layout, dropping whatever the registry did not
/// recognize and every attribute equal to its default.
///
/// # Errors
///
/// Returns any serialization error.
pub fn normalize(opened: &OpenedLayout, max_depth: usize) -> Result<LayoutDocument, LayoutError> {
    let mut layout = LayoutDocument::serialize_with_limit(&opened.tree, opened.desktop, max_depth)?;
    if let Some(name) = opened.layout.name() {
        layout.set_name(name);
    }
    Ok(layout)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
