//! Element tree → layout document.

use super::{LayoutDocument, LayoutError, DEFAULT_MAX_DEPTH};
use crate::document::DocumentCursor;
use crate::element::{ElementId, ElementTree, TreeError};

impl LayoutDocument {
    /// Serializes the subtree rooted at `root` into a fresh layout.
    ///
    /// If `root` is the top of its tree, its own properties are written on the
    /// `<layout>` node and its children become the top-level nodes; otherwise
    /// `root` itself becomes the single top-level node.
    ///
    /// A parentless `root` loses its tag: nothing in the document records
    /// which type it was, and deserializing the result does not recreate it.
    /// To persist an element with its tag, give it a parent (typically a
    /// desktop) and serialize that parent instead.
    ///
    /// Only serializable properties whose value differs from the declared
    /// default are written.  Internal children are left out.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Conversion`] if a codec rejects a value and
    /// [`LayoutError::DepthExceeded`] past [`DEFAULT_MAX_DEPTH`].  No partial
    /// layout is returned.
    pub fn serialize(tree: &ElementTree, root: ElementId) -> Result<Self, LayoutError> {
        Self::serialize_with_limit(tree, root, DEFAULT_MAX_DEPTH)
    }

    /// [`LayoutDocument::serialize`] with an explicit nesting limit.
    pub fn serialize_with_limit(
        tree: &ElementTree,
        root: ElementId,
        max_depth: usize,
    ) -> Result<Self, LayoutError> {
        let mut layout = Self::new();
        write_element(&mut layout.cursor, tree, root, max_depth)?;
        layout.loaded = true;
        Ok(layout)
    }
}

fn write_element(
    cursor: &mut DocumentCursor,
    tree: &ElementTree,
    id: ElementId,
    max_depth: usize,
) -> Result<(), LayoutError> {
    let element = tree.get(id).ok_or(TreeError::Missing(id))?;
    let descriptor = element.descriptor();
    let is_root = element.parent().is_none();

    if !is_root {
        cursor.new_child(descriptor.tag());
        if cursor.depth() > max_depth {
            return Err(LayoutError::DepthExceeded { limit: max_depth });
        }
    }

    for property in descriptor.properties().iter().filter(|p| p.is_serializable()) {
        property
            .write_to(cursor, element.property(property.id()))
            .map_err(|source| LayoutError::Conversion {
                tag: descriptor.tag().to_string(),
                property: property.id().to_string(),
                source,
            })?;
    }

    for child in tree.serializable_children(id) {
        write_element(cursor, tree, child, max_depth)?;
    }

    if !is_root {
        cursor.move_up();
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
