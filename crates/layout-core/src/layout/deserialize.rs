//! Layout document → element tree.
//!
//! The walk mirrors the document shape: for each node it resolves the tag,
//! creates the element (or decides not to), descends into the children with
//! the new parent context, and then moves across to the next sibling.
//!
//! Nodes that cannot be created are reported as [`Diagnostic`]s rather than
//! errors.  What happens to *their* children is governed by
//! [`UnresolvedPolicy`].

use std::fmt;
use std::sync::Arc;

use tracing::{error, warn};

use super::{LayoutDocument, LayoutError, DEFAULT_MAX_DEPTH};
use crate::document::DocumentCursor;
use crate::element::{ElementId, ElementTree};
use crate::registry::ElementRegistry;

/// What to do with the children of a node that is not instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedPolicy {
    /// Traverse the children against the same parent context, as if the
    /// node were not there.
    #[default]
    Flatten,
    /// Skip the whole subtree.
    SkipSubtree,
}

/// Tuning knobs for [`LayoutDocument::deserialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeserializeOptions {
    /// Leave internal element types out at the top level of the walk.
    pub ignore_internal: bool,
    pub unresolved: UnresolvedPolicy,
    /// Deepest node level accepted; the first level below the root is 1.
    pub max_depth: usize,
}

impl Default for DeserializeOptions {
    fn default() -> Self {
        Self {
            ignore_internal: false,
            unresolved: UnresolvedPolicy::Flatten,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A recoverable anomaly met while deserializing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// No element type is registered for the tag.
    UnresolvedNodeType { tag: String, depth: usize },
    /// An internal element was left out because internal types were ignored.
    InternalSkipped { tag: String },
    /// The element type may not be placed under its parent's type.
    RejectedPlacement { tag: String, parent: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedNodeType { tag, depth } => {
                write!(f, "unrecognized tag <{tag}> at depth {depth}")
            }
            Self::InternalSkipped { tag } => write!(f, "internal element <{tag}> skipped"),
            Self::RejectedPlacement { tag, parent } => {
                write!(f, "<{tag}> may not be placed under <{parent}>")
            }
        }
    }
}

/// Result of a successful [`LayoutDocument::deserialize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deserialized {
    /// First element created at the top level of the walk, if any.
    pub root: Option<ElementId>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LayoutDocument {
    /// Rebuilds the layout's elements under `parent` in `tree`.
    ///
    /// After a successful walk the new subtree is activated once, from the
    /// root of its tree.
    ///
    /// With `parent: None` every top-level node becomes a separate tree
    /// root.  Only the first of them is returned and activated; later ones
    /// stay in `tree` inactive (see [`ElementTree::roots`]).  Pass a parent
    /// to keep all top-level nodes in one tree.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Conversion`] when an attribute cannot be
    /// converted and [`LayoutError::DepthExceeded`] past
    /// [`DeserializeOptions::max_depth`].  On error every element created by
    /// this call is removed again, leaving `tree` as it was.
    pub fn deserialize(
        &mut self,
        registry: &ElementRegistry,
        tree: &mut ElementTree,
        parent: Option<ElementId>,
        options: &DeserializeOptions,
    ) -> Result<Deserialized, LayoutError> {
        self.cursor.move_top();
        if !self.cursor.move_down() {
            return Ok(Deserialized::default());
        }

        let mut walk = Walk {
            registry,
            tree,
            options,
            diagnostics: Vec::new(),
            created: Vec::new(),
        };
        match walk.siblings(&mut self.cursor, parent, options.ignore_internal) {
            Ok(root) => {
                if let Some(id) = root {
                    let top = walk.tree.root_of(id);
                    walk.tree.activate(top);
                }
                Ok(Deserialized {
                    root,
                    diagnostics: walk.diagnostics,
                })
            }
            Err(err) => {
                walk.rollback();
                Err(err)
            }
        }
    }
}

/// Outcome of visiting one node.
enum Step {
    Created(ElementId),
    /// Not instantiated; children go to the same parent.
    Flatten { ignore_internal: bool },
    /// Not instantiated; children are not visited.
    Skip,
}

struct Walk<'a> {
    registry: &'a ElementRegistry,
    tree: &'a mut ElementTree,
    options: &'a DeserializeOptions,
    diagnostics: Vec<Diagnostic>,
    created: Vec<ElementId>,
}

impl Walk<'_> {
    /// Visits the current node and every following sibling.
    ///
    /// Returns the first element created at this level, including elements
    /// lifted up from a flattened node.
    fn siblings(
        &mut self,
        cursor: &mut DocumentCursor,
        parent: Option<ElementId>,
        ignore_internal: bool,
    ) -> Result<Option<ElementId>, LayoutError> {
        let mut first = None;
        loop {
            let created = self.node(cursor, parent, ignore_internal)?;
            first = first.or(created);
            if !cursor.move_next() {
                return Ok(first);
            }
        }
    }

    fn node(
        &mut self,
        cursor: &mut DocumentCursor,
        parent: Option<ElementId>,
        ignore_internal: bool,
    ) -> Result<Option<ElementId>, LayoutError> {
        let depth = cursor.depth();
        if depth > self.options.max_depth {
            return Err(LayoutError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }

        let step = self.resolve(cursor, parent, ignore_internal)?;
        let (child_parent, child_ignore, element) = match step {
            Step::Created(id) => (Some(id), false, Some(id)),
            Step::Flatten { ignore_internal } => (parent, ignore_internal, None),
            Step::Skip => return Ok(None),
        };

        if !cursor.move_down() {
            return Ok(element);
        }
        let nested = self.siblings(cursor, child_parent, child_ignore);
        cursor.move_up();
        let nested = nested?;
        Ok(element.or(nested))
    }

    fn resolve(
        &mut self,
        cursor: &DocumentCursor,
        parent: Option<ElementId>,
        ignore_internal: bool,
    ) -> Result<Step, LayoutError> {
        let tag = cursor.object_name();

        let Some(descriptor) = self.registry.resolve(tag) else {
            error!(tag, depth = cursor.depth(), "unrecognized tag encountered in layout");
            self.diagnostics.push(Diagnostic::UnresolvedNodeType {
                tag: tag.to_string(),
                depth: cursor.depth(),
            });
            return Ok(self.unresolved(ignore_internal));
        };

        if ignore_internal && descriptor.is_internal() {
            warn!(tag, "internal element skipped");
            self.diagnostics
                .push(Diagnostic::InternalSkipped { tag: tag.to_string() });
            return Ok(self.unresolved(false));
        }

        let parent_descriptor = parent
            .and_then(|id| self.tree.get(id))
            .map(|el| Arc::clone(el.descriptor()));
        if let Some(parent_descriptor) = parent_descriptor {
            if !descriptor.can_be_placed_under(Some(parent_descriptor.as_ref())) {
                warn!(tag, parent = parent_descriptor.tag(), "element placement rejected");
                self.diagnostics.push(Diagnostic::RejectedPlacement {
                    tag: tag.to_string(),
                    parent: parent_descriptor.tag().to_string(),
                });
                return Ok(Step::Skip);
            }
        }

        let id = descriptor.create_instance(self.tree, parent, cursor)?;
        self.created.push(id);
        Ok(Step::Created(id))
    }

    fn unresolved(&self, ignore_internal: bool) -> Step {
        match self.options.unresolved {
            UnresolvedPolicy::Flatten => Step::Flatten { ignore_internal },
            UnresolvedPolicy::SkipSubtree => Step::Skip,
        }
    }

    fn rollback(&mut self) {
        for &id in self.created.iter().rev() {
            self.tree.remove(id);
        }
        self.created.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
