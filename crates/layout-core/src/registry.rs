//! Element type registry: maps a document tag to the type that handles it.
//!
//! A [`TypeDescriptor`] is everything the persistence engine knows about an
//! element type:
//!
//! - its tag name;
//! - its static property list (see [`PropertyDescriptor`]);
//! - whether it is *internal* (created by the shell itself and never
//!   persisted);
//! - which parent and child tags it accepts;
//! - the [`ElementFactory`] that instantiates it.
//!
//! The registry is read-only while a layout is being traversed; descriptors
//! are handed out as `Arc`s so elements can keep a reference to their type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::document::DocumentCursor;
use crate::element::{ElementId, ElementTree};
use crate::layout::LayoutError;
use crate::property::PropertyDescriptor;

/// Errors raised while registering element types.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    /// A type with the same tag is already registered and the registry is
    /// configured with [`DuplicateAction::Error`].
    #[error("element type <{0}> is already registered")]
    Duplicate(String),
}

/// What [`ElementRegistry::register`] does when the tag is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateAction {
    /// The new descriptor replaces the old one.
    #[default]
    Replace,
    /// The old descriptor is kept and the new one dropped.
    Ignore,
    /// Registration fails with [`RegistryError::Duplicate`].
    Error,
}

/// Instantiates an element while a layout is being deserialized.
///
/// The factory receives the cursor positioned on the element's node so it
/// can read whatever attributes it needs.
pub trait ElementFactory: Send + Sync {
    /// Creates an element of type `descriptor` under `parent` in `tree`.
    ///
    /// On error nothing may be left behind in `tree`.
    fn create(
        &self,
        descriptor: &Arc<TypeDescriptor>,
        tree: &mut ElementTree,
        parent: Option<ElementId>,
        source: &DocumentCursor,
    ) -> Result<ElementId, LayoutError>;
}

/// The default factory: inserts the element and hydrates every declared
/// property from the current node.
///
/// Absent attributes take the declared default; explicit nulls become null.
#[derive(Debug, Clone, Copy, Default)]
pub struct HydratingFactory;

impl ElementFactory for HydratingFactory {
    fn create(
        &self,
        descriptor: &Arc<TypeDescriptor>,
        tree: &mut ElementTree,
        parent: Option<ElementId>,
        source: &DocumentCursor,
    ) -> Result<ElementId, LayoutError> {
        // Convert everything first so a bad attribute leaves the tree untouched.
        let mut values = Vec::with_capacity(descriptor.properties().len());
        for property in descriptor.properties() {
            let value = property
                .read_from(source)
                .map_err(|source| LayoutError::Conversion {
                    tag: descriptor.tag().to_string(),
                    property: property.id().to_string(),
                    source,
                })?;
            values.push((property.id(), value));
        }

        let id = tree.insert(Arc::clone(descriptor), parent)?;
        for (name, value) in values {
            tree.set_property(id, name, value);
        }
        Ok(id)
    }
}

/// Registry entry describing one element type.
pub struct TypeDescriptor {
    tag: String,
    internal: bool,
    properties: Vec<PropertyDescriptor>,
    allowed_children: Option<Vec<String>>,
    allowed_parents: Option<Vec<String>>,
    factory: Arc<dyn ElementFactory>,
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("tag", &self.tag)
            .field("internal", &self.internal)
            .field("properties", &self.properties)
            .field("allowed_children", &self.allowed_children)
            .field("allowed_parents", &self.allowed_parents)
            .finish_non_exhaustive()
    }
}

impl TypeDescriptor {
    /// Creates a non-internal type with no properties that accepts any
    /// parent and any child, instantiated by [`HydratingFactory`].
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            internal: false,
            properties: Vec::new(),
            allowed_children: None,
            allowed_parents: None,
            factory: Arc::new(HydratingFactory),
        }
    }

    /// Marks the type as internal: it is never serialized and may be skipped
    /// on deserialize.
    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Restricts child types to `tags`.
    pub fn with_allowed_children<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_children = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Restricts parent types to `tags`.
    pub fn with_allowed_parents<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_parents = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_factory(mut self, factory: impl ElementFactory + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// The declared properties, in declaration order.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Looks up a declared property by id.
    pub fn property(&self, id: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.id() == id)
    }

    /// Returns `true` if an element of this type may sit under `parent`.
    ///
    /// `None` (top of a tree) is always allowed.
    pub fn can_be_placed_under(&self, parent: Option<&TypeDescriptor>) -> bool {
        let Some(parent) = parent else {
            return true;
        };
        let child_ok = parent
            .allowed_children
            .as_ref()
            .map_or(true, |tags| tags.iter().any(|t| *t == self.tag));
        let parent_ok = self
            .allowed_parents
            .as_ref()
            .map_or(true, |tags| tags.iter().any(|t| *t == parent.tag));
        child_ok && parent_ok
    }

    /// Instantiates this type under `parent` via its factory.
    ///
    /// # Errors
    ///
    /// Propagates whatever the factory reports.
    pub fn create_instance(
        self: &Arc<Self>,
        tree: &mut ElementTree,
        parent: Option<ElementId>,
        source: &DocumentCursor,
    ) -> Result<ElementId, LayoutError> {
        self.factory.create(self, tree, parent, source)
    }
}

/// Lookup table from tag name to [`TypeDescriptor`].
#[derive(Debug, Default)]
pub struct ElementRegistry {
    types: HashMap<String, Arc<TypeDescriptor>>,
    duplicate_action: DuplicateAction,
}

impl ElementRegistry {
    /// Creates an empty registry that replaces duplicates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given duplicate policy.
    pub fn with_duplicate_action(duplicate_action: DuplicateAction) -> Self {
        Self {
            types: HashMap::new(),
            duplicate_action,
        }
    }

    /// Registers `descriptor` and returns the descriptor now bound to its tag.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when the tag is taken and the
    /// policy is [`DuplicateAction::Error`].
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<Arc<TypeDescriptor>, RegistryError> {
        if let Some(existing) = self.types.get(descriptor.tag()) {
            match self.duplicate_action {
                DuplicateAction::Ignore => return Ok(Arc::clone(existing)),
                DuplicateAction::Error => {
                    return Err(RegistryError::Duplicate(descriptor.tag().to_string()))
                }
                DuplicateAction::Replace => {
                    warn!(tag = descriptor.tag(), "replacing registered element type");
                }
            }
        }
        debug!(tag = descriptor.tag(), "registered element type");
        let descriptor = Arc::new(descriptor);
        self.types
            .insert(descriptor.tag().to_string(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Returns the type registered for `tag`, if any.
    pub fn resolve(&self, tag: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(tag).cloned()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.types.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyValue;

    #[test]
    fn test_register_then_resolve_returns_same_descriptor() {
        let mut registry = ElementRegistry::new();
        let registered = registry.register(TypeDescriptor::new("toolbar")).unwrap();
        let resolved = registry.resolve("toolbar").expect("registered");
        assert!(Arc::ptr_eq(&registered, &resolved));
        assert!(registry.resolve("menubar").is_none());
    }

    #[test]
    fn test_register_replace_policy_overwrites() {
        let mut registry = ElementRegistry::new();
        registry.register(TypeDescriptor::new("pane")).unwrap();
        registry.register(TypeDescriptor::new("pane").internal()).unwrap();
        assert!(registry.resolve("pane").unwrap().is_internal());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_ignore_policy_keeps_first() {
        let mut registry = ElementRegistry::with_duplicate_action(DuplicateAction::Ignore);
        registry.register(TypeDescriptor::new("pane")).unwrap();
        let kept = registry.register(TypeDescriptor::new("pane").internal()).unwrap();
        assert!(!kept.is_internal());
    }

    #[test]
    fn test_register_error_policy_rejects_duplicate() {
        let mut registry = ElementRegistry::with_duplicate_action(DuplicateAction::Error);
        registry.register(TypeDescriptor::new("pane")).unwrap();
        assert_eq!(
            registry.register(TypeDescriptor::new("pane")).unwrap_err(),
            RegistryError::Duplicate("pane".into())
        );
    }

    #[test]
    fn test_tags_are_sorted() {
        let mut registry = ElementRegistry::new();
        for tag in ["toolbar", "desktop", "pane"] {
            registry.register(TypeDescriptor::new(tag)).unwrap();
        }
        assert_eq!(registry.tags(), vec!["desktop", "pane", "toolbar"]);
    }

    #[test]
    fn test_placement_checks_both_sides() {
        let tabview = TypeDescriptor::new("tabview").with_allowed_children(["tabpane"]);
        let tabpane = TypeDescriptor::new("tabpane").with_allowed_parents(["tabview"]);
        let toolbar = TypeDescriptor::new("toolbar");

        assert!(tabpane.can_be_placed_under(Some(&tabview)));
        assert!(!toolbar.can_be_placed_under(Some(&tabview)));
        assert!(!tabpane.can_be_placed_under(Some(&toolbar)));
        assert!(tabpane.can_be_placed_under(None));
    }

    #[test]
    fn test_hydrating_factory_reads_defaults_nulls_and_values() {
        // Arrange
        let descriptor = Arc::new(
            TypeDescriptor::new("pane")
                .with_property(PropertyDescriptor::text("label").with_default(Some("Untitled".into())))
                .with_property(PropertyDescriptor::text("hint").with_default(Some("none".into())))
                .with_property(PropertyDescriptor::integer("size")),
        );
        let cursor =
            DocumentCursor::parse(r#"<layout><pane hint="\null\" size="12"/></layout>"#).unwrap();
        let mut tree = ElementTree::new();

        // Act
        let id = descriptor.create_instance(&mut tree, None, &cursor).unwrap();

        // Assert
        let el = tree.get(id).unwrap();
        assert_eq!(el.property("label"), Some(&PropertyValue::Text("Untitled".into())));
        assert_eq!(el.property_slot("hint"), Some(None));
        assert_eq!(el.property("size"), Some(&PropertyValue::Integer(12)));
    }

    #[test]
    fn test_hydrating_factory_leaves_tree_untouched_on_conversion_error() {
        let descriptor =
            Arc::new(TypeDescriptor::new("pane").with_property(PropertyDescriptor::integer("size")));
        let cursor = DocumentCursor::parse(r#"<layout><pane size="big"/></layout>"#).unwrap();
        let mut tree = ElementTree::new();

        let result = descriptor.create_instance(&mut tree, None, &cursor);

        assert!(matches!(
            result,
            Err(LayoutError::Conversion { ref property, .. }) if property == "size"
        ));
        assert!(tree.is_empty());
    }
}
