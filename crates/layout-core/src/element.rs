//! The live element tree that layouts are serialized from and rebuilt into.
//!
//! Elements live in an arena owned by [`ElementTree`] and are addressed by
//! [`ElementId`].  Slots of removed elements are left empty rather than
//! compacted, so ids handed out earlier never change meaning.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::property::PropertyValue;
use crate::registry::TypeDescriptor;

/// Errors raised by structural tree operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TreeError {
    /// The id does not name a live element.
    #[error("element {0:?} does not exist")]
    Missing(ElementId),

    /// The parent type does not accept the child type, or vice versa.
    #[error("<{child}> may not be placed under <{parent}>")]
    Placement { parent: String, child: String },
}

/// Index of an [`Element`] inside its [`ElementTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// One live, configurable UI element.
#[derive(Debug, Clone)]
pub struct Element {
    descriptor: Arc<TypeDescriptor>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    /// `None` values are explicit nulls.
    properties: BTreeMap<String, Option<PropertyValue>>,
    active: bool,
}

impl Element {
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn tag(&self) -> &str {
        self.descriptor.tag()
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the current value of `name`; `None` if null or undeclared.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name).and_then(Option::as_ref)
    }

    /// Returns the current value of `name` including null, or `None` if the
    /// property is not declared on this element's type.
    pub fn property_slot(&self, name: &str) -> Option<Option<&PropertyValue>> {
        self.properties.get(name).map(Option::as_ref)
    }
}

/// A comparable, arena-independent image of an element subtree.
///
/// Two trees are equivalent for persistence purposes when their snapshots
/// are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tag: String,
    pub properties: Vec<(String, Option<PropertyValue>)>,
    pub children: Vec<Snapshot>,
}

/// Arena of live elements.
///
/// Ids are never reused: removing an element (including the rollback of a
/// failed deserialize) empties its slot for good, so a stale [`ElementId`]
/// keeps resolving to `None`.  The arena therefore grows with every insert;
/// long-lived trees that churn elements should be rebuilt rather than
/// patched indefinitely.
#[derive(Debug, Default)]
pub struct ElementTree {
    slots: Vec<Option<Element>>,
    activations: usize,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an element of type `descriptor` under `parent` with every
    /// declared property at its default.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Missing`] for an unknown parent and
    /// [`TreeError::Placement`] when either type forbids the relationship.
    pub fn insert(
        &mut self,
        descriptor: Arc<TypeDescriptor>,
        parent: Option<ElementId>,
    ) -> Result<ElementId, TreeError> {
        if let Some(parent_id) = parent {
            let parent_el = self.get(parent_id).ok_or(TreeError::Missing(parent_id))?;
            if !descriptor.can_be_placed_under(Some(parent_el.descriptor().as_ref())) {
                return Err(TreeError::Placement {
                    parent: parent_el.tag().to_string(),
                    child: descriptor.tag().to_string(),
                });
            }
        }

        let properties = descriptor
            .properties()
            .iter()
            .map(|p| (p.id().to_string(), p.default_value().cloned()))
            .collect();

        let id = ElementId(self.slots.len());
        self.slots.push(Some(Element {
            descriptor,
            parent,
            children: Vec::new(),
            properties,
            active: false,
        }));
        if let Some(parent_id) = parent {
            if let Some(parent_el) = self.get_mut(parent_id) {
                parent_el.children.push(id);
            }
        }
        Ok(id)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Sets property `name` on element `id`.  `None` stores a null.
    ///
    /// Returns `false` if the element does not exist or does not declare
    /// the property.
    pub fn set_property(&mut self, id: ElementId, name: &str, value: Option<PropertyValue>) -> bool {
        match self.get_mut(id).and_then(|el| el.properties.get_mut(name)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Returns the children of `id` whose types are not internal.
    pub fn serializable_children(&self, id: ElementId) -> Vec<ElementId> {
        self.get(id)
            .map(|el| {
                el.children
                    .iter()
                    .copied()
                    .filter(|&child| self.get(child).map_or(false, |c| !c.descriptor.is_internal()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Follows parent links from `id` to the top of its tree.
    pub fn root_of(&self, id: ElementId) -> ElementId {
        let mut current = id;
        while let Some(parent) = self.get(current).and_then(Element::parent) {
            current = parent;
        }
        current
    }

    /// Live elements without a parent, in insertion order.
    pub fn roots(&self) -> Vec<ElementId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.as_ref().is_some_and(|el| el.parent.is_none()))
            .map(|(index, _)| ElementId(index))
            .collect()
    }

    /// Removes `id` and all of its descendants, detaching it from its parent.
    ///
    /// Returns `false` if `id` was not live.  The slot is not reused.
    pub fn remove(&mut self, id: ElementId) -> bool {
        let Some(element) = self.slots.get_mut(id.0).and_then(Option::take) else {
            return false;
        };
        if let Some(parent) = element.parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|&c| c != id);
        }
        let mut pending = element.children;
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.slots.get_mut(child.0).and_then(Option::take) {
                pending.extend(removed.children);
            }
        }
        true
    }

    /// Marks `id` and every descendant active.
    ///
    /// Returns the number of elements that were not active before.
    pub fn activate(&mut self, id: ElementId) -> usize {
        self.activations += 1;
        let mut newly_active = 0;
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(el) = self.get_mut(current) {
                if !el.active {
                    el.active = true;
                    newly_active += 1;
                }
                pending.extend(el.children.iter().copied());
            }
        }
        newly_active
    }

    /// Number of [`ElementTree::activate`] calls made on this tree.
    pub fn activation_count(&self) -> usize {
        self.activations
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Captures the subtree under `id`, or `None` if `id` is not live.
    pub fn snapshot(&self, id: ElementId) -> Option<Snapshot> {
        let el = self.get(id)?;
        Some(Snapshot {
            tag: el.tag().to_string(),
            properties: el
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            children: el
                .children
                .iter()
                .filter_map(|&child| self.snapshot(child))
                .collect(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyDescriptor;

    fn desktop() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::new("desktop").with_property(PropertyDescriptor::text("title")))
    }

    fn tabview() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::new("tabview").with_allowed_children(["tabpane"]))
    }

    fn tabpane() -> Arc<TypeDescriptor> {
        Arc::new(
            TypeDescriptor::new("tabpane")
                .with_allowed_parents(["tabview"])
                .with_property(PropertyDescriptor::boolean("visible").with_default(Some(true.into()))),
        )
    }

    #[test]
    fn test_insert_initialises_properties_to_defaults() {
        let mut tree = ElementTree::new();
        let desk = tree.insert(desktop(), None).unwrap();
        let view = tree.insert(tabview(), Some(desk)).unwrap();
        let pane = tree.insert(tabpane(), Some(view)).unwrap();

        let el = tree.get(pane).unwrap();
        assert_eq!(el.property("visible"), Some(&PropertyValue::Boolean(true)));
        assert_eq!(tree.get(desk).unwrap().property_slot("title"), Some(None));
        assert_eq!(tree.get(view).unwrap().children(), &[pane]);
    }

    #[test]
    fn test_insert_rejects_forbidden_placement() {
        let mut tree = ElementTree::new();
        let desk = tree.insert(desktop(), None).unwrap();
        let result = tree.insert(tabpane(), Some(desk));
        assert_eq!(
            result,
            Err(TreeError::Placement {
                parent: "desktop".into(),
                child: "tabpane".into()
            })
        );
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_set_property_ignores_undeclared_names() {
        let mut tree = ElementTree::new();
        let desk = tree.insert(desktop(), None).unwrap();
        assert!(tree.set_property(desk, "title", Some("Main".into())));
        assert!(!tree.set_property(desk, "colour", Some("red".into())));
        assert_eq!(
            tree.get(desk).unwrap().property("title"),
            Some(&PropertyValue::Text("Main".into()))
        );
    }

    #[test]
    fn test_remove_drops_descendants_and_detaches_from_parent() {
        let mut tree = ElementTree::new();
        let desk = tree.insert(desktop(), None).unwrap();
        let view = tree.insert(tabview(), Some(desk)).unwrap();
        let pane = tree.insert(tabpane(), Some(view)).unwrap();

        assert!(tree.remove(view));

        assert!(tree.get(pane).is_none());
        assert!(tree.get(desk).unwrap().children().is_empty());
        assert_eq!(tree.len(), 1);
        assert!(!tree.remove(view));
    }

    #[test]
    fn test_removed_ids_are_never_reused() {
        let mut tree = ElementTree::new();
        let desk = tree.insert(desktop(), None).unwrap();
        let view = tree.insert(tabview(), Some(desk)).unwrap();
        tree.remove(view);

        let again = tree.insert(tabview(), Some(desk)).unwrap();

        assert_ne!(again, view);
        assert!(tree.get(view).is_none());
        assert_eq!(tree.slots.len(), 3);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_roots_lists_parentless_elements() {
        let mut tree = ElementTree::new();
        let first = tree.insert(desktop(), None).unwrap();
        tree.insert(tabview(), Some(first)).unwrap();
        let second = tree.insert(tabview(), None).unwrap();

        assert_eq!(tree.roots(), vec![first, second]);
    }

    #[test]
    fn test_activate_marks_whole_subtree_once() {
        let mut tree = ElementTree::new();
        let desk = tree.insert(desktop(), None).unwrap();
        let view = tree.insert(tabview(), Some(desk)).unwrap();
        tree.insert(tabpane(), Some(view)).unwrap();

        assert_eq!(tree.activate(tree.root_of(view)), 3);
        assert_eq!(tree.activate(desk), 0);
        assert_eq!(tree.activation_count(), 2);
        assert!(tree.get(view).unwrap().is_active());
    }

    #[test]
    fn test_serializable_children_skip_internal_types() {
        let internal = Arc::new(TypeDescriptor::new("menubar").internal());
        let mut tree = ElementTree::new();
        let desk = tree.insert(desktop(), None).unwrap();
        tree.insert(internal, Some(desk)).unwrap();
        let view = tree.insert(tabview(), Some(desk)).unwrap();

        assert_eq!(tree.serializable_children(desk), vec![view]);
    }
}
