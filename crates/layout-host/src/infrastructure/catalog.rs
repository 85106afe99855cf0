//! The element types this host knows how to persist.
//!
//! | Tag            | Properties                                   | Placement                 |
//! |----------------|----------------------------------------------|---------------------------|
//! | `desktop`      | `title`                                      | top of a tree             |
//! | `toolbar`      | `align` (`end` / `start` / `center`)         | anywhere                  |
//! | `menubar`      | none (internal)                              | anywhere                  |
//! | `splitterview` | `orientation` (`horizontal` / `vertical`)    | children: `splitterpane`  |
//! | `splitterpane` | `size`, `relative`                           | parent: `splitterview`    |
//! | `tabview`      | `orientation` (`top` / `bottom` / `left` / `right`) | children: `tabpane` |
//! | `tabpane`      | `label`, `visible`                           | parent: `tabview`         |
//! | `plugin`       | `url`, `label`, `visible`, `height`          | anywhere                  |

use layout_core::{DuplicateAction, ElementRegistry, PropertyDescriptor, RegistryError, TypeDescriptor};

/// Builds the registry of every element type in this catalog.
///
/// # Errors
///
/// Returns [`RegistryError::Duplicate`] if the catalog lists a tag twice.
pub fn standard_registry() -> Result<ElementRegistry, RegistryError> {
    let mut registry = ElementRegistry::with_duplicate_action(DuplicateAction::Error);
    for descriptor in standard_types() {
        registry.register(descriptor)?;
    }
    Ok(registry)
}

fn standard_types() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::new("desktop")
            .with_allowed_parents(Vec::<String>::new())
            .with_property(PropertyDescriptor::text("title")),
        TypeDescriptor::new("toolbar")
            .with_property(PropertyDescriptor::choice("align", ["end", "start", "center"])),
        TypeDescriptor::new("menubar").internal(),
        TypeDescriptor::new("splitterview")
            .with_allowed_children(["splitterpane"])
            .with_property(PropertyDescriptor::choice("orientation", ["horizontal", "vertical"])),
        TypeDescriptor::new("splitterpane")
            .with_allowed_parents(["splitterview"])
            .with_property(PropertyDescriptor::double("size"))
            .with_property(PropertyDescriptor::boolean("relative").with_default(Some(true.into()))),
        TypeDescriptor::new("tabview")
            .with_allowed_children(["tabpane"])
            .with_property(PropertyDescriptor::choice(
                "orientation",
                ["top", "bottom", "left", "right"],
            )),
        TypeDescriptor::new("tabpane")
            .with_allowed_parents(["tabview"])
            .with_property(PropertyDescriptor::text("label"))
            .with_property(PropertyDescriptor::boolean("visible").with_default(Some(true.into()))),
        TypeDescriptor::new("plugin")
            .with_property(PropertyDescriptor::text("url"))
            .with_property(PropertyDescriptor::text("label"))
            .with_property(PropertyDescriptor::boolean("visible").with_default(Some(true.into())))
            .with_property(PropertyDescriptor::integer("height")),
    ]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
