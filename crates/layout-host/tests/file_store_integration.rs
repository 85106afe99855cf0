//! Integration tests for the file-backed layout store.
//!
//! These tests exercise the application layer of layout-host end-to-end:
//! `OpenLayoutUseCase` + `SaveLayoutUseCase` + `FileLayoutStore` on a
//! temporary directory.

use std::collections::BTreeMap;
use std::path::PathBuf;

use layout_core::{
    DeserializeOptions, LayoutDocument, LayoutError, LayoutIdentifier, LayoutStore, PropertyValue,
    StorageError, DEFAULT_MAX_DEPTH,
};
use layout_host::application::open_layout::OpenLayoutUseCase;
use layout_host::application::save_layout::SaveLayoutUseCase;
use layout_host::infrastructure::catalog::standard_registry;
use layout_host::infrastructure::storage::config::HostConfig;
use layout_host::infrastructure::storage::FileLayoutStore;
use uuid::Uuid;

const CLINIC: &str = r#"<layout name="clinic" version="3.0" title="Clinic">
    <toolbar align="center"/>
    <splitterview orientation="vertical">
        <splitterpane size="0.3"><plugin url="patients.html" label="Patients"/></splitterpane>
        <splitterpane size="0.7" relative="false">
            <tabview>
                <tabpane label="Orders"/>
                <tabpane label="Notes" visible="false"/>
            </tabview>
        </splitterpane>
    </splitterview>
</layout>"#;

/// Removes the temporary root when the test finishes, pass or fail.
struct TempRoot(PathBuf);

impl TempRoot {
    fn new() -> Self {
        Self(std::env::temp_dir().join(format!("layout_host_it_{}", Uuid::new_v4())))
    }
}

impl Drop for TempRoot {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn store(root: &TempRoot) -> FileLayoutStore {
    FileLayoutStore::new(&root.0, "nurse")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn test_open_save_reopen_preserves_tree() {
    let root = TempRoot::new();
    let store = store(&root);
    let registry = standard_registry().expect("catalog");
    store
        .save_layout(&LayoutIdentifier::shared("clinic").unwrap(), CLINIC)
        .expect("seed layout");

    let opener = OpenLayoutUseCase::new(&store, &registry, DeserializeOptions::default());
    let first = opener.open("shared:clinic").expect("first open");
    assert!(first.outcome.diagnostics.is_empty());

    let copy = LayoutIdentifier::private("clinic-copy").unwrap();
    SaveLayoutUseCase::new(&store, DEFAULT_MAX_DEPTH)
        .save_opened(&first, &copy)
        .expect("save copy");
    let second = opener.open("private:clinic-copy").expect("second open");

    assert_eq!(
        first.tree.snapshot(first.desktop),
        second.tree.snapshot(second.desktop),
        "the tree must survive a save and reload unchanged"
    );
    assert_eq!(second.layout.name(), Some("clinic-copy"));
    assert_eq!(second.layout.version(), Some("3.0"));
}

#[test]
fn test_saved_file_omits_default_values() {
    let root = TempRoot::new();
    let store = store(&root);
    let registry = standard_registry().expect("catalog");
    store
        .save_layout(
            &LayoutIdentifier::shared("noisy").unwrap(),
            r#"<layout><tabview orientation="top"><tabpane label="A" visible="true"/></tabview></layout>"#,
        )
        .unwrap();

    let opened = OpenLayoutUseCase::new(&store, &registry, DeserializeOptions::default())
        .open("shared:noisy")
        .unwrap();
    let id = LayoutIdentifier::shared("quiet").unwrap();
    SaveLayoutUseCase::new(&store, DEFAULT_MAX_DEPTH)
        .save_opened(&opened, &id)
        .unwrap();

    let written = std::fs::read_to_string(root.0.join("shared").join("quiet.xml")).unwrap();
    assert!(written.contains("<tabview>"), "{written}");
    assert!(written.contains(r#"<tabpane label="A"/>"#), "{written}");
}

#[test]
fn test_list_layouts_separates_shared_and_private() {
    let root = TempRoot::new();
    let store = store(&root);
    for id in ["shared:beta", "shared:alpha", "private:mine"] {
        let id: LayoutIdentifier = id.parse().unwrap();
        store.save_layout(&id, CLINIC).unwrap();
    }
    std::fs::write(root.0.join("shared").join("notes.txt"), "ignored").unwrap();

    let shared = store.list_layouts(true).unwrap();
    let private = store.list_layouts(false).unwrap();

    let names: Vec<&str> = shared.iter().map(LayoutIdentifier::name).collect();
    assert_eq!(names, ["alpha", "beta"]);
    assert_eq!(private, vec![LayoutIdentifier::private("mine").unwrap()]);
}

#[test]
fn test_private_layouts_are_per_user() {
    let root = TempRoot::new();
    let id = LayoutIdentifier::private("desk").unwrap();
    FileLayoutStore::new(&root.0, "alice").save_layout(&id, CLINIC).unwrap();

    let bob = FileLayoutStore::new(&root.0, "bob");

    assert!(matches!(bob.layout_content(&id), Err(StorageError::NotFound(_))));
}

#[test]
fn test_app_association_loads_mapped_layout() {
    let root = TempRoot::new();
    let associations = BTreeMap::from([
        ("chart".to_string(), "private:charting".to_string()),
        ("orders".to_string(), "clinic".to_string()),
    ]);
    let store = store(&root).with_associations(associations);
    store
        .save_layout(&LayoutIdentifier::private("charting").unwrap(), CLINIC)
        .unwrap();
    store
        .save_layout(&LayoutIdentifier::shared("clinic").unwrap(), CLINIC)
        .unwrap();

    let mut by_prefix = LayoutDocument::new();
    by_prefix.load_from_resource(&store, "app:chart").unwrap();
    let mut by_bare_name = LayoutDocument::new();
    by_bare_name.load_by_app_id(&store, "orders").unwrap();

    assert_eq!(by_prefix.property("title").as_deref(), Some("Clinic"));
    assert_eq!(by_bare_name.root_tag(), Some("toolbar"));
}

#[test]
fn test_resources_resolve_below_resources_dir() {
    let root = TempRoot::new();
    let store = store(&root);
    let dir = root.0.join("resources").join("defaults");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("ward.xml"), CLINIC).unwrap();
    let registry = standard_registry().unwrap();

    let opened = OpenLayoutUseCase::new(&store, &registry, DeserializeOptions::default())
        .open("defaults/ward.xml")
        .unwrap();

    let desktop = opened.tree.get(opened.desktop).unwrap();
    assert_eq!(desktop.property("title"), Some(&PropertyValue::Text("Clinic".into())));
    assert_eq!(opened.layout.name(), Some("clinic"));
}

#[test]
fn test_missing_layout_leaves_document_empty() {
    let root = TempRoot::new();
    let store = store(&root);
    let mut layout = LayoutDocument::new();

    let result = layout.load_from_resource(&store, "shared:absent");

    assert!(matches!(result, Err(LayoutError::Storage(StorageError::NotFound(_)))));
    assert!(layout.is_empty());
    assert_eq!(layout.name(), None);
}

#[test]
fn test_store_built_from_config_uses_configured_user() {
    let root = TempRoot::new();
    let mut config = HostConfig::default();
    config.storage.root = root.0.clone();
    config.storage.user = "carol".into();
    config
        .associations
        .insert("chart".into(), "shared:clinic".into());

    let store = FileLayoutStore::from_config(&config);
    store
        .save_layout(&LayoutIdentifier::private("x").unwrap(), CLINIC)
        .unwrap();

    assert!(root.0.join("users").join("carol").join("x.xml").is_file());
    assert!(matches!(
        store.layout_content_by_app_id("chart"),
        Err(StorageError::NotFound(_))
    ));
}
