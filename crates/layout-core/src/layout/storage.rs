//! Where layout text comes from and goes to.
//!
//! The engine never touches a file system or a network.  Everything outside
//! the process is reached through the [`LayoutStore`] trait, which a host
//! implements (see the `layout-host` crate for a file-backed one).
//!
//! # Resource addresses
//!
//! | Form            | Meaning                                      |
//! |-----------------|----------------------------------------------|
//! | `app:<id>`      | the layout associated with application `<id>` |
//! | `shared:<name>` | the shared layout called `<name>`             |
//! | `private:<name>`| the current user's layout called `<name>`     |
//! | anything else   | a resource locator handed to the store as is  |

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, error};

use super::{LayoutDocument, LayoutError, LAYOUT_VERSION};

const APP_PREFIX: &str = "app:";
const SHARED_PREFIX: &str = "shared:";
const PRIVATE_PREFIX: &str = "private:";

/// Errors reported by a [`LayoutStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// No layout or resource exists under the given name.
    #[error("layout not found: {0}")]
    NotFound(String),

    /// No layout is associated with the application id.
    #[error("no layout is associated with application '{0}'")]
    NoAssociation(String),

    /// The name cannot be used as a layout name.
    #[error("invalid layout name: {0:?}")]
    InvalidName(String),

    /// The backing store failed.
    #[error("I/O error at {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

/// Names a stored layout: shared between users, or private to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutIdentifier {
    name: String,
    shared: bool,
}

impl LayoutIdentifier {
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidName`] for a blank name.
    pub fn new(name: &str, shared: bool) -> Result<Self, StorageError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(Self {
            name: trimmed.to_string(),
            shared,
        })
    }

    pub fn shared(name: &str) -> Result<Self, StorageError> {
        Self::new(name, true)
    }

    pub fn private(name: &str) -> Result<Self, StorageError> {
        Self::new(name, false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }
}

impl fmt::Display for LayoutIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.shared { SHARED_PREFIX } else { PRIVATE_PREFIX };
        write!(f, "{prefix}{}", self.name)
    }
}

impl FromStr for LayoutIdentifier {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = s.strip_prefix(SHARED_PREFIX) {
            Self::shared(name)
        } else if let Some(name) = s.strip_prefix(PRIVATE_PREFIX) {
            Self::private(name)
        } else {
            Err(StorageError::InvalidName(s.to_string()))
        }
    }
}

/// A parsed resource string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceAddress {
    AppId(String),
    Layout(LayoutIdentifier),
    Url(String),
}

impl ResourceAddress {
    /// Splits `resource` on its prefix.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidName`] for `shared:` or `private:` with
    /// a blank name.
    pub fn parse(resource: &str) -> Result<Self, StorageError> {
        if let Some(id) = resource.strip_prefix(APP_PREFIX) {
            Ok(Self::AppId(id.to_string()))
        } else if resource.starts_with(SHARED_PREFIX) || resource.starts_with(PRIVATE_PREFIX) {
            resource.parse().map(Self::Layout)
        } else {
            Ok(Self::Url(resource.to_string()))
        }
    }
}

/// The hosting environment's layout storage.
#[cfg_attr(test, mockall::automock)]
pub trait LayoutStore {
    /// Returns the stored text of layout `id`.
    fn layout_content(&self, id: &LayoutIdentifier) -> Result<String, StorageError>;

    /// Returns the text of the layout associated with application `app_id`.
    fn layout_content_by_app_id(&self, app_id: &str) -> Result<String, StorageError>;

    /// Returns the text of the resource at `locator`.
    fn resource(&self, locator: &str) -> Result<String, StorageError>;

    /// Stores `content` as layout `id`, replacing any previous content.
    fn save_layout(&self, id: &LayoutIdentifier, content: &str) -> Result<(), StorageError>;
}

impl LayoutDocument {
    /// Loads from any resource address (see the module docs).
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Storage`] or [`LayoutError::Malformed`]; the
    /// layout is left empty.
    pub fn load_from_resource(
        &mut self,
        store: &dyn LayoutStore,
        resource: &str,
    ) -> Result<&mut Self, LayoutError> {
        self.clear();
        match ResourceAddress::parse(resource)? {
            ResourceAddress::AppId(app_id) => self.load_by_app_id(store, &app_id),
            ResourceAddress::Layout(id) => self.load_from_property(store, &id),
            ResourceAddress::Url(url) => self.load_from_url(store, &url),
        }
    }

    /// Loads the resource at `url`.
    pub fn load_from_url(&mut self, store: &dyn LayoutStore, url: &str) -> Result<&mut Self, LayoutError> {
        self.clear();
        debug!(url, "loading layout resource");
        let text = store.resource(url)?;
        self.load_from_text(&text)
    }

    /// Loads stored layout `id`.  The loaded name is set to `id`'s name.
    pub fn load_from_property(
        &mut self,
        store: &dyn LayoutStore,
        id: &LayoutIdentifier,
    ) -> Result<&mut Self, LayoutError> {
        self.clear();
        debug!(layout = %id, "loading stored layout");
        let text = store.layout_content(id)?;
        self.load_from_text(&text)?;
        self.set_name(id.name());
        Ok(self)
    }

    /// Loads the layout associated with application `app_id`.
    pub fn load_by_app_id(&mut self, store: &dyn LayoutStore, app_id: &str) -> Result<&mut Self, LayoutError> {
        self.clear();
        debug!(app_id, "loading layout by application id");
        let text = store.layout_content_by_app_id(app_id)?;
        self.load_from_text(&text)
    }

    /// Stamps name and [`LAYOUT_VERSION`] and stores the layout as `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NotLoaded`] unless the layout was loaded or
    /// serialized (a root-only layout saves fine), and
    /// [`LayoutError::Storage`] if the store refuses the write.
    pub fn save_to_property(&mut self, store: &dyn LayoutStore, id: &LayoutIdentifier) -> Result<(), LayoutError> {
        if !self.is_loaded() {
            return Err(LayoutError::NotLoaded);
        }
        self.set_name(id.name());
        self.set_version(LAYOUT_VERSION);
        let xml = self.to_xml()?;
        if let Err(err) = store.save_layout(id, &xml) {
            error!(layout = %id, error = %err, "error saving layout");
            return Err(err.into());
        }
        debug!(layout = %id, bytes = xml.len(), "layout saved");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;

    const SAMPLE: &str = r#"<layout name="Stored" version="2.0"><toolbar align="start"/></layout>"#;

    fn not_found(what: &str) -> StorageError {
        StorageError::NotFound(what.to_string())
    }

    // ── LayoutIdentifier / ResourceAddress ────────────────────────────────────

    #[test]
    fn test_identifier_display_and_parse_agree() {
        let shared = LayoutIdentifier::shared("clinical").unwrap();
        let private = LayoutIdentifier::private("mine").unwrap();

        assert_eq!(shared.to_string(), "shared:clinical");
        assert_eq!(private.to_string(), "private:mine");
        assert_eq!("shared:clinical".parse::<LayoutIdentifier>().unwrap(), shared);
        assert_eq!("private:mine".parse::<LayoutIdentifier>().unwrap(), private);
    }

    #[test]
    fn test_identifier_rejects_blank_or_unprefixed_names() {
        assert!(matches!(LayoutIdentifier::shared("  "), Err(StorageError::InvalidName(_))));
        assert!(matches!(
            "clinical".parse::<LayoutIdentifier>(),
            Err(StorageError::InvalidName(_))
        ));
    }

    #[test]
    fn test_resource_address_dispatches_on_prefix() {
        assert_eq!(
            ResourceAddress::parse("app:chart").unwrap(),
            ResourceAddress::AppId("chart".into())
        );
        assert_eq!(
            ResourceAddress::parse("shared:ward").unwrap(),
            ResourceAddress::Layout(LayoutIdentifier::shared("ward").unwrap())
        );
        assert_eq!(
            ResourceAddress::parse("private:ward").unwrap(),
            ResourceAddress::Layout(LayoutIdentifier::private("ward").unwrap())
        );
        assert_eq!(
            ResourceAddress::parse("layouts/default.xml").unwrap(),
            ResourceAddress::Url("layouts/default.xml".into())
        );
    }

    // ── loads ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_load_from_resource_app_prefix_uses_app_lookup() {
        // Arrange
        let mut store = MockLayoutStore::new();
        store
            .expect_layout_content_by_app_id()
            .with(eq("chart"))
            .times(1)
            .returning(|_| Ok(SAMPLE.to_string()));
        let mut layout = LayoutDocument::new();

        // Act
        layout.load_from_resource(&store, "app:chart").unwrap();

        // Assert
        assert_eq!(layout.name(), Some("Stored"));
        assert_eq!(layout.root_tag(), Some("toolbar"));
    }

    #[test]
    fn test_load_from_resource_private_prefix_forces_identifier_name() {
        let mut store = MockLayoutStore::new();
        store
            .expect_layout_content()
            .withf(|id| id.name() == "mine" && !id.is_shared())
            .times(1)
            .returning(|_| Ok(SAMPLE.to_string()));
        let mut layout = LayoutDocument::new();

        layout.load_from_resource(&store, "private:mine").unwrap();

        assert_eq!(layout.name(), Some("mine"));
        assert_eq!(layout.version(), Some("2.0"));
    }

    #[test]
    fn test_load_from_resource_plain_locator_uses_resource_lookup() {
        let mut store = MockLayoutStore::new();
        store
            .expect_resource()
            .with(eq("layouts/default.xml"))
            .times(1)
            .returning(|_| Ok(SAMPLE.to_string()));
        let mut layout = LayoutDocument::new();

        layout.load_from_resource(&store, "layouts/default.xml").unwrap();

        assert_eq!(layout.name(), Some("Stored"));
    }

    #[test]
    fn test_load_failure_from_store_leaves_layout_empty() {
        let mut store = MockLayoutStore::new();
        store
            .expect_layout_content()
            .returning(|id| Err(not_found(id.name())));
        let mut layout = LayoutDocument::new();
        layout.load_from_text(SAMPLE).unwrap();

        let result = layout.load_from_property(&store, &LayoutIdentifier::shared("gone").unwrap());

        assert!(matches!(result, Err(LayoutError::Storage(StorageError::NotFound(_)))));
        assert!(layout.is_empty());
        assert_eq!(layout.name(), None);
    }

    #[test]
    fn test_load_of_malformed_stored_text_leaves_layout_empty() {
        let mut store = MockLayoutStore::new();
        store
            .expect_layout_content_by_app_id()
            .returning(|_| Ok("<layout><open></layout>".to_string()));
        let mut layout = LayoutDocument::new();

        let result = layout.load_by_app_id(&store, "chart");

        assert!(matches!(result, Err(LayoutError::Malformed(_))));
        assert!(layout.is_empty());
    }

    // ── save ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_save_to_property_stamps_name_and_version() {
        // Arrange
        let mut store = MockLayoutStore::new();
        store
            .expect_save_layout()
            .withf(|id, content| {
                id.name() == "ward"
                    && id.is_shared()
                    && content.contains(r#"name="ward""#)
                    && content.contains(r#"version="3.0""#)
                    && content.contains(r#"<toolbar align="start"/>"#)
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let mut layout = LayoutDocument::new();
        layout.load_from_text(SAMPLE).unwrap();

        // Act
        layout
            .save_to_property(&store, &LayoutIdentifier::shared("ward").unwrap())
            .unwrap();

        // Assert
        assert_eq!(layout.name(), Some("ward"));
        assert_eq!(layout.version(), Some(LAYOUT_VERSION));
    }

    #[test]
    fn test_save_to_property_propagates_store_failure() {
        let mut store = MockLayoutStore::new();
        store.expect_save_layout().returning(|id, _| {
            Err(StorageError::Io {
                location: id.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        });
        let mut layout = LayoutDocument::new();
        layout.load_from_text(SAMPLE).unwrap();

        let result = layout.save_to_property(&store, &LayoutIdentifier::private("mine").unwrap());

        assert!(matches!(result, Err(LayoutError::Storage(StorageError::Io { .. }))));
    }

    #[test]
    fn test_save_to_property_refuses_layout_never_loaded() {
        let store = MockLayoutStore::new();
        let mut layout = LayoutDocument::new();

        let result = layout.save_to_property(&store, &LayoutIdentifier::shared("ward").unwrap());

        assert!(matches!(result, Err(LayoutError::NotLoaded)));
    }

    #[test]
    fn test_save_to_property_accepts_loaded_layout_without_children() {
        // Arrange
        let mut store = MockLayoutStore::new();
        store
            .expect_save_layout()
            .withf(|_, content| content.contains(r#"title="Ward""#) && !content.contains("</layout>"))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut layout = LayoutDocument::new();
        layout.load_from_text(r#"<layout title="Ward"/>"#).unwrap();
        assert!(layout.is_empty());

        // Act
        let result = layout.save_to_property(&store, &LayoutIdentifier::shared("ward").unwrap());

        // Assert
        assert!(result.is_ok());
    }
}
