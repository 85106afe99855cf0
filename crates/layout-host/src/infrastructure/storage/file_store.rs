//! File-system implementation of [`LayoutStore`].
//!
//! Directory layout under the storage root:
//!
//! ```text
//! <root>/
//!   shared/<name>.xml          shared:<name>
//!   users/<user>/<name>.xml    private:<name> for the configured user
//!   resources/<path>           plain resource locators
//! ```
//!
//! Application associations come from the `[associations]` config table.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use layout_core::{LayoutIdentifier, LayoutStore, StorageError};
use tracing::debug;

use super::config::HostConfig;

const LAYOUT_EXTENSION: &str = "xml";
const FILE_SCHEME: &str = "file://";

/// Stores layouts as XML files below a root directory.
#[derive(Debug, Clone)]
pub struct FileLayoutStore {
    root: PathBuf,
    user: String,
    associations: BTreeMap<String, String>,
}

impl FileLayoutStore {
    pub fn new(root: impl Into<PathBuf>, user: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            user: user.into(),
            associations: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &HostConfig) -> Self {
        Self::new(&config.storage.root, &config.storage.user)
            .with_associations(config.associations.clone())
    }

    pub fn with_associations(mut self, associations: BTreeMap<String, String>) -> Self {
        self.associations = associations;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Lists stored layouts of one kind, sorted by name.
    ///
    /// A missing directory lists as empty.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be read and
    /// [`StorageError::InvalidName`] for an unusable user name.
    pub fn list_layouts(&self, shared: bool) -> Result<Vec<LayoutIdentifier>, StorageError> {
        let dir = self.layout_dir(shared)?;
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(io_error(&dir, source)),
        };

        let mut layouts = Vec::new();
        for entry in entries {
            let path = entry.map_err(|source| io_error(&dir, source))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LAYOUT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                layouts.push(LayoutIdentifier::new(stem, shared)?);
            }
        }
        layouts.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(layouts)
    }

    fn layout_dir(&self, shared: bool) -> Result<PathBuf, StorageError> {
        if shared {
            Ok(self.root.join("shared"))
        } else {
            Ok(self.root.join("users").join(path_segment(&self.user)?))
        }
    }

    fn layout_path(&self, id: &LayoutIdentifier) -> Result<PathBuf, StorageError> {
        let name = path_segment(id.name())?;
        Ok(self
            .layout_dir(id.is_shared())?
            .join(format!("{name}.{LAYOUT_EXTENSION}")))
    }

    fn resource_path(&self, locator: &str) -> Result<PathBuf, StorageError> {
        let path = Path::new(locator.strip_prefix(FILE_SCHEME).unwrap_or(locator));
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(StorageError::InvalidName(locator.to_string()));
        }
        Ok(self.root.join("resources").join(path))
    }
}

impl LayoutStore for FileLayoutStore {
    fn layout_content(&self, id: &LayoutIdentifier) -> Result<String, StorageError> {
        let path = self.layout_path(id)?;
        debug!(layout = %id, path = %path.display(), "reading layout");
        read(&path, || id.to_string())
    }

    fn layout_content_by_app_id(&self, app_id: &str) -> Result<String, StorageError> {
        let target = self
            .associations
            .get(app_id)
            .ok_or_else(|| StorageError::NoAssociation(app_id.to_string()))?;
        let id = match target.parse::<LayoutIdentifier>() {
            Ok(id) => id,
            Err(_) => LayoutIdentifier::shared(target)?,
        };
        self.layout_content(&id)
    }

    fn resource(&self, locator: &str) -> Result<String, StorageError> {
        let path = self.resource_path(locator)?;
        debug!(locator, path = %path.display(), "reading layout resource");
        read(&path, || locator.to_string())
    }

    fn save_layout(&self, id: &LayoutIdentifier, content: &str) -> Result<(), StorageError> {
        let path = self.layout_path(id)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| io_error(dir, source))?;
        }
        std::fs::write(&path, content).map_err(|source| io_error(&path, source))?;
        debug!(layout = %id, path = %path.display(), "layout written");
        Ok(())
    }
}

/// Accepts `segment` only if it names a single directory entry.
fn path_segment(segment: &str) -> Result<&str, StorageError> {
    if segment.is_empty() || segment.contains(['/', '\\']) || segment == "." || segment == ".." {
        return Err(StorageError::InvalidName(segment.to_string()));
    }
    Ok(segment)
}

fn read(path: &Path, what: impl FnOnce() -> String) -> Result<String, StorageError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(what())),
        Err(source) => Err(io_error(path, source)),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        location: path.display().to_string(),
        source,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
