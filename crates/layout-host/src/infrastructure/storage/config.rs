//! TOML-based configuration for the layout host.
//!
//! Reads and writes `HostConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\LayoutHost\config.toml`
//! - Linux:    `~/.config/layout-host/config.toml`
//! - macOS:    `~/Library/Application Support/LayoutHost/config.toml`
//!
//! Example:
//!
//! ```toml
//! [engine]
//! unresolved_policy = "flatten"   # or "skip_subtree"
//! max_depth = 64
//! ignore_internal = false
//!
//! [storage]
//! root = "/var/lib/layout-host"
//! user = "default"
//! log_level = "info"
//!
//! [associations]
//! chart = "shared:clinical"
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "...")]`, so a missing file, a
//! missing section, or a section written by an older version all load
//! cleanly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use layout_core::{DeserializeOptions, UnresolvedPolicy, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level host configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Application id → layout address (`shared:NAME`, `private:NAME`, or a
    /// bare shared layout name).
    #[serde(default)]
    pub associations: BTreeMap<String, String>,
}

/// On-disk spelling of [`UnresolvedPolicy`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicySetting {
    #[default]
    Flatten,
    SkipSubtree,
}

impl From<PolicySetting> for UnresolvedPolicy {
    fn from(value: PolicySetting) -> Self {
        match value {
            PolicySetting::Flatten => Self::Flatten,
            PolicySetting::SkipSubtree => Self::SkipSubtree,
        }
    }
}

/// Deserialize behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub unresolved_policy: PolicySetting,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Skip internal element types at the top level of a load.
    #[serde(default)]
    pub ignore_internal: bool,
}

/// Where layouts live and who the current user is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Contains `shared/`, `users/<user>/` and `resources/`.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Owner of `private:` layouts.
    #[serde(default = "default_user")]
    pub user: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}
fn default_storage_root() -> PathBuf {
    platform_config_dir()
        .map(|dir| dir.join("layouts"))
        .unwrap_or_else(|| PathBuf::from("layouts"))
}
fn default_user() -> String {
    "default".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unresolved_policy: PolicySetting::default(),
            max_depth: default_max_depth(),
            ignore_internal: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            user: default_user(),
            log_level: default_log_level(),
        }
    }
}

impl From<&EngineConfig> for DeserializeOptions {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            ignore_internal: cfg.ignore_internal,
            unresolved: cfg.unresolved_policy.into(),
            max_depth: cfg.max_depth,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `HostConfig` from the platform config file.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<HostConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `HostConfig` from `path`, returning `HostConfig::default()` if the
/// file does not exist yet.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<HostConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HostConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to the platform config file.
///
/// # Errors
///
/// See [`save_config_to`].
pub fn save_config(config: &HostConfig) -> Result<(), ConfigError> {
    save_config_to(&config_file_path()?, config)
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &HostConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("LayoutHost"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("layout-host"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("LayoutHost"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("layout_host_cfg_{}", Uuid::new_v4()))
    }

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_engine_config_default_matches_engine_defaults() {
        let options = DeserializeOptions::from(&EngineConfig::default());
        assert_eq!(options, DeserializeOptions::default());
    }

    #[test]
    fn test_storage_config_default_user_and_log_level() {
        let cfg = StorageConfig::default();
        assert_eq!(cfg.user, "default");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.root.ends_with("layouts"));
    }

    // ── TOML ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: HostConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg.engine, EngineConfig::default());
        assert!(cfg.associations.is_empty());
    }

    #[test]
    fn test_deserialize_full_toml() {
        // Arrange
        let toml_str = r#"
[engine]
unresolved_policy = "skip_subtree"
max_depth = 8
ignore_internal = true

[storage]
root = "/srv/layouts"
user = "nurse"

[associations]
chart = "shared:clinical"
"#;

        // Act
        let cfg: HostConfig = toml::from_str(toml_str).expect("deserialize");

        // Assert
        let options = DeserializeOptions::from(&cfg.engine);
        assert_eq!(options.unresolved, UnresolvedPolicy::SkipSubtree);
        assert_eq!(options.max_depth, 8);
        assert!(options.ignore_internal);
        assert_eq!(cfg.storage.root, PathBuf::from("/srv/layouts"));
        assert_eq!(cfg.storage.user, "nurse");
        assert_eq!(cfg.storage.log_level, "info");
        assert_eq!(cfg.associations["chart"], "shared:clinical");
    }

    #[test]
    fn test_deserialize_unknown_policy_is_rejected() {
        let result: Result<HostConfig, _> = toml::from_str("[engine]\nunresolved_policy = \"drop\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_host_config_round_trips_through_toml() {
        let mut cfg = HostConfig::default();
        cfg.engine.unresolved_policy = PolicySetting::SkipSubtree;
        cfg.associations.insert("orders".into(), "private:mine".into());

        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: HostConfig = toml::from_str(&toml_str).expect("deserialize");

        assert_eq!(cfg, restored);
    }

    // ── load / save ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let path = temp_dir().join("config.toml");
        assert_eq!(load_config_from(&path).unwrap(), HostConfig::default());
    }

    #[test]
    fn test_save_then_load_config_via_temp_dir() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("nested").join("config.toml");
        let mut cfg = HostConfig::default();
        cfg.engine.max_depth = 12;
        cfg.storage.user = "clerk".to_string();

        // Act
        save_config_to(&path, &cfg).unwrap();
        let loaded = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_from_malformed_file_returns_parse_error() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("config.toml"), "got {path:?}");
        }
    }
}
