//! Storage infrastructure: configuration and layout file persistence.
//!
//! - `config` reads and writes the TOML configuration from the platform
//!   config directory, falling back to defaults on first run.
//! - `file_store` implements the engine's `LayoutStore` on top of a storage
//!   root directory.

pub mod config;
pub mod file_store;

pub use file_store::FileLayoutStore;
