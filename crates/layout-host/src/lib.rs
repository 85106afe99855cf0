//! layout-host library entry point.
//!
//! Wires `layout_core` to a concrete environment: a file-backed
//! [`layout_core::LayoutStore`], the standard element catalog, TOML
//! configuration and the use cases driven by the `layout-host` binary.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.

pub mod application;
pub mod infrastructure;
