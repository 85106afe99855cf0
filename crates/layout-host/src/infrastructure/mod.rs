//! Infrastructure layer for the layout host.
//!
//! Contains the file-system facing adapters and the concrete element
//! catalog registered with the engine.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `layout_core`, but MUST NOT be imported by the `application` layer.

pub mod catalog;
pub mod storage;
