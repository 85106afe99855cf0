//! Application layer use cases for the layout host.
//!
//! Use cases orchestrate `layout_core` objects to fulfil one user goal and
//! depend only on the [`layout_core::LayoutStore`] abstraction, so the same
//! code runs against the file store, a test mock or any other backend.
//!
//! # Sub-modules
//!
//! - **`open_layout`** – Loads a stored layout and rebuilds its element tree
//!   under a desktop, collecting diagnostics for anything it had to drop.
//!
//! - **`save_layout`** – Serializes an element tree and stores it under a
//!   shared or private name.  Also provides `normalize`, which re-serializes
//!   an opened layout in canonical form.

pub mod open_layout;
pub mod save_layout;
