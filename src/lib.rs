//! Workspace placeholder crate.
//!
//! This crate exposes the `desktop-shims` feature, which wires the catalog
//! service façade (`core-service`) to the Redis, SQLite and reqwest adapters.
//! Host applications can depend on `label-catalog-workspace` instead of
//! wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
