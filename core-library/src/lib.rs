//! # Label Catalog Store
//!
//! Owns the relational side of the catalog: the SQLite schema and
//! migrations, repositories for labels, artists, releases and tracks, the
//! label-name normalizer, and the attribution resolver that decides which
//! artists belong to a label.
//!
//! ## Overview
//!
//! - [`db`]: connection pooling and embedded migrations
//! - [`labels`]: canonical label identifiers and aliases
//! - [`repositories`]: per-table data access with pagination
//! - [`writer`]: find-or-create writes usable inside a transaction
//! - [`attribution`]: label rosters and release lists

pub mod attribution;
pub mod db;
pub mod error;
pub mod labels;
pub mod models;
pub mod repositories;
pub mod writer;

pub use attribution::{AttributionError, AttributionPredicate, AttributionResolver};
pub use error::{LibraryError, Result};
pub use models::{Artist, ArtistCredit, ArtistRole, Label, Release, ReleaseType, Track};
pub use writer::{CatalogWriter, Upserted};
