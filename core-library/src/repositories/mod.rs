//! Repository pattern implementations for catalog data access
//!
//! Each repository wraps a `SqlitePool`; writes go through
//! [`CatalogWriter`](crate::writer::CatalogWriter) so the same statements
//! run inside and outside import transactions.

pub mod artist;
pub mod label;
pub mod pagination;
pub mod release;
pub mod track;

pub use artist::{ArtistRepository, SqliteArtistRepository};
pub use label::{LabelRepository, SqliteLabelRepository};
pub use pagination::{Page, PageRequest, MAX_PAGE_SIZE};
pub use release::{ReleaseRepository, SqliteReleaseRepository};
pub use track::{SqliteTrackRepository, TrackRepository};
