//! # Catalog API Provider
//!
//! Implements `CatalogProvider` for the upstream music-metadata Web API.
//!
//! ## Overview
//!
//! This module provides:
//! - Track, artist and album lookups by upstream id
//! - Label search: paged album search followed by per-album label filtering
//! - Playlist track listing across all pages
//! - Token re-acquisition on 401, backoff on 503, `Retry-After` on 429

pub mod connector;
pub mod error;
pub mod types;

pub use connector::SpotifyConnector;
pub use error::{Result, SpotifyError};
