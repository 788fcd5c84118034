//! # Host Bridge Traits
//!
//! Abstraction traits for every external collaborator the catalog core talks to.
//!
//! ## Overview
//!
//! This crate defines the contract between the core crates and concrete
//! adapters. Each trait represents a capability that the core requires but
//! whose implementation depends on the deployment (Redis vs. in-process
//! store, reqwest vs. a test double).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP with bounded timeouts
//! - [`CacheBackend`](cache::CacheBackend) - Command-style key-value store (get/set/expire/type/sets)
//! - [`CatalogProvider`](catalog::CatalogProvider) - Upstream music-metadata service
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! | Capability | Implementation |
//! |------------|----------------|
//! | `HttpClient` | `bridge_desktop::ReqwestHttpClient` |
//! | `CacheBackend` | `bridge_desktop::RedisCacheBackend`, `bridge_desktop::MemoryCacheBackend` |
//! | `CatalogProvider` | `provider_spotify::SpotifyConnector` |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Adapters should
//! map their native errors so that [`BridgeError::is_transient`] is accurate:
//! callers rely on it to decide between retrying and failing fast.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so adapters can be shared behind
//! `Arc<dyn Trait>` across async tasks.

pub mod cache;
pub mod catalog;
pub mod error;
pub mod http;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use cache::{CacheBackend, ValueKind};
pub use catalog::{
    AlbumRef, ArtistRef, CatalogProvider, EntityKind, RemoteAlbum, RemoteArtist, RemoteEntity,
    RemoteTrack,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use time::{Clock, FixedClock, SystemClock};
