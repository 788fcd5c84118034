//! # Catalog Cache
//!
//! Label-scoped cache of upstream catalog entities.
//!
//! ## Overview
//!
//! - [`store`]: retrying key-value wrapper with type checks
//! - [`keys`]: key layout under the configured prefix
//! - [`service`]: read-through entity cache with per-label indexes
//! - [`popularity`]: rolling popularity history per track
//!
//! ## Usage
//!
//! ```ignore
//! use core_cache::{CacheStore, EntityCacheService};
//!
//! let store = CacheStore::new(backend, &config.cache);
//! let cache = EntityCacheService::new(store, provider, &config.cache);
//! let fetched = cache.get_or_fetch(EntityKind::Track, "4uLU6hMCjMI75M1A2tKUQC").await?;
//! println!("served from {}", fetched.source);
//! ```

pub mod error;
pub mod keys;
pub mod models;
pub mod popularity;
pub mod service;
pub mod store;

pub use error::{CacheError, CacheServiceError, Result, ServiceResult};
pub use keys::CacheKeys;
pub use models::{CachedEntry, Fetched, PopularitySample, Source};
pub use popularity::PopularityTracker;
pub use service::EntityCacheService;
pub use store::CacheStore;
