//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for server and desktop hosts.
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` with a bounded per-request timeout
//! - `CacheBackend` using `redis` (multiplexed, auto-reconnecting connection)
//! - `CacheBackend` held in process memory, for tests and single-node runs
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{RedisCacheBackend, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let cache = RedisCacheBackend::connect("redis://127.0.0.1:6379").await?;
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod http;
mod memory;
mod redis_cache;

pub use http::{ReqwestHttpClient, DEFAULT_TIMEOUT};
pub use memory::MemoryCacheBackend;
pub use redis_cache::RedisCacheBackend;
