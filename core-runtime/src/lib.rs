//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the label catalog core:
//! - Logging and tracing infrastructure
//! - Configuration management (builder + environment loading)
//!
//! ## Overview
//!
//! This crate contains the runtime settings every other crate reads: the
//! relational and cache store locations, upstream credentials and retry
//! policy, and the canonical TTL table for cached entities.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CacheConfig, CoreConfig, CoreConfigBuilder, TtlPolicy, UpstreamConfig};
pub use error::{Error, Result};
