//! # Core Configuration Module
//!
//! Provides configuration management for the label catalog core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! that holds every setting the core needs: where the relational store and the
//! cache backend live, upstream API credentials and retry behaviour, and the
//! TTL policy for cached entities. Validation is fail-fast: `build()` rejects
//! missing credentials or nonsensical limits with an actionable message.
//!
//! ## Usage
//!
//! ### From the environment
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! // DATABASE_URL, SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET are required;
//! // REDIS_URL, CACHE_KEY_PREFIX and UPSTREAM_TIMEOUT_SECS are optional.
//! let config = CoreConfig::from_env()?;
//! ```
//!
//! ### Explicit
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, UpstreamConfig};
//!
//! let config = CoreConfig::builder()
//!     .database_url("sqlite://catalog.db")
//!     .redis_url("redis://127.0.0.1:6379")
//!     .upstream(UpstreamConfig::new("client-id", "client-secret"))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::redact_if_sensitive;
use bridge_traits::catalog::EntityKind;
use std::time::Duration;

const DAY_SECS: u64 = 24 * 60 * 60;

/// Canonical TTL table for cached entities.
///
/// `*_ttl` values are hard expiries enforced by the cache backend.
/// `*_freshness` values are the ages under which a cached copy is served
/// without consulting upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlPolicy {
    pub track_ttl: Duration,
    pub artist_ttl: Duration,
    pub album_ttl: Duration,
    pub search_ttl: Duration,
    pub label_index_ttl: Duration,
    /// Rolling window kept in popularity histories
    pub popularity_window: Duration,
    pub track_freshness: Duration,
    pub artist_freshness: Duration,
    pub album_freshness: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            track_ttl: Duration::from_secs(DAY_SECS),
            artist_ttl: Duration::from_secs(7 * DAY_SECS),
            album_ttl: Duration::from_secs(7 * DAY_SECS),
            search_ttl: Duration::from_secs(3600),
            label_index_ttl: Duration::from_secs(DAY_SECS),
            popularity_window: Duration::from_secs(30 * DAY_SECS),
            track_freshness: Duration::from_secs(3600),
            artist_freshness: Duration::from_secs(DAY_SECS),
            album_freshness: Duration::from_secs(DAY_SECS),
        }
    }
}

impl TtlPolicy {
    /// Hard expiry for an entity of `kind`
    pub fn entity_ttl(&self, kind: EntityKind) -> Duration {
        match kind {
            EntityKind::Track => self.track_ttl,
            EntityKind::Artist => self.artist_ttl,
            EntityKind::Album => self.album_ttl,
        }
    }

    /// Freshness window for an entity of `kind`
    pub fn freshness(&self, kind: EntityKind) -> Duration {
        match kind {
            EntityKind::Track => self.track_freshness,
            EntityKind::Artist => self.artist_freshness,
            EntityKind::Album => self.album_freshness,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let all = [
            ("track_ttl", self.track_ttl),
            ("artist_ttl", self.artist_ttl),
            ("album_ttl", self.album_ttl),
            ("search_ttl", self.search_ttl),
            ("label_index_ttl", self.label_index_ttl),
            ("popularity_window", self.popularity_window),
        ];
        for (name, value) in all {
            if value.as_secs() == 0 {
                return Err(Error::Config(format!("{} must be at least one second", name)));
            }
        }
        for kind in [EntityKind::Track, EntityKind::Artist, EntityKind::Album] {
            if self.freshness(kind) > self.entity_ttl(kind) {
                return Err(Error::Config(format!(
                    "{} freshness window exceeds its TTL",
                    kind
                )));
            }
        }
        Ok(())
    }
}

/// Cache layer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Namespace prepended to every key (`{prefix}:track:{id}`)
    pub key_prefix: String,
    /// Attempts per cache command, including the first
    pub retry_attempts: u32,
    /// Base delay; attempt `n` waits `base * 2^n`
    pub retry_base_delay: Duration,
    pub ttl: TtlPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: "catalog".to_string(),
            retry_attempts: 3,
            retry_base_delay: Duration::from_millis(50),
            ttl: TtlPolicy::default(),
        }
    }
}

impl CacheConfig {
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_retry(mut self, attempts: u32, base_delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn with_ttl(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_prefix.is_empty() || self.key_prefix.contains(char::is_whitespace) {
            return Err(Error::Config(
                "Cache key prefix must be non-empty and contain no whitespace".to_string(),
            ));
        }
        if self.key_prefix.contains('*') {
            return Err(Error::Config(
                "Cache key prefix must not contain glob characters".to_string(),
            ));
        }
        if !(1..=10).contains(&self.retry_attempts) {
            return Err(Error::Config(
                "Cache retry attempts must be between 1 and 10".to_string(),
            ));
        }
        self.ttl.validate()
    }
}

/// Upstream music-metadata API settings
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub client_id: String,
    pub client_secret: String,
    /// OAuth2 client-credentials token endpoint
    pub token_url: String,
    /// REST API base, without trailing slash
    pub api_base_url: String,
    /// Per-request timeout (abort on expiry)
    pub request_timeout: Duration,
    /// Attempts for 503/429 responses, including the first
    pub max_attempts: u32,
    pub backoff_base: Duration,
    /// Cap applied to 503 backoff
    pub backoff_cap: Duration,
    /// Page size for label searches
    pub search_page_size: u32,
    /// Fixed delay between search pages
    pub page_delay: Duration,
    /// Page size for playlist items
    pub playlist_page_size: u32,
}

impl UpstreamConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            api_base_url: "https://api.spotify.com/v1".to_string(),
            request_timeout: Duration::from_secs(15),
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
            backoff_cap: Duration::from_secs(3),
            search_page_size: 50,
            page_delay: Duration::from_millis(100),
            playlist_page_size: 100,
        }
    }

    pub fn with_endpoints(
        mut self,
        token_url: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Self {
        self.token_url = token_url.into();
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, max_attempts: u32, base: Duration, cap: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.backoff_base = base;
        self.backoff_cap = cap;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_search_page_size(mut self, page_size: u32) -> Self {
        self.search_page_size = page_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            return Err(Error::Config(
                "Upstream client id and secret are required".to_string(),
            ));
        }
        if !(self.token_url.starts_with("http://") || self.token_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Invalid token URL: {}",
                self.token_url
            )));
        }
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "Invalid API base URL: {}",
                self.api_base_url
            )));
        }
        let timeout = self.request_timeout.as_secs();
        if !(1..=60).contains(&timeout) {
            return Err(Error::Config(
                "Upstream request timeout must be between 1 and 60 seconds".to_string(),
            ));
        }
        if !(1..=5).contains(&self.max_attempts) {
            return Err(Error::Config(
                "Upstream max attempts must be between 1 and 5".to_string(),
            ));
        }
        if !(1..=50).contains(&self.search_page_size) {
            return Err(Error::Config(
                "Search page size must be between 1 and 50".to_string(),
            ));
        }
        if !(1..=100).contains(&self.playlist_page_size) {
            return Err(Error::Config(
                "Playlist page size must be between 1 and 100".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &redact_if_sensitive("client_secret", &self.client_secret),
            )
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_base", &self.backoff_base)
            .field("backoff_cap", &self.backoff_cap)
            .field("search_page_size", &self.search_page_size)
            .field("page_delay", &self.page_delay)
            .field("playlist_page_size", &self.playlist_page_size)
            .finish()
    }
}

/// Core configuration for the label catalog.
///
/// Use [`CoreConfigBuilder`] or [`CoreConfig::from_env`] to construct instances.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// sqlx connection URL of the relational store
    pub database_url: String,

    /// Maximum pooled database connections
    pub database_max_connections: u32,

    /// Redis URL; `None` selects the in-process cache backend
    pub redis_url: Option<String>,

    pub upstream: UpstreamConfig,

    pub cache: CacheConfig,
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Required: `DATABASE_URL`, `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET`.
    /// Optional: `REDIS_URL`, `CACHE_KEY_PREFIX`, `UPSTREAM_TIMEOUT_SECS`,
    /// `DATABASE_MAX_CONNECTIONS`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| Error::MissingEnv(name.to_string()))
        };
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut upstream = UpstreamConfig::new(
            required("SPOTIFY_CLIENT_ID")?,
            required("SPOTIFY_CLIENT_SECRET")?,
        );
        if let Some(raw) = optional("UPSTREAM_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("UPSTREAM_TIMEOUT_SECS must be an integer, got {}", raw))
            })?;
            upstream = upstream.with_request_timeout(Duration::from_secs(secs));
        }

        let mut builder = CoreConfig::builder()
            .database_url(required("DATABASE_URL")?)
            .upstream(upstream);

        if let Some(url) = optional("REDIS_URL") {
            builder = builder.redis_url(url);
        }
        if let Some(prefix) = optional("CACHE_KEY_PREFIX") {
            builder = builder.cache(CacheConfig::default().with_key_prefix(prefix));
        }
        if let Some(raw) = optional("DATABASE_MAX_CONNECTIONS") {
            let max = raw.trim().parse::<u32>().map_err(|_| {
                Error::Config(format!(
                    "DATABASE_MAX_CONNECTIONS must be an integer, got {}",
                    raw
                ))
            })?;
            builder = builder.database_max_connections(max);
        }

        builder.build()
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(Error::Config("Database URL cannot be empty".to_string()));
        }
        if self.database_max_connections == 0 {
            return Err(Error::Config(
                "Database pool needs at least one connection".to_string(),
            ));
        }
        if let Some(url) = &self.redis_url {
            if !(url.starts_with("redis://") || url.starts_with("rediss://")) {
                return Err(Error::Config(format!(
                    "Redis URL must start with redis:// or rediss://, got {}",
                    url
                )));
            }
        }
        self.upstream.validate()?;
        self.cache.validate()
    }
}

/// Builder for [`CoreConfig`]
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_url: Option<String>,
    database_max_connections: Option<u32>,
    redis_url: Option<String>,
    upstream: Option<UpstreamConfig>,
    cache: Option<CacheConfig>,
}

impl CoreConfigBuilder {
    /// Sets the relational store URL (e.g. `sqlite://catalog.db`).
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn database_max_connections(mut self, max: u32) -> Self {
        self.database_max_connections = Some(max);
        self
    }

    /// Sets the Redis URL. Without it the in-process backend is used.
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub fn upstream(mut self, upstream: UpstreamConfig) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the database URL or upstream credentials
    /// are missing, or if any value fails validation.
    pub fn build(self) -> Result<CoreConfig> {
        let database_url = self.database_url.ok_or_else(|| {
            Error::Config("Database URL is required. Use .database_url() to set it.".to_string())
        })?;

        let upstream = self.upstream.ok_or_else(|| {
            Error::Config(
                "Upstream credentials are required. Use .upstream() to set them.".to_string(),
            )
        })?;

        let config = CoreConfig {
            database_url,
            database_max_connections: self.database_max_connections.unwrap_or(5),
            redis_url: self.redis_url,
            upstream,
            cache: self.cache.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
