//! # Catalog Store Pool
//!
//! Opens the SQLite store that holds labels, releases, tracks, artist
//! credits and import logs, and applies the embedded schema migrations.
//!
//! File-backed stores run in WAL mode with foreign keys enforced, so the
//! attribution queries can read while an import transaction is writing.
//!
//! ```rust,ignore
//! use core_library::db::{create_pool, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::from_url("sqlite://catalog.db").max_connections(8)).await?;
//! ```
//!
//! Tests use [`create_test_pool`], an in-memory store with the schema
//! already applied.

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// sqlx URL (`sqlite://catalog.db`) or `sqlite::memory:`
    pub database_url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_url(database_url: impl Into<String>) -> Self {
        let database_url = database_url.into();
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        Self {
            database_url,
            max_connections,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_url("sqlite::memory:")
    }

    /// Ignored for in-memory stores: the data lives in a single connection.
    pub fn max_connections(mut self, max: u32) -> Self {
        if !self.is_in_memory() {
            self.max_connections = max.max(1);
        }
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}

/// Open the pool, apply migrations and check that a query round-trips.
pub async fn create_pool(config: DatabaseConfig) -> Result<SqlitePool> {
    info!(
        database_url = %config.database_url,
        max_connections = config.max_connections,
        "Opening catalog store"
    );

    let mut options =
        SqliteConnectOptions::from_str(&config.database_url).map_err(LibraryError::Database)?;
    options = options
        .foreign_keys(true)
        .create_if_missing(true)
        .synchronous(SqliteSynchronous::Normal);
    if !config.is_in_memory() {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT);
    if config.is_in_memory() {
        // Recycling the only connection would drop the database
        pool_options = pool_options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options.connect_with(options).await.map_err(|e| {
        warn!(error = %e, "Failed to open catalog store");
        LibraryError::Database(e)
    })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        warn!(error = %e, "Catalog schema migration failed");
        LibraryError::Migration(e.to_string())
    })?;

    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await
        .map_err(LibraryError::Database)?;

    debug!(connections = pool.size(), "Catalog store ready");
    Ok(pool)
}

/// In-memory store with the schema applied
pub async fn create_test_pool() -> Result<SqlitePool> {
    create_pool(DatabaseConfig::in_memory()).await
}
