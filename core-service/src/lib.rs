//! Catalog service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, cache
//! backend, SQLite pool) into the catalog core and exposes the operations the
//! route layer calls: cached entity reads, label indexes, label rosters and
//! imports. Server hosts enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`) and call [`bootstrap`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{
    cache::CacheBackend,
    catalog::{CatalogProvider, EntityKind, RemoteAlbum, RemoteEntity, RemoteTrack},
    http::HttpClient,
};
use core_auth::{ClientCredentials, ClientCredentialsFlow, TokenCache};
use core_cache::{CacheStore, EntityCacheService, Fetched, PopularitySample};
use core_library::repositories::{Page, PageRequest};
use core_library::{Artist, AttributionResolver, Release};
use core_runtime::config::{CacheConfig, CoreConfig};
use core_sync::{ImportLog, ImportOrchestrator, ImportResult, SqliteImportLogRepository};
use provider_spotify::SpotifyConnector;
use sqlx::SqlitePool;

#[cfg(feature = "desktop-shims")]
use bridge_desktop::{MemoryCacheBackend, RedisCacheBackend, ReqwestHttpClient};
#[cfg(feature = "desktop-shims")]
use core_library::db::{create_pool, DatabaseConfig};
#[cfg(feature = "desktop-shims")]
use tracing::info;

/// Aggregated handle to the bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub cache_backend: Arc<dyn CacheBackend>,
    pub pool: SqlitePool,
}

impl CoreDependencies {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        cache_backend: Arc<dyn CacheBackend>,
        pool: SqlitePool,
    ) -> Self {
        Self {
            http_client,
            cache_backend,
            pool,
        }
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CatalogService {
    provider: Arc<dyn CatalogProvider>,
    cache: Arc<EntityCacheService>,
    attribution: Arc<AttributionResolver>,
    imports: Arc<ImportOrchestrator>,
}

impl CatalogService {
    /// Build the service with the Spotify connector as upstream provider.
    pub fn new(deps: CoreDependencies, config: &CoreConfig) -> Self {
        let upstream = &config.upstream;
        let credentials = ClientCredentials::new(
            upstream.client_id.clone(),
            upstream.client_secret.clone(),
            upstream.token_url.clone(),
        );
        let tokens = TokenCache::new(ClientCredentialsFlow::new(
            credentials,
            deps.http_client.clone(),
        ));
        let provider = SpotifyConnector::new(deps.http_client, Arc::new(tokens), upstream.clone());

        Self::from_parts(deps.pool, deps.cache_backend, Arc::new(provider), &config.cache)
    }

    /// Build the service around any upstream provider
    pub fn from_parts(
        pool: SqlitePool,
        cache_backend: Arc<dyn CacheBackend>,
        provider: Arc<dyn CatalogProvider>,
        cache_config: &CacheConfig,
    ) -> Self {
        let store = CacheStore::new(cache_backend, cache_config);
        let cache = Arc::new(EntityCacheService::new(store, provider.clone(), cache_config));
        let logs = Arc::new(SqliteImportLogRepository::new(pool.clone()));
        let imports = ImportOrchestrator::new(pool.clone(), provider.clone(), logs)
            .with_cache(cache.clone());

        Self {
            provider,
            cache,
            attribution: Arc::new(AttributionResolver::new(pool)),
            imports: Arc::new(imports),
        }
    }

    pub fn cache(&self) -> Arc<EntityCacheService> {
        Arc::clone(&self.cache)
    }

    // ---- cache operations -------------------------------------------------

    pub async fn get_entity(&self, kind: EntityKind, id: &str) -> Result<Fetched<RemoteEntity>> {
        Ok(self.cache.get_or_fetch(kind, id).await?)
    }

    pub async fn get_for_label(&self, kind: EntityKind, label: &str) -> Result<Vec<RemoteEntity>> {
        Ok(self.cache.get_for_label(label, kind).await?)
    }

    pub async fn set_for_label(
        &self,
        kind: EntityKind,
        label: &str,
        entities: &[RemoteEntity],
    ) -> Result<usize> {
        Ok(self.cache.set_for_label(label, kind, entities).await?)
    }

    pub async fn search_label(&self, label: &str) -> Result<Fetched<Vec<RemoteAlbum>>> {
        Ok(self.cache.search_label_albums(label).await?)
    }

    pub async fn popularity_history(
        &self,
        track_id: &str,
        from: Option<i64>,
        to: Option<i64>,
    ) -> Result<Vec<PopularitySample>> {
        Ok(self.cache.popularity_history(track_id, from, to).await?)
    }

    pub async fn invalidate(&self, kind: EntityKind, id: &str) -> Result<bool> {
        Ok(self.cache.invalidate(kind, id).await?)
    }

    pub async fn clear_all(&self) -> Result<u64> {
        Ok(self.cache.clear_all().await?)
    }

    /// Uncached pass-through; playlists are not label-scoped
    pub async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<RemoteTrack>> {
        Ok(self.provider.playlist_tracks(playlist_id).await?)
    }

    // ---- attribution ------------------------------------------------------

    pub async fn artists_for_label(&self, label: &str, limit: u32, offset: u32) -> Result<Page<Artist>> {
        let page = PageRequest::from_limit_offset(limit, offset);
        Ok(self.attribution.artists_for_label(label, page).await?)
    }

    pub async fn releases_for_label(&self, label: &str, limit: u32, offset: u32) -> Result<Page<Release>> {
        let page = PageRequest::from_limit_offset(limit, offset);
        Ok(self.attribution.releases_for_label(label, page).await?)
    }

    // ---- imports ----------------------------------------------------------

    pub async fn run_import(&self, label: &str) -> Result<ImportResult> {
        Ok(self.imports.run_import(label).await?)
    }

    pub async fn latest_import(&self, label: &str) -> Result<Option<ImportLog>> {
        Ok(self.imports.latest_import(label).await?)
    }

    pub async fn import_history(&self, label: &str, limit: u32) -> Result<Vec<ImportLog>> {
        Ok(self.imports.import_history(label, limit).await?)
    }
}

/// Connect every adapter named in `config` and build the service.
///
/// Without a `redis_url` the cache lives in process memory.
///
/// ```ignore
/// let config = CoreConfig::from_env()?;
/// let catalog = core_service::bootstrap(&config).await?;
/// let result = catalog.run_import("Build It Tech").await?;
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap(config: &CoreConfig) -> Result<CatalogService> {
    let http_client = ReqwestHttpClient::with_timeout(config.upstream.request_timeout)
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

    let cache_backend: Arc<dyn CacheBackend> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisCacheBackend::connect(url)
                .await
                .map_err(|err| CoreError::InitializationFailed(err.to_string()))?,
        ),
        None => {
            info!("No Redis URL configured, using in-process cache");
            Arc::new(MemoryCacheBackend::new())
        }
    };

    let db_config = DatabaseConfig::from_url(config.database_url.clone())
        .max_connections(config.database_max_connections);
    let pool = create_pool(db_config).await?;

    let deps = CoreDependencies::new(Arc::new(http_client), cache_backend, pool);
    info!(
        cache_prefix = %config.cache.key_prefix,
        api = %config.upstream.api_base_url,
        "Catalog service ready"
    );
    Ok(CatalogService::new(deps, config))
}
