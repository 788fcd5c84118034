//! # Entity Cache Service
//!
//! Read-through cache for upstream catalog entities, organised per label.
//!
//! ## Read policy
//!
//! - A cached entry younger than its freshness window is served as
//!   [`Source::Cache`].
//! - Otherwise the provider is asked; the result is written back and served
//!   as [`Source::Upstream`].
//! - If the provider fails and any cached copy exists, the stale copy is
//!   served as [`Source::CacheFallback`].
//!
//! Cache read failures are soft misses, except type collisions which always
//! surface as [`CacheError::TypeMismatch`](crate::error::CacheError).
//!
//! ## Label indexes
//!
//! `set_for_label` writes the new member set to a staging key and renames it
//! over the live index, so readers see either the old set or the new one.

use bridge_traits::cache::ValueKind;
use bridge_traits::catalog::{CatalogProvider, EntityKind, RemoteAlbum, RemoteEntity};
use bridge_traits::time::{Clock, SystemClock};
use core_library::labels;
use core_runtime::config::{CacheConfig, TtlPolicy};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{CacheError, CacheServiceError, ServiceResult};
use crate::keys::CacheKeys;
use crate::models::{CachedEntry, Fetched, PopularitySample, Source};
use crate::popularity::PopularityTracker;
use crate::store::CacheStore;

pub struct EntityCacheService {
    store: CacheStore,
    provider: Arc<dyn CatalogProvider>,
    keys: CacheKeys,
    ttl: TtlPolicy,
    clock: Arc<dyn Clock>,
    popularity: PopularityTracker,
}

impl EntityCacheService {
    pub fn new(store: CacheStore, provider: Arc<dyn CatalogProvider>, config: &CacheConfig) -> Self {
        Self::with_clock(store, provider, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: CacheStore,
        provider: Arc<dyn CatalogProvider>,
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let keys = CacheKeys::new(config.key_prefix.clone());
        let popularity = PopularityTracker::new(
            store.clone(),
            keys.clone(),
            config.ttl.popularity_window,
            clock.clone(),
        );
        Self {
            store,
            provider,
            keys,
            ttl: config.ttl.clone(),
            clock,
            popularity,
        }
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    pub fn popularity(&self) -> &PopularityTracker {
        &self.popularity
    }

    fn now_ms(&self) -> i64 {
        self.clock.unix_timestamp_millis()
    }

    /// Read a cached entry. Type collisions surface; anything else is a miss.
    async fn read_entry<T: DeserializeOwned>(&self, key: &str) -> ServiceResult<Option<CachedEntry<T>>> {
        match self.store.get_json::<CachedEntry<T>>(key).await {
            Ok(entry) => Ok(entry),
            Err(err) if err.is_type_mismatch() => Err(err.into()),
            Err(err) => {
                warn!(key, error = %err, "Cache read failed, treating as miss");
                Ok(None)
            }
        }
    }

    async fn write_entry<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) -> Result<(), CacheError> {
        let entry = CachedEntry::new(data, self.now_ms());
        self.store.set_json(key, &entry, Some(ttl)).await
    }

    /// Write an entity under its own key with its kind's TTL
    pub async fn cache_entity(&self, entity: &RemoteEntity) -> ServiceResult<()> {
        let kind = entity.kind();
        let key = self.keys.entity(kind, entity.id());
        self.write_entry(&key, entity, self.ttl.entity_ttl(kind)).await?;
        Ok(())
    }

    async fn cache_entity_best_effort(&self, entity: &RemoteEntity) {
        if let Err(err) = self.cache_entity(entity).await {
            warn!(
                kind = %entity.kind(),
                id = entity.id(),
                error = %err,
                "Failed to cache entity"
            );
        }
    }

    async fn record_popularity(&self, entity: &RemoteEntity) {
        let popularity = match entity {
            RemoteEntity::Track(track) => track.popularity,
            _ => None,
        };
        if let Some(popularity) = popularity {
            if let Err(err) = self.popularity.record(entity.id(), popularity).await {
                debug!(id = entity.id(), error = %err, "Failed to record popularity");
            }
        }
    }

    /// Fetch one entity through the cache
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn get_or_fetch(&self, kind: EntityKind, id: &str) -> ServiceResult<Fetched<RemoteEntity>> {
        let key = self.keys.entity(kind, id);
        let cached = self
            .read_entry::<RemoteEntity>(&key)
            .await?
            .filter(|entry| entry.data.kind() == kind);

        if let Some(entry) = &cached {
            if entry.is_fresh(self.now_ms(), self.ttl.freshness(kind)) {
                debug!(key = %key, "Cache hit");
                return Ok(Fetched {
                    entity: entry.data.clone(),
                    source: Source::Cache,
                });
            }
        }

        match self.provider.get_entity(kind, id).await {
            Ok(entity) => {
                self.cache_entity_best_effort(&entity).await;
                self.record_popularity(&entity).await;
                Ok(Fetched {
                    entity,
                    source: Source::Upstream,
                })
            }
            Err(err) => match cached {
                Some(entry) => {
                    warn!(
                        key = %key,
                        age_ms = entry.age_ms(self.now_ms()),
                        error = %err,
                        "Upstream fetch failed, serving stale cache entry"
                    );
                    Ok(Fetched {
                        entity: entry.data,
                        source: Source::CacheFallback,
                    })
                }
                None => Err(CacheServiceError::Upstream(err)),
            },
        }
    }

    fn label_id(label: &str) -> ServiceResult<String> {
        let id = labels::normalize(label);
        if id.is_empty() {
            return Err(CacheServiceError::InvalidLabel(label.to_string()));
        }
        Ok(id)
    }

    /// Replace a label's index for `kind` with `entities`, caching each one.
    ///
    /// Entities of another kind are skipped. Returns the number of distinct
    /// ids now in the index.
    #[instrument(skip(self, entities), fields(kind = %kind, count = entities.len()))]
    pub async fn set_for_label(
        &self,
        label: &str,
        kind: EntityKind,
        entities: &[RemoteEntity],
    ) -> ServiceResult<usize> {
        let label_id = Self::label_id(label)?;
        let live = self.keys.label_index(&label_id, kind);
        self.store.verify_type(&live, ValueKind::Set).await?;

        let mut ids = BTreeSet::new();
        for entity in entities {
            if entity.kind() != kind {
                warn!(
                    expected = %kind,
                    actual = %entity.kind(),
                    id = entity.id(),
                    "Skipping entity of another kind"
                );
                continue;
            }
            self.cache_entity(entity).await?;
            ids.insert(entity.id().to_string());
        }

        if ids.is_empty() {
            self.store.delete(&live).await?;
            info!(label = %label_id, "Cleared label index");
            return Ok(0);
        }

        let members: Vec<String> = ids.into_iter().collect();
        let staging = self.keys.staging(&live);
        let swapped = async {
            self.store.add_to_set(&staging, &members).await?;
            self.store.expire(&staging, self.ttl.label_index_ttl).await?;
            self.store.rename(&staging, &live).await
        }
        .await;

        if let Err(err) = swapped {
            if let Err(cleanup) = self.store.delete(&staging).await {
                debug!(key = %staging, error = %cleanup, "Failed to remove staging key");
            }
            return Err(err.into());
        }

        info!(label = %label_id, members = members.len(), "Replaced label index");
        Ok(members.len())
    }

    /// Every cached entity in a label's index.
    ///
    /// Members whose entry is missing or unreadable are skipped. Results are
    /// ordered by id.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn get_for_label(&self, label: &str, kind: EntityKind) -> ServiceResult<Vec<RemoteEntity>> {
        let label_id = Self::label_id(label)?;
        let live = self.keys.label_index(&label_id, kind);

        match self.store.verify_type(&live, ValueKind::Set).await {
            Ok(()) => {}
            Err(err) if err.is_type_mismatch() => return Err(err.into()),
            Err(err) => {
                warn!(key = %live, error = %err, "Label index unavailable");
                return Ok(Vec::new());
            }
        }

        let mut ids = match self.store.members(&live).await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(key = %live, error = %err, "Failed to read label index");
                return Ok(Vec::new());
            }
        };
        ids.sort();

        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            let key = self.keys.entity(kind, &id);
            match self.store.get_json::<CachedEntry<RemoteEntity>>(&key).await {
                Ok(Some(entry)) if entry.data.kind() == kind => entities.push(entry.data),
                Ok(_) => debug!(key = %key, "Label index member missing from cache"),
                Err(err) => warn!(key = %key, error = %err, "Skipping unreadable cache entry"),
            }
        }
        Ok(entities)
    }

    /// Upstream label search through the search cache.
    ///
    /// Albums found upstream are also cached individually.
    #[instrument(skip(self))]
    pub async fn search_label_albums(&self, label: &str) -> ServiceResult<Fetched<Vec<RemoteAlbum>>> {
        let label_id = Self::label_id(label)?;
        let key = self.keys.search(&label_id);
        let cached = self.read_entry::<Vec<RemoteAlbum>>(&key).await?;

        if let Some(entry) = &cached {
            if entry.is_fresh(self.now_ms(), self.ttl.search_ttl) {
                return Ok(Fetched {
                    entity: entry.data.clone(),
                    source: Source::Cache,
                });
            }
        }

        let term = labels::search_name(&label_id);
        match self.provider.search_albums_by_label(&term).await {
            Ok(albums) => {
                if let Err(err) = self.write_entry(&key, &albums, self.ttl.search_ttl).await {
                    warn!(key = %key, error = %err, "Failed to cache search result");
                }
                for album in &albums {
                    self.cache_entity_best_effort(&RemoteEntity::Album(album.clone()))
                        .await;
                }
                Ok(Fetched {
                    entity: albums,
                    source: Source::Upstream,
                })
            }
            Err(err) => match cached {
                Some(entry) => {
                    warn!(key = %key, error = %err, "Upstream search failed, serving stale result");
                    Ok(Fetched {
                        entity: entry.data,
                        source: Source::CacheFallback,
                    })
                }
                None => Err(CacheServiceError::Upstream(err)),
            },
        }
    }

    pub async fn popularity_history(
        &self,
        track_id: &str,
        from: Option<i64>,
        to: Option<i64>,
    ) -> ServiceResult<Vec<PopularitySample>> {
        Ok(self.popularity.history(track_id, from, to).await?)
    }

    /// Drop one entity's cached entry. Returns true if it existed.
    pub async fn invalidate(&self, kind: EntityKind, id: &str) -> ServiceResult<bool> {
        Ok(self.store.delete(&self.keys.entity(kind, id)).await?)
    }

    /// Delete every key under the configured prefix
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> ServiceResult<u64> {
        let keys = self.store.keys(&self.keys.everything()).await?;
        let removed = self.store.delete_many(&keys).await?;
        info!(removed, "Cleared cache");
        Ok(removed)
    }
}
