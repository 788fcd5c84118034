//! # Import Orchestrator
//!
//! Pulls a label's catalog from the upstream provider, persists it in one
//! transaction and refreshes the label's cache indexes.
//!
//! ## Workflow
//!
//! 1. Normalize the label and write a `started` import log
//! 2. Search upstream for the label's albums (full albums, label-filtered)
//! 3. Zero albums: log `completed` with an informational message
//! 4. Otherwise, inside one transaction: ensure the label row, then
//!    find-or-create every release, track and artist and link the credits
//! 5. Commit, log `completed`, then repopulate the cache best-effort
//!
//! Any upstream or database error marks the log `failed` and is returned.
//! Find-or-create is keyed on upstream ids, so re-running an import with
//! unchanged upstream data adds no rows.

use crate::credits;
use crate::import_log::{ImportLog, ImportLogId, ImportLogRepository, ImportStatus};
use crate::{ImportError, Result};
use bridge_traits::catalog::{ArtistRef, CatalogProvider, EntityKind, RemoteAlbum, RemoteEntity};
use core_cache::EntityCacheService;
use core_library::{labels, Artist, CatalogWriter, Label, LibraryError, Release, Track};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Rows created by one run; zero on a repeat import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub releases_created: u64,
    pub tracks_created: u64,
    pub artists_created: u64,
    pub credits_created: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub log_id: ImportLogId,
    pub label_id: String,
    pub status: ImportStatus,
    pub message: String,
    pub stats: ImportStats,
    /// Every release, track and artist touched by the run, created or not
    pub releases: Vec<Release>,
    pub tracks: Vec<Track>,
    pub artists: Vec<Artist>,
}

#[derive(Default)]
struct Persisted {
    stats: ImportStats,
    releases: Vec<Release>,
    tracks: Vec<Track>,
    artists: Vec<Artist>,
}

pub struct ImportOrchestrator {
    pool: SqlitePool,
    provider: Arc<dyn CatalogProvider>,
    logs: Arc<dyn ImportLogRepository>,
    cache: Option<Arc<EntityCacheService>>,
}

impl ImportOrchestrator {
    pub fn new(
        pool: SqlitePool,
        provider: Arc<dyn CatalogProvider>,
        logs: Arc<dyn ImportLogRepository>,
    ) -> Self {
        Self {
            pool,
            provider,
            logs,
            cache: None,
        }
    }

    /// Refresh label indexes in this cache after each successful import
    pub fn with_cache(mut self, cache: Arc<EntityCacheService>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[instrument(skip(self))]
    pub async fn run_import(&self, label: &str) -> Result<ImportResult> {
        let label_id = labels::normalize(label);
        if label_id.is_empty() {
            return Err(ImportError::InvalidLabel(label.to_string()));
        }
        let search_term = labels::search_name(&label_id);

        let log = ImportLog::start(label_id.as_str());
        self.logs.insert(&log).await?;
        info!(label = %label_id, log_id = %log.id, "Import started");

        let albums = match self.provider.search_albums_by_label(&search_term).await {
            Ok(albums) => albums,
            Err(err) => {
                let err = ImportError::Upstream(err);
                error!(label = %label_id, error = %err, "Upstream search failed");
                self.record_failure(log, &err).await;
                return Err(err);
            }
        };

        if albums.is_empty() {
            let message = format!("No releases found for label '{}'", search_term);
            info!(label = %label_id, "Upstream returned no releases");
            let log = self.record_completion(log, &message).await?;
            return Ok(ImportResult {
                log_id: log.id,
                label_id,
                status: log.status,
                message,
                stats: ImportStats::default(),
                releases: Vec::new(),
                tracks: Vec::new(),
                artists: Vec::new(),
            });
        }

        let persisted = match self.persist(&label_id, &search_term, &albums).await {
            Ok(persisted) => persisted,
            Err(err) => {
                error!(label = %label_id, error = %err, "Import transaction rolled back");
                self.record_failure(log, &err).await;
                return Err(err);
            }
        };

        let message = format!("Successfully imported {} releases", persisted.releases.len());
        let log = self.record_completion(log, &message).await?;
        info!(
            label = %label_id,
            releases = persisted.releases.len(),
            tracks = persisted.tracks.len(),
            artists = persisted.artists.len(),
            created = ?persisted.stats,
            "Import completed"
        );

        self.refresh_cache(&label_id, &albums).await;

        Ok(ImportResult {
            log_id: log.id,
            label_id,
            status: log.status,
            message,
            stats: persisted.stats,
            releases: persisted.releases,
            tracks: persisted.tracks,
            artists: persisted.artists,
        })
    }

    pub async fn latest_import(&self, label: &str) -> Result<Option<ImportLog>> {
        self.logs.latest_for_label(&labels::normalize(label)).await
    }

    pub async fn import_history(&self, label: &str, limit: u32) -> Result<Vec<ImportLog>> {
        self.logs.history(&labels::normalize(label), limit).await
    }

    /// Mark the run completed. The in-memory transition can only fail on a
    /// programming error; a failed write is logged and the run still counts.
    async fn record_completion(&self, log: ImportLog, message: &str) -> Result<ImportLog> {
        let log = log.complete(message)?;
        if let Err(err) = self.logs.finish(&log).await {
            warn!(log_id = %log.id, error = %err, "Failed to update import log");
        }
        Ok(log)
    }

    async fn record_failure(&self, log: ImportLog, cause: &ImportError) {
        let log_id = log.id;
        let result = match log.fail(cause.log_message()) {
            Ok(log) => self.logs.finish(&log).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            warn!(log_id = %log_id, error = %err, "Failed to update import log");
        }
    }

    async fn persist(
        &self,
        label_id: &str,
        label_name: &str,
        albums: &[RemoteAlbum],
    ) -> Result<Persisted> {
        let mut tx = self.pool.begin().await.map_err(LibraryError::from)?;
        let mut writer = CatalogWriter::new(&mut *tx);
        let mut persisted = Persisted::default();
        let mut artists: HashMap<String, Artist> = HashMap::new();

        writer.ensure_label(&Label::new(label_id, label_name)).await?;

        for album in albums {
            let release = writer
                .find_or_create_release(&Release::from_remote(album, label_id))
                .await?;
            if release.created {
                persisted.stats.releases_created += 1;
            }
            let release = release.row;

            for (credit, role) in credits::release_credits(album) {
                let Some(artist) =
                    upsert_artist(&mut writer, credit, &mut artists, &mut persisted.stats).await?
                else {
                    continue;
                };
                if writer
                    .link_release_artist(&release.id, &artist.id, Some(role))
                    .await?
                {
                    persisted.stats.credits_created += 1;
                }
            }

            for remote in &album.tracks {
                let track = writer
                    .find_or_create_track(&Track::from_remote(remote, &release.id))
                    .await?;
                if track.created {
                    persisted.stats.tracks_created += 1;
                }
                let track = track.row;

                for (credit, role) in credits::track_credits(remote) {
                    let Some(artist) =
                        upsert_artist(&mut writer, credit, &mut artists, &mut persisted.stats)
                            .await?
                    else {
                        continue;
                    };
                    if writer
                        .link_track_artist(&track.id, &artist.id, Some(role))
                        .await?
                    {
                        persisted.stats.credits_created += 1;
                    }
                }
                persisted.tracks.push(track);
            }
            persisted.releases.push(release);
        }

        tx.commit().await.map_err(LibraryError::from)?;

        let mut artists: Vec<Artist> = artists.into_values().collect();
        artists.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        persisted.artists = artists;
        Ok(persisted)
    }

    async fn refresh_cache(&self, label_id: &str, albums: &[RemoteAlbum]) {
        let Some(cache) = &self.cache else {
            return;
        };

        let album_entities: Vec<RemoteEntity> =
            albums.iter().cloned().map(RemoteEntity::Album).collect();
        let track_entities: Vec<RemoteEntity> = albums
            .iter()
            .flat_map(|album| album.tracks.iter().cloned())
            .map(RemoteEntity::Track)
            .collect();

        for (kind, entities) in [
            (EntityKind::Album, album_entities),
            (EntityKind::Track, track_entities),
        ] {
            if let Err(err) = cache.set_for_label(label_id, kind, &entities).await {
                warn!(label = %label_id, kind = %kind, error = %err, "Failed to refresh label cache");
            }
        }
    }
}

/// Find-or-create an artist once per run. Credits without an upstream id
/// are skipped.
async fn upsert_artist(
    writer: &mut CatalogWriter<'_>,
    credit: &ArtistRef,
    seen: &mut HashMap<String, Artist>,
    stats: &mut ImportStats,
) -> Result<Option<Artist>> {
    if credit.id.is_empty() {
        debug!(name = %credit.name, "Skipping credit without upstream id");
        return Ok(None);
    }
    if let Some(artist) = seen.get(&credit.id) {
        return Ok(Some(artist.clone()));
    }

    let artist = writer
        .find_or_create_artist(&Artist::from_remote(credit))
        .await?;
    if artist.created {
        stats.artists_created += 1;
    }
    seen.insert(credit.id.clone(), artist.row.clone());
    Ok(Some(artist.row))
}
