//! Connection-scoped catalog writes
//!
//! [`CatalogWriter`] borrows a single `SqliteConnection`, which may be a
//! plain pooled connection or the inside of a transaction (`&mut *tx`).
//! All insert and find-or-create statements live here so the repositories
//! and the import pipeline share one set of SQL.

use sqlx::SqliteConnection;
use tracing::trace;

use crate::error::{LibraryError, Result};
use crate::models::{Artist, ArtistRole, Label, Release, Track};

/// Row returned from a find-or-create; `created` is false when the row
/// already existed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted<T> {
    pub row: T,
    pub created: bool,
}

pub struct CatalogWriter<'c> {
    conn: &'c mut SqliteConnection,
}

fn invalid(field: &str, message: impl Into<String>) -> LibraryError {
    LibraryError::InvalidInput {
        field: field.to_string(),
        message: message.into(),
    }
}

fn require_spotify_id<'a>(field: &str, spotify_id: &'a Option<String>) -> Result<&'a str> {
    spotify_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| invalid(field, "find-or-create requires an upstream id"))
}

impl<'c> CatalogWriter<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Insert the label row if missing. Returns true when a row was added.
    pub async fn ensure_label(&mut self, label: &Label) -> Result<bool> {
        if label.id.trim().is_empty() {
            return Err(invalid("label.id", "label id cannot be empty"));
        }

        let result = sqlx::query("INSERT OR IGNORE INTO labels (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&label.id)
            .bind(&label.name)
            .bind(label.created_at)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn insert_artist(&mut self, artist: &Artist) -> Result<()> {
        artist.validate().map_err(|msg| invalid("artist", msg))?;

        sqlx::query(
            r#"
            INSERT INTO artists (id, spotify_id, name, label_id, image_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&artist.id)
        .bind(&artist.spotify_id)
        .bind(&artist.name)
        .bind(&artist.label_id)
        .bind(&artist.image_url)
        .bind(artist.created_at)
        .bind(artist.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Find an artist by upstream id, inserting `candidate` when absent.
    pub async fn find_or_create_artist(&mut self, candidate: &Artist) -> Result<Upserted<Artist>> {
        candidate.validate().map_err(|msg| invalid("artist", msg))?;
        let spotify_id = require_spotify_id("artist.spotify_id", &candidate.spotify_id)?;

        let result = sqlx::query(
            r#"
            INSERT INTO artists (id, spotify_id, name, label_id, image_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(spotify_id) DO NOTHING
            "#,
        )
        .bind(&candidate.id)
        .bind(spotify_id)
        .bind(&candidate.name)
        .bind(&candidate.label_id)
        .bind(&candidate.image_url)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .execute(&mut *self.conn)
        .await?;

        let row = sqlx::query_as::<_, Artist>("SELECT * FROM artists WHERE spotify_id = ?")
            .bind(spotify_id)
            .fetch_one(&mut *self.conn)
            .await?;

        let created = result.rows_affected() == 1;
        trace!(spotify_id, created, "artist resolved");
        Ok(Upserted { row, created })
    }

    pub async fn insert_release(&mut self, release: &Release) -> Result<()> {
        release.validate().map_err(|msg| invalid("release", msg))?;

        sqlx::query(
            r#"
            INSERT INTO releases (
                id, spotify_id, title, release_type, release_date, label_id,
                artwork_url, total_tracks, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&release.id)
        .bind(&release.spotify_id)
        .bind(&release.title)
        .bind(&release.release_type)
        .bind(&release.release_date)
        .bind(&release.label_id)
        .bind(&release.artwork_url)
        .bind(release.total_tracks)
        .bind(release.created_at)
        .bind(release.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Find a release by upstream id, inserting `candidate` when absent.
    ///
    /// An existing release without a label is attached to the candidate's
    /// label; an existing label assignment is never overwritten.
    pub async fn find_or_create_release(&mut self, candidate: &Release) -> Result<Upserted<Release>> {
        candidate.validate().map_err(|msg| invalid("release", msg))?;
        let spotify_id = require_spotify_id("release.spotify_id", &candidate.spotify_id)?;

        let result = sqlx::query(
            r#"
            INSERT INTO releases (
                id, spotify_id, title, release_type, release_date, label_id,
                artwork_url, total_tracks, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(spotify_id) DO NOTHING
            "#,
        )
        .bind(&candidate.id)
        .bind(spotify_id)
        .bind(&candidate.title)
        .bind(&candidate.release_type)
        .bind(&candidate.release_date)
        .bind(&candidate.label_id)
        .bind(&candidate.artwork_url)
        .bind(candidate.total_tracks)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .execute(&mut *self.conn)
        .await?;

        let created = result.rows_affected() == 1;
        if !created && candidate.label_id.is_some() {
            sqlx::query(
                "UPDATE releases SET label_id = ?, updated_at = ? WHERE spotify_id = ? AND label_id IS NULL",
            )
            .bind(&candidate.label_id)
            .bind(candidate.updated_at)
            .bind(spotify_id)
            .execute(&mut *self.conn)
            .await?;
        }

        let row = sqlx::query_as::<_, Release>("SELECT * FROM releases WHERE spotify_id = ?")
            .bind(spotify_id)
            .fetch_one(&mut *self.conn)
            .await?;

        trace!(spotify_id, created, "release resolved");
        Ok(Upserted { row, created })
    }

    pub async fn insert_track(&mut self, track: &Track) -> Result<()> {
        track.validate().map_err(|msg| invalid("track", msg))?;

        sqlx::query(
            r#"
            INSERT INTO tracks (
                id, spotify_id, title, release_id, track_number, duration_ms,
                isrc, preview_url, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&track.id)
        .bind(&track.spotify_id)
        .bind(&track.title)
        .bind(&track.release_id)
        .bind(track.track_number)
        .bind(track.duration_ms)
        .bind(&track.isrc)
        .bind(&track.preview_url)
        .bind(track.created_at)
        .bind(track.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Find a track by upstream id, inserting `candidate` when absent.
    pub async fn find_or_create_track(&mut self, candidate: &Track) -> Result<Upserted<Track>> {
        candidate.validate().map_err(|msg| invalid("track", msg))?;
        let spotify_id = require_spotify_id("track.spotify_id", &candidate.spotify_id)?;

        let result = sqlx::query(
            r#"
            INSERT INTO tracks (
                id, spotify_id, title, release_id, track_number, duration_ms,
                isrc, preview_url, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(spotify_id) DO NOTHING
            "#,
        )
        .bind(&candidate.id)
        .bind(spotify_id)
        .bind(&candidate.title)
        .bind(&candidate.release_id)
        .bind(candidate.track_number)
        .bind(candidate.duration_ms)
        .bind(&candidate.isrc)
        .bind(&candidate.preview_url)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .execute(&mut *self.conn)
        .await?;

        let row = sqlx::query_as::<_, Track>("SELECT * FROM tracks WHERE spotify_id = ?")
            .bind(spotify_id)
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(Upserted {
            row,
            created: result.rows_affected() == 1,
        })
    }

    /// Credit an artist on a release. Returns false if the credit existed.
    pub async fn link_release_artist(
        &mut self,
        release_id: &str,
        artist_id: &str,
        role: Option<ArtistRole>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO release_artists (release_id, artist_id, role, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(release_id)
        .bind(artist_id)
        .bind(role.map(|r| r.as_str()))
        .bind(chrono::Utc::now().timestamp())
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Credit an artist on a track. Returns false if the credit existed.
    pub async fn link_track_artist(
        &mut self,
        track_id: &str,
        artist_id: &str,
        role: Option<ArtistRole>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO track_artists (track_id, artist_id, role, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(track_id)
        .bind(artist_id)
        .bind(role.map(|r| r.as_str()))
        .bind(chrono::Utc::now().timestamp())
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::ReleaseType;

    #[tokio::test]
    async fn test_find_or_create_artist_is_idempotent() {
        let pool = create_test_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut writer = CatalogWriter::new(&mut conn);

        let first = writer
            .find_or_create_artist(&Artist::new("Nova").with_spotify_id("sp-nova"))
            .await
            .unwrap();
        assert!(first.created);

        let second = writer
            .find_or_create_artist(&Artist::new("Nova (renamed)").with_spotify_id("sp-nova"))
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.row.id, first.row.id);
        assert_eq!(second.row.name, "Nova");
    }

    #[tokio::test]
    async fn test_find_or_create_requires_upstream_id() {
        let pool = create_test_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut writer = CatalogWriter::new(&mut conn);

        let err = writer
            .find_or_create_artist(&Artist::new("No Id"))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_existing_release_gains_label_but_keeps_assignment() {
        let pool = create_test_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut writer = CatalogWriter::new(&mut conn);

        writer.ensure_label(&Label::new("buildit-tech", "Build It Tech")).await.unwrap();
        writer.ensure_label(&Label::new("buildit-deep", "Build It Deep")).await.unwrap();

        let unlabeled = Release::new("EP", ReleaseType::Ep).with_spotify_id("r1");
        writer.find_or_create_release(&unlabeled).await.unwrap();

        let labeled = Release::new("EP", ReleaseType::Ep)
            .with_spotify_id("r1")
            .with_label("buildit-tech");
        let resolved = writer.find_or_create_release(&labeled).await.unwrap();
        assert!(!resolved.created);
        assert_eq!(resolved.row.label_id.as_deref(), Some("buildit-tech"));

        let relabeled = Release::new("EP", ReleaseType::Ep)
            .with_spotify_id("r1")
            .with_label("buildit-deep");
        let resolved = writer.find_or_create_release(&relabeled).await.unwrap();
        assert_eq!(resolved.row.label_id.as_deref(), Some("buildit-tech"));
    }

    #[tokio::test]
    async fn test_links_are_deduplicated_per_role() {
        let pool = create_test_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut writer = CatalogWriter::new(&mut conn);

        let artist = writer
            .find_or_create_artist(&Artist::new("A").with_spotify_id("a"))
            .await
            .unwrap()
            .row;
        let release = writer
            .find_or_create_release(&Release::new("R", ReleaseType::Single).with_spotify_id("r"))
            .await
            .unwrap()
            .row;
        let track = writer
            .find_or_create_track(&Track::new("T").with_spotify_id("t").with_release(&release.id))
            .await
            .unwrap()
            .row;

        assert!(writer.link_track_artist(&track.id, &artist.id, None).await.unwrap());
        assert!(!writer.link_track_artist(&track.id, &artist.id, None).await.unwrap());
        assert!(writer
            .link_track_artist(&track.id, &artist.id, Some(ArtistRole::Remixer))
            .await
            .unwrap());

        assert!(writer
            .link_release_artist(&release.id, &artist.id, Some(ArtistRole::Primary))
            .await
            .unwrap());
        assert!(!writer
            .link_release_artist(&release.id, &artist.id, Some(ArtistRole::Primary))
            .await
            .unwrap());

        assert!(writer.ensure_label(&Label::new("x", "X")).await.unwrap());
        assert!(!writer.ensure_label(&Label::new("x", "X")).await.unwrap());
    }
}
