use crate::error::Result;
use crate::models::{ArtistCredit, ArtistRole, Track};
use crate::writer::CatalogWriter;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Track repository interface
#[async_trait]
pub trait TrackRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Track>>;

    async fn find_by_spotify_id(&self, spotify_id: &str) -> Result<Option<Track>>;

    async fn insert(&self, track: &Track) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<bool>;

    async fn count(&self) -> Result<i64>;

    /// Tracks of a release in track-number order
    async fn find_by_release(&self, release_id: &str) -> Result<Vec<Track>>;

    /// Track-level artist credits
    async fn credits(&self, track_id: &str) -> Result<Vec<ArtistCredit>>;

    async fn link_artist(
        &self,
        track_id: &str,
        artist_id: &str,
        role: Option<ArtistRole>,
    ) -> Result<bool>;
}

pub struct SqliteTrackRepository {
    pool: SqlitePool,
}

impl SqliteTrackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackRepository for SqliteTrackRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Track>> {
        let track = sqlx::query_as::<_, Track>("SELECT * FROM tracks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(track)
    }

    async fn find_by_spotify_id(&self, spotify_id: &str) -> Result<Option<Track>> {
        let track = sqlx::query_as::<_, Track>("SELECT * FROM tracks WHERE spotify_id = ?")
            .bind(spotify_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(track)
    }

    async fn insert(&self, track: &Track) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        CatalogWriter::new(&mut conn).insert_track(track).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tracks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn find_by_release(&self, release_id: &str) -> Result<Vec<Track>> {
        let tracks = sqlx::query_as::<_, Track>(
            "SELECT * FROM tracks WHERE release_id = ? ORDER BY track_number IS NULL, track_number, title",
        )
        .bind(release_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tracks)
    }

    async fn credits(&self, track_id: &str) -> Result<Vec<ArtistCredit>> {
        let credits = sqlx::query_as::<_, ArtistCredit>(
            "SELECT artist_id, role FROM track_artists WHERE track_id = ? ORDER BY created_at, artist_id",
        )
        .bind(track_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(credits)
    }

    async fn link_artist(
        &self,
        track_id: &str,
        artist_id: &str,
        role: Option<ArtistRole>,
    ) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        CatalogWriter::new(&mut conn)
            .link_track_artist(track_id, artist_id, role)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::{Artist, Release, ReleaseType};
    use crate::repositories::{
        ArtistRepository, ReleaseRepository, SqliteArtistRepository, SqliteReleaseRepository,
    };

    #[tokio::test]
    async fn test_tracks_of_release_in_order() {
        let pool = create_test_pool().await.unwrap();
        let releases = SqliteReleaseRepository::new(pool.clone());
        let repo = SqliteTrackRepository::new(pool);

        let release = Release::new("Album", ReleaseType::Album);
        releases.insert(&release).await.unwrap();

        for (n, title) in [(2, "Second"), (1, "First")] {
            let mut track = Track::new(title).with_release(&release.id);
            track.track_number = Some(n);
            repo.insert(&track).await.unwrap();
        }
        repo.insert(&Track::new("Bonus").with_release(&release.id))
            .await
            .unwrap();

        let titles: Vec<_> = repo
            .find_by_release(&release.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second", "Bonus"]);
    }

    #[tokio::test]
    async fn test_track_credits_and_cascade() {
        let pool = create_test_pool().await.unwrap();
        let releases = SqliteReleaseRepository::new(pool.clone());
        let artists = SqliteArtistRepository::new(pool.clone());
        let repo = SqliteTrackRepository::new(pool);

        let release = Release::new("Single", ReleaseType::Single);
        releases.insert(&release).await.unwrap();
        let track = Track::new("Cut").with_spotify_id("trk").with_release(&release.id);
        repo.insert(&track).await.unwrap();
        let artist = Artist::new("Remixer");
        artists.insert(&artist).await.unwrap();

        assert!(repo
            .link_artist(&track.id, &artist.id, Some(ArtistRole::Remixer))
            .await
            .unwrap());
        let credits = repo.credits(&track.id).await.unwrap();
        assert_eq!(credits[0].role.as_deref(), Some("remixer"));

        releases.delete(&release.id).await.unwrap();
        assert!(repo.find_by_spotify_id("trk").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
