use crate::error::Result;
use crate::models::{ArtistCredit, ArtistRole, Release};
use crate::writer::CatalogWriter;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Release repository interface
#[async_trait]
pub trait ReleaseRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Release>>;

    async fn find_by_spotify_id(&self, spotify_id: &str) -> Result<Option<Release>>;

    /// Insert a new release
    ///
    /// # Errors
    /// Returns error if validation fails or the label does not exist
    async fn insert(&self, release: &Release) -> Result<()>;

    /// Delete a release and, by cascade, its tracks and credits
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn count(&self) -> Result<i64>;

    /// Release-level artist credits
    async fn credits(&self, release_id: &str) -> Result<Vec<ArtistCredit>>;

    /// Credit an artist on a release; `None` stores an unspecified role
    async fn link_artist(
        &self,
        release_id: &str,
        artist_id: &str,
        role: Option<ArtistRole>,
    ) -> Result<bool>;
}

pub struct SqliteReleaseRepository {
    pool: SqlitePool,
}

impl SqliteReleaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReleaseRepository for SqliteReleaseRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Release>> {
        let release = sqlx::query_as::<_, Release>("SELECT * FROM releases WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(release)
    }

    async fn find_by_spotify_id(&self, spotify_id: &str) -> Result<Option<Release>> {
        let release = sqlx::query_as::<_, Release>("SELECT * FROM releases WHERE spotify_id = ?")
            .bind(spotify_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(release)
    }

    async fn insert(&self, release: &Release) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        CatalogWriter::new(&mut conn).insert_release(release).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM releases WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM releases")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn credits(&self, release_id: &str) -> Result<Vec<ArtistCredit>> {
        let credits = sqlx::query_as::<_, ArtistCredit>(
            "SELECT artist_id, role FROM release_artists WHERE release_id = ? ORDER BY created_at, artist_id",
        )
        .bind(release_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(credits)
    }

    async fn link_artist(
        &self,
        release_id: &str,
        artist_id: &str,
        role: Option<ArtistRole>,
    ) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        CatalogWriter::new(&mut conn)
            .link_release_artist(release_id, artist_id, role)
            .await
    }
}
