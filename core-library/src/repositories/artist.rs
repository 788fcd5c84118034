use crate::error::{LibraryError, Result};
use crate::models::Artist;
use crate::repositories::{Page, PageRequest};
use crate::writer::CatalogWriter;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Artist repository interface for data access operations
#[async_trait]
pub trait ArtistRepository: Send + Sync {
    /// Find an artist by its catalog ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Artist>>;

    /// Find an artist by its upstream ID
    async fn find_by_spotify_id(&self, spotify_id: &str) -> Result<Option<Artist>>;

    /// Insert a new artist
    ///
    /// # Errors
    /// Returns error if artist validation fails or the database insert fails
    async fn insert(&self, artist: &Artist) -> Result<()>;

    /// Update an existing artist
    ///
    /// # Errors
    /// Returns error if the artist doesn't exist or validation fails
    async fn update(&self, artist: &Artist) -> Result<()>;

    /// Directly assign (or with `None`, unassign) an artist to a label
    async fn assign_label(&self, artist_id: &str, label_id: Option<&str>) -> Result<()>;

    /// Delete an artist by ID. Returns true if a row was removed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Query all artists with pagination, ordered by name
    async fn query(&self, page_request: PageRequest) -> Result<Page<Artist>>;

    async fn count(&self) -> Result<i64>;

    /// Find artists whose name contains `name` (case-insensitive)
    async fn find_by_name(&self, name: &str) -> Result<Vec<Artist>>;
}

/// SQLite implementation of ArtistRepository
pub struct SqliteArtistRepository {
    pool: SqlitePool,
}

impl SqliteArtistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtistRepository for SqliteArtistRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Artist>> {
        let artist = sqlx::query_as::<_, Artist>("SELECT * FROM artists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(artist)
    }

    async fn find_by_spotify_id(&self, spotify_id: &str) -> Result<Option<Artist>> {
        let artist = sqlx::query_as::<_, Artist>("SELECT * FROM artists WHERE spotify_id = ?")
            .bind(spotify_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(artist)
    }

    async fn insert(&self, artist: &Artist) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        CatalogWriter::new(&mut conn).insert_artist(artist).await
    }

    async fn update(&self, artist: &Artist) -> Result<()> {
        artist.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "artist".to_string(),
            message: msg,
        })?;

        let result = sqlx::query(
            r#"
            UPDATE artists
            SET spotify_id = ?, name = ?, label_id = ?, image_url = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&artist.spotify_id)
        .bind(&artist.name)
        .bind(&artist.label_id)
        .bind(&artist.image_url)
        .bind(chrono::Utc::now().timestamp())
        .bind(&artist.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::NotFound {
                entity_type: "Artist".to_string(),
                id: artist.id.clone(),
            });
        }

        Ok(())
    }

    async fn assign_label(&self, artist_id: &str, label_id: Option<&str>) -> Result<()> {
        let result = sqlx::query("UPDATE artists SET label_id = ?, updated_at = ? WHERE id = ?")
            .bind(label_id)
            .bind(chrono::Utc::now().timestamp())
            .bind(artist_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::NotFound {
                entity_type: "Artist".to_string(),
                id: artist_id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM artists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<Artist>> {
        let total = self.count().await?;
        let (limit, offset) = page_request.sql_bounds();

        let artists = sqlx::query_as::<_, Artist>(
            "SELECT * FROM artists ORDER BY name ASC, id ASC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(artists, total as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM artists")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Artist>> {
        let pattern = format!("%{}%", name);
        let artists = sqlx::query_as::<_, Artist>(
            "SELECT * FROM artists WHERE name LIKE ? COLLATE NOCASE ORDER BY name ASC",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(artists)
    }
}
