use crate::error::Result;
use crate::labels::KNOWN_LABELS;
use crate::models::Label;
use crate::writer::CatalogWriter;
use async_trait::async_trait;
use sqlx::SqlitePool;

#[async_trait]
pub trait LabelRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Label>>;

    async fn exists(&self, id: &str) -> Result<bool>;

    /// Insert the label if missing. Returns true when a row was added.
    async fn ensure(&self, label: &Label) -> Result<bool>;

    async fn list(&self) -> Result<Vec<Label>>;

    /// Insert every built-in label; returns how many were new
    async fn seed_known(&self) -> Result<usize>;
}

pub struct SqliteLabelRepository {
    pool: SqlitePool,
}

impl SqliteLabelRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LabelRepository for SqliteLabelRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Label>> {
        let label = sqlx::query_as::<_, Label>("SELECT * FROM labels WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(label)
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let found: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM labels WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found.0)
    }

    async fn ensure(&self, label: &Label) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        CatalogWriter::new(&mut conn).ensure_label(label).await
    }

    async fn list(&self) -> Result<Vec<Label>> {
        let labels = sqlx::query_as::<_, Label>("SELECT * FROM labels ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(labels)
    }

    async fn seed_known(&self) -> Result<usize> {
        let mut added = 0;
        for known in KNOWN_LABELS {
            if self.ensure(&Label::new(known.id, known.display_name)).await? {
                added += 1;
            }
        }
        Ok(added)
    }
}
