//! # Import Log
//!
//! One row per import run. A log is created as `started` and moves exactly
//! once to `completed` or `failed`:
//!
//! ```text
//! started ──► completed
//!    │
//!    └──────► failed
//! ```
//!
//! Transitions are checked both in memory and by the `UPDATE`, which only
//! touches rows still in `started`.

use crate::{ImportError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// ID and status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportLogId(Uuid);

impl ImportLogId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self> {
        Ok(Self(
            Uuid::parse_str(s).map_err(|e| ImportError::InvalidLogId(e.to_string()))?,
        ))
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ImportLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImportLogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Started,
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportStatus::Completed | ImportStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Started => "started",
            ImportStatus::Completed => "completed",
            ImportStatus::Failed => "failed",
        }
    }
}

impl FromStr for ImportStatus {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "started" => Ok(ImportStatus::Started),
            "completed" => Ok(ImportStatus::Completed),
            "failed" => Ok(ImportStatus::Failed),
            other => Err(ImportError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Log entity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportLog {
    pub id: ImportLogId,
    /// Canonical label id
    pub label_id: String,
    pub status: ImportStatus,
    pub message: Option<String>,
    /// Unix seconds
    pub started_at: i64,
    pub completed_at: Option<i64>,
}

impl ImportLog {
    pub fn start(label_id: impl Into<String>) -> Self {
        Self {
            id: ImportLogId::new(),
            label_id: label_id.into(),
            status: ImportStatus::Started,
            message: None,
            started_at: current_timestamp(),
            completed_at: None,
        }
    }

    pub fn complete(self, message: impl Into<String>) -> Result<Self> {
        self.finish(ImportStatus::Completed, message.into())
    }

    pub fn fail(self, message: impl Into<String>) -> Result<Self> {
        self.finish(ImportStatus::Failed, message.into())
    }

    fn finish(mut self, to: ImportStatus, message: String) -> Result<Self> {
        if self.status != ImportStatus::Started {
            return Err(ImportError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        self.status = to;
        self.message = Some(message);
        self.completed_at = Some(current_timestamp());
        Ok(self)
    }

    pub fn duration_secs(&self) -> Option<u64> {
        self.completed_at
            .map(|end| end.saturating_sub(self.started_at).max(0) as u64)
    }
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

// ============================================================================
// Repository
// ============================================================================

#[async_trait]
pub trait ImportLogRepository: Send + Sync {
    async fn insert(&self, log: &ImportLog) -> Result<()>;

    /// Persist a terminal state.
    ///
    /// # Errors
    ///
    /// `InvalidStateTransition` if the stored row is no longer `started`,
    /// `LogNotFound` if there is no such row.
    async fn finish(&self, log: &ImportLog) -> Result<()>;

    async fn find_by_id(&self, id: &ImportLogId) -> Result<Option<ImportLog>>;

    async fn latest_for_label(&self, label_id: &str) -> Result<Option<ImportLog>>;

    /// Most recent runs first
    async fn history(&self, label_id: &str, limit: u32) -> Result<Vec<ImportLog>>;
}

pub struct SqliteImportLogRepository {
    pool: SqlitePool,
}

impl SqliteImportLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ImportLogRow {
    id: String,
    label_id: String,
    status: String,
    message: Option<String>,
    started_at: i64,
    completed_at: Option<i64>,
}

impl TryFrom<ImportLogRow> for ImportLog {
    type Error = ImportError;

    fn try_from(row: ImportLogRow) -> Result<Self> {
        Ok(ImportLog {
            id: ImportLogId::from_string(&row.id)?,
            label_id: row.label_id,
            status: row.status.parse()?,
            message: row.message,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
    }
}

fn db_error(err: sqlx::Error) -> ImportError {
    ImportError::Database(err.to_string())
}

#[async_trait]
impl ImportLogRepository for SqliteImportLogRepository {
    async fn insert(&self, log: &ImportLog) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO import_logs (id, label_id, status, message, started_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(log.id.as_str())
        .bind(&log.label_id)
        .bind(log.status.as_str())
        .bind(&log.message)
        .bind(log.started_at)
        .bind(log.completed_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn finish(&self, log: &ImportLog) -> Result<()> {
        if !log.status.is_terminal() {
            return Err(ImportError::InvalidStateTransition {
                from: ImportStatus::Started.as_str().to_string(),
                to: log.status.as_str().to_string(),
            });
        }

        let result = sqlx::query(
            r#"
            UPDATE import_logs
            SET status = ?, message = ?, completed_at = ?
            WHERE id = ? AND status = 'started'
            "#,
        )
        .bind(log.status.as_str())
        .bind(&log.message)
        .bind(log.completed_at)
        .bind(log.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return match self.find_by_id(&log.id).await? {
                Some(stored) => Err(ImportError::InvalidStateTransition {
                    from: stored.status.as_str().to_string(),
                    to: log.status.as_str().to_string(),
                }),
                None => Err(ImportError::LogNotFound(log.id.as_str())),
            };
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &ImportLogId) -> Result<Option<ImportLog>> {
        let row = sqlx::query_as::<_, ImportLogRow>("SELECT * FROM import_logs WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(ImportLog::try_from).transpose()
    }

    async fn latest_for_label(&self, label_id: &str) -> Result<Option<ImportLog>> {
        Ok(self.history(label_id, 1).await?.into_iter().next())
    }

    async fn history(&self, label_id: &str, limit: u32) -> Result<Vec<ImportLog>> {
        let rows = sqlx::query_as::<_, ImportLogRow>(
            r#"
            SELECT * FROM import_logs
            WHERE label_id = ?
            ORDER BY started_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(label_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(ImportLog::try_from).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
