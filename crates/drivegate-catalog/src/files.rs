use chrono::{DateTime, Utc};
use drivegate_storage_core::Locator;
use sqlx::{FromRow, Pool, Sqlite};
use tracing::{debug, instrument};

use crate::error::CatalogError;

/// One row of the file ledger. The locator stays internal to the gateway;
/// responses expose only id, filename, size and timestamp.
#[derive(Debug, Clone, FromRow)]
pub struct FileRecord {
    pub id: i64,
    pub space_id: String,
    pub filename: String,
    #[sqlx(try_from = "String")]
    pub locator: Locator,
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// The authoritative ledger of which logical files exist, their ownership,
/// size and backend locator.
///
/// Sequencing contract: `record_upload` runs only after backend bytes are
/// confirmed durable, and `remove` only after backend deletion succeeded.
/// The coordinator owns that ordering; the catalog just persists rows.
#[derive(Clone)]
pub struct FileCatalog {
    pool: Pool<Sqlite>,
}

impl FileCatalog {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Insert a new catalog row and return it.
    #[instrument(skip(self), level = "debug")]
    pub async fn record_upload(
        &self,
        space_id: &str,
        filename: &str,
        locator: &Locator,
        size: i64,
    ) -> Result<FileRecord, CatalogError> {
        let uploaded_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO files (space_id, filename, locator, size, uploaded_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(space_id)
        .bind(filename)
        .bind(locator.as_str())
        .bind(size)
        .bind(uploaded_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Recorded file {} ({} bytes) for space {}", id, size, space_id);
        Ok(FileRecord {
            id,
            space_id: space_id.to_string(),
            filename: filename.to_string(),
            locator: locator.clone(),
            size,
            uploaded_at,
        })
    }

    /// All records for a space. Callers must not rely on the order.
    #[instrument(skip(self), level = "debug")]
    pub async fn list(&self, space_id: &str) -> Result<Vec<FileRecord>, CatalogError> {
        let records = sqlx::query_as::<_, FileRecord>(
            "SELECT id, space_id, filename, locator, size, uploaded_at
             FROM files WHERE space_id = ?",
        )
        .bind(space_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Ownership-scoped lookup. A record belonging to another space is
    /// reported identically to a nonexistent one.
    #[instrument(skip(self), level = "debug")]
    pub async fn find(
        &self,
        space_id: &str,
        file_id: i64,
    ) -> Result<Option<FileRecord>, CatalogError> {
        let record = sqlx::query_as::<_, FileRecord>(
            "SELECT id, space_id, filename, locator, size, uploaded_at
             FROM files WHERE id = ? AND space_id = ?",
        )
        .bind(file_id)
        .bind(space_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Delete a catalog row.
    #[instrument(skip(self), level = "debug")]
    pub async fn remove(&self, file_id: i64) -> Result<(), CatalogError> {
        sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await?;
        debug!("Removed file {}", file_id);
        Ok(())
    }
}
