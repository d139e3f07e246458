use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use drivegate_storage_core::{ByteStream, Locator, StorageBackend, StorageError};
use futures::{stream, StreamExt};
use sqlx::{Pool, Sqlite};
use tracing::{debug, instrument};

/// Chunk size for re-streaming stored blobs: 256KB.
const CHUNK_SIZE: usize = 256 * 1024;

/// Storage backend keeping file bytes inside the catalog database.
///
/// The locator is the `blobs` row id rendered as a string; AUTOINCREMENT
/// guarantees a deleted locator is never handed out again. Suited to small
/// deployments where a separate object store is not worth operating.
#[derive(Clone)]
pub struct EmbeddedBlobBackend {
    pool: Pool<Sqlite>,
}

impl EmbeddedBlobBackend {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// A locator that is not a row id cannot exist in this backend.
    fn blob_id(locator: &Locator) -> Option<i64> {
        locator.as_str().parse().ok()
    }
}

#[async_trait]
impl StorageBackend for EmbeddedBlobBackend {
    fn backend_name(&self) -> &'static str {
        "embedded-blob"
    }

    #[instrument(skip(self, data), level = "debug", fields(size = data.len()))]
    async fn put(
        &self,
        _space_id: &str,
        _filename: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<Locator, StorageError> {
        let result = sqlx::query(
            "INSERT INTO blobs (content, content_type, created_at) VALUES (?, ?, ?)",
        )
        .bind(data.as_ref())
        .bind(content_type)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Io(e.to_string()))?;

        let id = result.last_insert_rowid();
        debug!("Stored {} bytes as blob {}", data.len(), id);
        Ok(Locator::new(id.to_string()))
    }

    #[instrument(skip(self), level = "debug")]
    async fn get(&self, locator: &Locator) -> Result<ByteStream, StorageError> {
        let Some(id) = Self::blob_id(locator) else {
            return Err(StorageError::NotFound);
        };

        let content = sqlx::query_scalar::<_, Vec<u8>>("SELECT content FROM blobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?
            .ok_or(StorageError::NotFound)?;

        let chunks: Vec<Result<Bytes, StorageError>> = content
            .chunks(CHUNK_SIZE)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, locator: &Locator) -> Result<(), StorageError> {
        let Some(id) = Self::blob_id(locator) else {
            // Nothing could ever live under a malformed locator.
            return Ok(());
        };
        sqlx::query("DELETE FROM blobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        debug!("Deleted blob {}", id);
        Ok(())
    }
}
