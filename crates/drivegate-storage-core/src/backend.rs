use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::StorageError;
use crate::locator::Locator;

/// Lazy, finite, non-restartable sequence of content chunks.
///
/// Lets the gateway stream arbitrarily large objects to the caller in
/// constant memory.
pub type ByteStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// A time-boxed URL a client can use to upload bytes directly to the
/// backend, together with the locator the bytes will land under.
#[derive(Debug, Clone)]
pub struct PresignedUpload {
    pub url: String,
    pub locator: Locator,
}

/// Byte-level storage operations, polymorphic over the embedded-blob,
/// local-filesystem and remote object store variants.
///
/// Implementations own locator generation: `put` and `mint_upload_url`
/// return the durable locator the caller must record. Backends never touch
/// the file catalog; sequencing catalog writes against byte durability is
/// the coordinator's job.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short identifier used in logs and `Unsupported` errors.
    fn backend_name(&self) -> &'static str;

    /// Store `data` for `space_id` and return the durable locator.
    ///
    /// `filename` is a hint for locator derivation; backends that name
    /// objects by row id ignore it.
    async fn put(
        &self,
        space_id: &str,
        filename: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<Locator, StorageError>;

    /// Open the content under `locator` as a chunk stream.
    async fn get(&self, locator: &Locator) -> Result<ByteStream, StorageError>;

    /// Remove the bytes under `locator`.
    ///
    /// Safe to retry: deleting an already-deleted locator is success.
    async fn delete(&self, locator: &Locator) -> Result<(), StorageError>;

    /// Mint a time-limited direct-upload URL for a fresh locator under
    /// `space_id`. Only the remote object store supports this.
    async fn mint_upload_url(
        &self,
        space_id: &str,
        filename: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUpload, StorageError> {
        let _ = (space_id, filename, content_type, ttl);
        Err(StorageError::Unsupported(self.backend_name()))
    }
}
