use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use drivegate_storage_core::{
    scoped_key, ByteStream, Locator, StorageBackend, StorageError,
};
use futures::{StreamExt, TryStreamExt};
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

/// Storage backend writing objects under a per-space subdirectory of a
/// configured root.
#[derive(Debug, Clone)]
pub struct LocalFileBackend {
    root: PathBuf,
}

impl LocalFileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a locator to an on-disk path.
    ///
    /// Locators are relative `{space_id}/{object}` keys; anything absolute
    /// or containing non-normal components is refused so a crafted locator
    /// can never escape the root.
    fn resolve(&self, locator: &Locator) -> Result<PathBuf, StorageError> {
        let relative = Path::new(locator.as_str());
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || relative.components().count() < 2 {
            return Err(StorageError::Io(format!(
                "malformed locator: {}",
                locator
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageBackend for LocalFileBackend {
    fn backend_name(&self) -> &'static str {
        "local-file"
    }

    #[instrument(skip(self, data), level = "debug", fields(size = data.len()))]
    async fn put(
        &self,
        space_id: &str,
        filename: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<Locator, StorageError> {
        let locator = scoped_key(space_id, filename);
        let path = self.resolve(&locator)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::Io(format!("failed to create space dir: {}", e))
            })?;
        }
        fs::write(&path, &data).await.map_err(|e| {
            StorageError::Io(format!("failed to write {}: {}", path.display(), e))
        })?;
        debug!("Stored {} bytes at {}", data.len(), locator);
        Ok(locator)
    }

    #[instrument(skip(self), level = "debug")]
    async fn get(&self, locator: &Locator) -> Result<ByteStream, StorageError> {
        let path = self.resolve(locator)?;
        let file = fs::File::open(&path).await.map_err(StorageError::from)?;
        let stream = ReaderStream::new(file).map_err(StorageError::from);
        Ok(stream.boxed())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, locator: &Locator) -> Result<(), StorageError> {
        let path = self.resolve(locator)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted {}", locator);
                Ok(())
            }
            // Retrying a delete must succeed.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(format!(
                "failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (LocalFileBackend, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalFileBackend::new(temp_dir.path());
        (backend, temp_dir)
    }

    async fn read_all(mut stream: ByteStream) -> Vec<u8> {
        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk.unwrap());
        }
        buf
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let (backend, _dir) = setup();
        let data = Bytes::from_static(b"hello world");

        let locator = backend
            .put("alice", "notes.txt", data.clone(), "text/plain")
            .await
            .unwrap();
        assert!(locator.is_namespaced_to("alice"));

        let stream = backend.get(&locator).await.unwrap();
        assert_eq!(read_all(stream).await, data);
    }

    #[tokio::test]
    async fn test_same_filename_gets_distinct_locators() {
        let (backend, _dir) = setup();
        let a = backend
            .put("alice", "dup.bin", Bytes::from_static(b"a"), "application/octet-stream")
            .await
            .unwrap();
        let b = backend
            .put("alice", "dup.bin", Bytes::from_static(b"b"), "application/octet-stream")
            .await
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(read_all(backend.get(&a).await.unwrap()).await, b"a");
        assert_eq!(read_all(backend.get(&b).await.unwrap()).await, b"b");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (backend, _dir) = setup();
        let err = backend
            .get(&Locator::new("alice/nope_gone.txt"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (backend, _dir) = setup();
        let locator = backend
            .put("alice", "gone.txt", Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap();

        backend.delete(&locator).await.unwrap();
        // Second delete of the same locator is still success.
        backend.delete(&locator).await.unwrap();

        let err = backend.get(&locator).await.err().unwrap();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn test_traversal_locator_is_rejected() {
        let (backend, _dir) = setup();
        for bad in ["../escape", "/etc/passwd", "alice/../bob/steal.txt"] {
            let err = backend.get(&Locator::new(bad)).await.err().unwrap();
            assert!(matches!(err, StorageError::Io(_)), "{bad} should be refused");
        }
    }

    #[tokio::test]
    async fn test_mint_upload_url_unsupported() {
        let (backend, _dir) = setup();
        let err = backend
            .mint_upload_url("alice", "big.bin", "application/octet-stream", std::time::Duration::from_secs(60))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StorageError::Unsupported("local-file")));
    }
}
