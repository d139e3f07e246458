use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use drivegate_catalog::{CredentialStore, FileCatalog, FileRecord, SessionRegistry, Space};
use drivegate_storage_core::{ByteStream, Locator, StorageBackend};
use tracing::{debug, instrument, warn};

use crate::content_type;
use crate::error::GatewayError;

/// Operational limits, configured at startup.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Cap for server-mediated uploads. The direct-upload path is not
    /// capped here; the backend or a fronting proxy owns that limit.
    pub max_upload_bytes: u64,
    /// Expiry for minted direct-upload URLs, enforced by the backend.
    pub upload_url_ttl: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            upload_url_ttl: Duration::from_secs(900),
        }
    }
}

/// A minted direct-upload grant: the client PUTs bytes at `upload_url`,
/// then confirms with `locator`. No catalog row exists until confirmation.
#[derive(Debug, Clone)]
pub struct DirectUploadGrant {
    pub upload_url: String,
    pub locator: Locator,
    pub filename: String,
    pub size: i64,
}

/// An opened file ready to stream to the caller.
pub struct FileContent {
    pub filename: String,
    pub content_type: &'static str,
    pub size: i64,
    pub stream: ByteStream,
}

/// Orchestrates credential, session, catalog and backend operations.
///
/// Ordering contract, both directions:
/// - upload: backend bytes first, catalog row second. A backend failure
///   aborts before any metadata exists.
/// - delete: backend deletion first, catalog row second. A backend
///   failure keeps the row, so the only pointer to live bytes survives
///   and the operation can be retried.
pub struct Gateway {
    credentials: CredentialStore,
    sessions: SessionRegistry,
    catalog: FileCatalog,
    backend: Arc<dyn StorageBackend>,
    limits: Limits,
}

impl Gateway {
    pub fn new(
        credentials: CredentialStore,
        sessions: SessionRegistry,
        catalog: FileCatalog,
        backend: Arc<dyn StorageBackend>,
        limits: Limits,
    ) -> Self {
        Self {
            credentials,
            sessions,
            catalog,
            backend,
            limits,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Resolve a bearer token to its space, or `Unauthorized`.
    async fn authorize(&self, token: &str) -> Result<String, GatewayError> {
        self.sessions
            .resolve(token)
            .await?
            .ok_or(GatewayError::Unauthorized)
    }

    // =========================================================================
    // Space management
    // =========================================================================

    #[instrument(skip(self, password), level = "debug")]
    pub async fn create_space(
        &self,
        space_id: &str,
        password: &str,
    ) -> Result<Space, GatewayError> {
        Ok(self.credentials.register(space_id, password).await?)
    }

    /// Verify credentials and mint a session token. The token is returned
    /// exactly once and never logged.
    #[instrument(skip(self, password), level = "debug")]
    pub async fn login(&self, space_id: &str, password: &str) -> Result<String, GatewayError> {
        if !self.credentials.verify(space_id, password).await? {
            return Err(GatewayError::Unauthorized);
        }
        Ok(self.sessions.create_session(space_id).await?)
    }

    /// Revoke a session. Idempotent: unknown tokens are not an error.
    #[instrument(skip_all, level = "debug")]
    pub async fn logout(&self, token: &str) -> Result<(), GatewayError> {
        Ok(self.sessions.revoke(token).await?)
    }

    // =========================================================================
    // File operations
    // =========================================================================

    #[instrument(skip_all, level = "debug")]
    pub async fn list_files(&self, token: &str) -> Result<Vec<FileRecord>, GatewayError> {
        let space_id = self.authorize(token).await?;
        Ok(self.catalog.list(&space_id).await?)
    }

    /// Server-mediated upload: size-check, store bytes, then record.
    #[instrument(skip(self, token, data), level = "debug", fields(size = data.len()))]
    pub async fn upload(
        &self,
        token: &str,
        filename: &str,
        data: Bytes,
    ) -> Result<FileRecord, GatewayError> {
        let space_id = self.authorize(token).await?;

        if data.len() as u64 > self.limits.max_upload_bytes {
            return Err(GatewayError::TooLarge {
                limit: self.limits.max_upload_bytes,
            });
        }

        let size = data.len() as i64;
        let locator = self
            .backend
            .put(&space_id, filename, data, content_type::infer(filename))
            .await?;
        let record = self
            .catalog
            .record_upload(&space_id, filename, &locator, size)
            .await?;
        debug!("Uploaded file {} for space {}", record.id, space_id);
        Ok(record)
    }

    /// Mint a direct-upload URL. The locator is reserved but no catalog
    /// row exists yet; a client that never confirms leaves orphaned
    /// backend bytes that no tenant can ever observe.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn request_direct_upload(
        &self,
        token: &str,
        filename: &str,
        size: i64,
    ) -> Result<DirectUploadGrant, GatewayError> {
        let space_id = self.authorize(token).await?;
        let presigned = self
            .backend
            .mint_upload_url(
                &space_id,
                filename,
                content_type::infer(filename),
                self.limits.upload_url_ttl,
            )
            .await?;
        Ok(DirectUploadGrant {
            upload_url: presigned.url,
            locator: presigned.locator,
            filename: filename.to_string(),
            size,
        })
    }

    /// Record a direct upload the client reports as complete. The locator
    /// must be namespaced under the caller's space; anything else is
    /// rejected before any catalog write.
    #[instrument(skip(self, token, locator), level = "debug")]
    pub async fn confirm_direct_upload(
        &self,
        token: &str,
        locator: &Locator,
        filename: &str,
        size: i64,
    ) -> Result<FileRecord, GatewayError> {
        let space_id = self.authorize(token).await?;
        if !locator.is_namespaced_to(&space_id) {
            warn!("Rejected confirm with foreign locator for space {}", space_id);
            return Err(GatewayError::InvalidLocator);
        }
        Ok(self
            .catalog
            .record_upload(&space_id, filename, locator, size)
            .await?)
    }

    /// Open a file for download: opaque content type, attachment intent.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn download(&self, token: &str, file_id: i64) -> Result<FileContent, GatewayError> {
        self.open(token, file_id, false).await
    }

    /// Open a file for inline preview with the inferred content type.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn preview(&self, token: &str, file_id: i64) -> Result<FileContent, GatewayError> {
        self.open(token, file_id, true).await
    }

    async fn open(
        &self,
        token: &str,
        file_id: i64,
        inferred_type: bool,
    ) -> Result<FileContent, GatewayError> {
        let space_id = self.authorize(token).await?;
        let record = self
            .catalog
            .find(&space_id, file_id)
            .await?
            .ok_or(GatewayError::NotFound)?;
        let stream = self.backend.get(&record.locator).await?;
        let content_type = if inferred_type {
            content_type::infer(&record.filename)
        } else {
            content_type::OCTET_STREAM
        };
        Ok(FileContent {
            filename: record.filename,
            content_type,
            size: record.size,
            stream,
        })
    }

    /// Delete a file: ownership check, backend bytes, then catalog row.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn delete_file(&self, token: &str, file_id: i64) -> Result<(), GatewayError> {
        let space_id = self.authorize(token).await?;
        let record = self
            .catalog
            .find(&space_id, file_id)
            .await?
            .ok_or(GatewayError::NotFound)?;

        // Backend first. If this fails the catalog row survives and the
        // delete can be retried.
        self.backend.delete(&record.locator).await?;
        self.catalog.remove(record.id).await?;
        debug!("Deleted file {} for space {}", file_id, space_id);
        Ok(())
    }
}
