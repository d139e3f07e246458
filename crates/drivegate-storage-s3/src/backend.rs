use std::time::Duration;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::{BehaviorVersion, Credentials};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream as SdkByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use drivegate_storage_core::{
    scoped_key, ByteStream, Locator, PresignedUpload, StorageBackend, StorageError,
};
use futures::{StreamExt, TryStreamExt};
use rand::Rng;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument, warn};

/// Maximum retries for transient errors (429 / 5xx).
const MAX_RETRIES: u32 = 5;
/// Base delay for exponential backoff.
const BASE_DELAY_MS: u64 = 200;
/// S3 caps presigned URL expiry at 7 days.
const MAX_PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Connection settings for an S3-compatible store.
#[derive(Debug, Clone)]
pub struct S3Options {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for R2/MinIO; `None` targets AWS S3 proper.
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Remote object store backend.
///
/// Object layout in the bucket:
/// ```text
/// {bucket}/
///   {space_id}/
///     {suffix}_{filename}
/// ```
#[derive(Clone)]
pub struct S3Backend {
    client: S3Client,
    bucket: String,
}

impl S3Backend {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Build a backend from static credentials and an optional custom
    /// endpoint. Path-style addressing is forced for custom endpoints
    /// (required by MinIO, harmless for R2).
    pub fn from_options(opts: S3Options) -> Self {
        let credentials = Credentials::new(
            &opts.access_key_id,
            &opts.secret_access_key,
            None,
            None,
            "drivegate",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(opts.region));

        if let Some(endpoint) = opts.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::new(S3Client::from_conf(builder.build()), opts.bucket)
    }

    /// Sleep with exponential backoff plus jitter.
    async fn backoff_sleep(attempt: u32) {
        let base = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt));
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..50));
        tokio::time::sleep(base + jitter).await;
    }

    /// Whether an S3 error is worth retrying (429, 5xx, timeout, dispatch).
    fn is_retryable(err: &SdkError<impl std::fmt::Debug>) -> bool {
        match err {
            SdkError::ServiceError(e) => {
                let status = e.raw().status().as_u16();
                status == 429 || (500..=504).contains(&status)
            }
            SdkError::ResponseError(e) => {
                let status = e.raw().status().as_u16();
                status == 429 || (500..=504).contains(&status)
            }
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => true,
            _ => false,
        }
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    fn backend_name(&self) -> &'static str {
        "s3"
    }

    #[instrument(skip(self, data), level = "debug", fields(size = data.len()))]
    async fn put(
        &self,
        space_id: &str,
        filename: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<Locator, StorageError> {
        let locator = scoped_key(space_id, filename);

        for attempt in 0..=MAX_RETRIES {
            let result = self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(locator.as_str())
                .content_type(content_type)
                .body(SdkByteStream::from(data.clone()))
                .send()
                .await;

            match result {
                Ok(_) => {
                    debug!("Stored {} bytes under {}", data.len(), locator);
                    return Ok(locator);
                }
                Err(e) if Self::is_retryable(&e) && attempt < MAX_RETRIES => {
                    warn!(attempt, key = %locator, "put_object retryable error, retrying");
                    Self::backoff_sleep(attempt).await;
                }
                Err(e) => return Err(StorageError::Io(format!("put_object error: {}", e))),
            }
        }
        unreachable!()
    }

    #[instrument(skip(self), level = "debug")]
    async fn get(&self, locator: &Locator) -> Result<ByteStream, StorageError> {
        for attempt in 0..=MAX_RETRIES {
            let result = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(locator.as_str())
                .send()
                .await;

            match result {
                Ok(output) => {
                    let reader = output.body.into_async_read();
                    let stream = ReaderStream::new(reader).map_err(StorageError::from);
                    return Ok(stream.boxed());
                }
                Err(e) if Self::is_retryable(&e) && attempt < MAX_RETRIES => {
                    warn!(attempt, key = %locator, "get_object retryable error, retrying");
                    Self::backoff_sleep(attempt).await;
                }
                Err(e) => {
                    let service_error = e.into_service_error();
                    if service_error.is_no_such_key() {
                        return Err(StorageError::NotFound);
                    }
                    return Err(StorageError::Io(format!(
                        "get_object error: {}",
                        service_error
                    )));
                }
            }
        }
        unreachable!()
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, locator: &Locator) -> Result<(), StorageError> {
        for attempt in 0..=MAX_RETRIES {
            let result = self
                .client
                .delete_object()
                .bucket(&self.bucket)
                .key(locator.as_str())
                .send()
                .await;

            match result {
                // S3 delete succeeds for absent keys, which gives us
                // retry-safety for free.
                Ok(_) => {
                    debug!("Deleted {}", locator);
                    return Ok(());
                }
                Err(e) if Self::is_retryable(&e) && attempt < MAX_RETRIES => {
                    warn!(attempt, key = %locator, "delete_object retryable error, retrying");
                    Self::backoff_sleep(attempt).await;
                }
                Err(e) => return Err(StorageError::Io(format!("delete_object error: {}", e))),
            }
        }
        unreachable!()
    }

    #[instrument(skip(self), level = "debug")]
    async fn mint_upload_url(
        &self,
        space_id: &str,
        filename: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUpload, StorageError> {
        if ttl.is_zero() || ttl > MAX_PRESIGN_TTL {
            return Err(StorageError::Io(format!(
                "presign TTL must be between 1 second and 7 days, got {}s",
                ttl.as_secs()
            )));
        }

        let locator = scoped_key(space_id, filename);
        let presigning = PresigningConfig::builder()
            .expires_in(ttl)
            .build()
            .map_err(|e| StorageError::Io(format!("invalid presigning config: {}", e)))?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(locator.as_str())
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Io(format!("presign error: {}", e)))?;

        debug!("Minted direct-upload URL for {} (ttl {}s)", locator, ttl.as_secs());
        Ok(PresignedUpload {
            url: presigned.uri().to_string(),
            locator,
        })
    }
}
