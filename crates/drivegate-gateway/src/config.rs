use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Which storage backend holds file bytes.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Bytes live inside the catalog database.
    Embedded,
    /// Bytes live under a local directory.
    Local,
    /// Bytes live in an S3-compatible bucket; enables direct uploads.
    S3,
}

/// Configuration for the drivegate server.
#[derive(Parser, Debug, Clone)]
#[command(name = "drivegate")]
#[command(about = "Multi-tenant file storage gateway")]
pub struct Config {
    /// TCP host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    /// TCP port to bind to
    #[arg(long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Path of the catalog database
    #[arg(long, default_value = "drivegate.db", env = "DATABASE_PATH")]
    pub database_path: PathBuf,

    /// Storage backend for file bytes
    #[arg(long, value_enum, default_value_t = BackendKind::Local, env = "STORAGE_BACKEND")]
    pub backend: BackendKind,

    /// Root directory for the local backend
    #[arg(long, default_value = "storage", env = "STORAGE_DIR")]
    pub storage_dir: PathBuf,

    /// Bucket name (s3 backend)
    #[arg(long, env = "S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Bucket region (s3 backend)
    #[arg(long, default_value = "us-east-1", env = "S3_REGION")]
    pub s3_region: String,

    /// Custom endpoint URL for R2/MinIO (s3 backend)
    #[arg(long, env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Access key id (s3 backend)
    #[arg(long, env = "S3_ACCESS_KEY_ID")]
    pub s3_access_key_id: Option<String>,

    /// Secret access key (s3 backend)
    #[arg(long, env = "S3_SECRET_ACCESS_KEY")]
    pub s3_secret_access_key: Option<String>,

    /// Size cap for server-mediated uploads, in bytes
    #[arg(long, default_value_t = 10 * 1024 * 1024, env = "MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: u64,

    /// Expiry for minted direct-upload URLs, in seconds
    #[arg(long, default_value_t = 900, env = "UPLOAD_URL_TTL_SECS")]
    pub upload_url_ttl_secs: u64,
}
