use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Pool, Sqlite};
use tracing::debug;

use crate::blobs::EmbeddedBlobBackend;
use crate::credentials::CredentialStore;
use crate::error::CatalogError;
use crate::files::FileCatalog;
use crate::sessions::SessionRegistry;

/// Schema statements, applied in order on open. All are idempotent.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS spaces (
        space_id TEXT PRIMARY KEY,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        space_id TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    // AUTOINCREMENT keeps file ids monotonic: a deleted id is never handed
    // out again.
    "CREATE TABLE IF NOT EXISTS files (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        space_id TEXT NOT NULL,
        filename TEXT NOT NULL,
        locator TEXT NOT NULL UNIQUE,
        size INTEGER NOT NULL,
        uploaded_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_files_space ON files(space_id)",
    // Bytes for the embedded-blob backend. Same AUTOINCREMENT argument:
    // blob locators are never reused after deletion.
    "CREATE TABLE IF NOT EXISTS blobs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content BLOB NOT NULL,
        content_type TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
];

/// Handle on the catalog database with an explicit lifecycle.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if missing) and migrate the database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CatalogError::Db(sqlx::Error::Io(e)))?;
            }
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Prevent transient "database is locked" errors under
            // concurrent request handling.
            .busy_timeout(Duration::from_secs(5));

        // SQLite permits limited write concurrency; a single pooled
        // connection avoids persistent lock failures under load.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        debug!("Opened catalog database at {}", path.display());
        Ok(db)
    }

    /// Open a fresh in-memory database. Used by tests.
    pub async fn open_in_memory() -> Result<Self, CatalogError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // The in-memory database lives and dies with its one connection,
        // so the pool must never recycle it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<(), CatalogError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the pool. Called once at shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn credentials(&self) -> CredentialStore {
        CredentialStore::new(self.pool.clone())
    }

    pub fn sessions(&self) -> SessionRegistry {
        SessionRegistry::new(self.pool.clone())
    }

    pub fn files(&self) -> FileCatalog {
        FileCatalog::new(self.pool.clone())
    }

    pub fn blob_backend(&self) -> EmbeddedBlobBackend {
        EmbeddedBlobBackend::new(self.pool.clone())
    }
}
