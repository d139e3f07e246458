//! SQLite persistence for drivegate.
//!
//! One database holds the three catalogs the gateway depends on:
//! - `spaces`: tenant identities and password digests
//! - `sessions`: bearer tokens mapping to space identities
//! - `files`: the authoritative ledger of uploaded files and their locators
//!
//! plus the `blobs` table backing [`EmbeddedBlobBackend`], the storage
//! variant that keeps file bytes inside the catalog database itself.
//!
//! [`Database`] owns the connection pool with an explicit lifecycle (open at
//! process start, close at shutdown); component handles are cheap clones
//! sharing the pool and are injected into the coordinator rather than
//! reached through ambient state.

mod blobs;
mod credentials;
mod db;
mod error;
mod files;
mod sessions;

pub use blobs::EmbeddedBlobBackend;
pub use credentials::{CredentialStore, Space};
pub use db::Database;
pub use error::CatalogError;
pub use files::{FileCatalog, FileRecord};
pub use sessions::SessionRegistry;
