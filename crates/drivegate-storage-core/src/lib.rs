//! Core traits and types for drivegate storage backends.
//!
//! This crate defines the abstractions shared between the embedded-blob,
//! local-filesystem and remote object store implementations:
//! - `StorageBackend`: byte-level put/get/delete plus presigned direct uploads
//! - `Locator`: backend-specific reference to stored bytes
//! - `ByteStream`: lazy, finite, chunked content stream

mod backend;
mod error;
mod locator;

pub use backend::{ByteStream, PresignedUpload, StorageBackend};
pub use error::StorageError;
pub use locator::{random_suffix, sanitize_filename, scoped_key, Locator};
