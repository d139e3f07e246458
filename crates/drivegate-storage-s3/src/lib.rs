//! Remote object store backend over the S3 API.
//!
//! Works against AWS S3 proper as well as S3-compatible stores (Cloudflare
//! R2, MinIO) via a custom endpoint. This is the only backend that can mint
//! presigned direct-upload URLs, letting clients push large files straight
//! to the bucket without proxying bytes through the gateway.

mod backend;

pub use backend::{S3Backend, S3Options};
