//! Gateway coordinator and HTTP surface.
//!
//! The coordinator ([`Gateway`]) is the consistency core: it resolves
//! bearer tokens to space identities, performs ownership-scoped catalog
//! lookups before any byte-level work, and sequences catalog writes
//! strictly after backend confirmation so that no catalog row ever points
//! at bytes that were never stored.
//!
//! The HTTP layer ([`http`]) is a thin collaborator: it parses and
//! validates requests, hands the coordinator a `(space, operation,
//! payload)` tuple via the bearer token, and maps results onto responses.

pub mod config;
pub mod content_type;
pub mod error;
pub mod gateway;
pub mod http;

pub use config::{BackendKind, Config};
pub use error::GatewayError;
pub use gateway::{DirectUploadGrant, FileContent, Gateway, Limits};
