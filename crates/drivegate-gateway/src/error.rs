use drivegate_catalog::CatalogError;
use drivegate_storage_core::StorageError;

/// Gateway-level error taxonomy.
///
/// Every error is terminal for the current request; nothing is retried
/// automatically inside the core. `NotFound` deliberately covers both
/// "record absent" and "record owned by another space" so existence never
/// leaks across tenants.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("space id already taken")]
    AlreadyExists,

    #[error("invalid credentials or token")]
    Unauthorized,

    #[error("file not found")]
    NotFound,

    #[error("upload exceeds the {limit}-byte cap")]
    TooLarge { limit: u64 },

    #[error("locator is not namespaced to the caller's space")]
    InvalidLocator,

    #[error("operation not supported by the {0} backend")]
    Unsupported(&'static str),

    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("catalog failure: {0}")]
    Catalog(String),
}

impl From<StorageError> for GatewayError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => GatewayError::NotFound,
            StorageError::Unsupported(backend) => GatewayError::Unsupported(backend),
            StorageError::Io(msg) => GatewayError::Backend(msg),
        }
    }
}

impl From<CatalogError> for GatewayError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::AlreadyExists(_) => GatewayError::AlreadyExists,
            CatalogError::Digest(msg) => GatewayError::Catalog(msg),
            CatalogError::Db(e) => GatewayError::Catalog(e.to_string()),
        }
    }
}
