/// Errors produced by the catalog stores.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A space with this id is already registered.
    #[error("space {0:?} already exists")]
    AlreadyExists(String),

    /// Password digesting or digest parsing failed.
    #[error("password digest error: {0}")]
    Digest(String),

    /// Database failure.
    #[error("catalog database error: {0}")]
    Db(#[from] sqlx::Error),
}
