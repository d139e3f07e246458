/// Errors produced by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No bytes exist under the requested locator.
    #[error("object not found")]
    NotFound,

    /// The selected backend does not implement this operation.
    #[error("operation not supported by the {0} backend")]
    Unsupported(&'static str),

    /// I/O failure talking to the underlying store. Not retried here;
    /// the caller decides whether to retry the whole logical operation.
    #[error("storage I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound
        } else {
            StorageError::Io(err.to_string())
        }
    }
}
