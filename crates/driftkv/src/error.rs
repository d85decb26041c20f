use thiserror::Error;

/// Result type alias using [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested key is not in the store.
    #[error("key not found")]
    KeyNotFound,

    /// `close` was called for a path that has no open store.
    #[error("store not open")]
    DbNotOpen,

    /// The store's worker shut down while the request was in flight, or
    /// before it could be submitted. The request may or may not have taken
    /// effect.
    #[error("store closed")]
    Closed,

    /// Strict replay found an unreadable record in the key log.
    #[error("corrupt key log: {0}")]
    Corrupt(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<keylog::LogError> for StoreError {
    fn from(err: keylog::LogError) -> Self {
        match err {
            keylog::LogError::Io(e) => StoreError::Io(e),
            keylog::LogError::Corrupt(offset) => {
                StoreError::Corrupt(format!("unreadable record at offset {offset}"))
            }
        }
    }
}
