use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Can't connect to document store {target}: {reason}")]
    Connection { target: String, reason: String },

    #[error("Query against collection `{0}` exceeded its time limit")]
    Timeout(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid collection name: {0:?}")]
    InvalidCollection(String),

    #[error("Document store lock was poisoned")]
    Poisoned,

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout(_))
    }
}

/// Result type alias for document store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
