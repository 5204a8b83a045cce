use std::path::PathBuf;

use thiserror::Error;

use ragx_core::SchemaError;
use ragx_docstore::StoreError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Can't read interval file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}, line {line}: {source}")]
    Schema {
        path: PathBuf,
        line: usize,
        #[source]
        source: SchemaError,
    },

    #[error("Writing {path} into collection `{collection}` failed: {source}")]
    Store {
        path: PathBuf,
        collection: String,
        #[source]
        source: StoreError,
    },

    #[error("Writing records into collection `{collection}` failed: {source}")]
    Write {
        collection: String,
        #[source]
        source: StoreError,
    },

    #[error("Sample key must not be empty")]
    InvalidSampleKey,

    #[error(transparent)]
    UnknownDialect(SchemaError),
}

impl ImportError {
    /// The source line of a normalization failure, if that is what this is.
    pub fn line(&self) -> Option<usize> {
        match self {
            ImportError::Schema { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type ImportResult<T> = std::result::Result<T, ImportError>;
