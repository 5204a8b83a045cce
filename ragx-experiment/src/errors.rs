use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use ragx_core::{DecodeError, Region};
use ragx_docstore::StoreError;
use ragx_import::ImportError;

use crate::ragged::RaggedResult;

/// Raised when the shared store handle can't be created or reached.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Document store {target} is unreachable: {source}")]
    Unreachable {
        target: String,
        #[source]
        source: StoreError,
    },

    #[error("Can't build a query pool of {workers} workers: {reason}")]
    ThreadPool { workers: usize, reason: String },
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Malformed region {region}: {reason}")]
    MalformedRegion { region: String, reason: String },

    #[error("Query of {region} against collection `{collection}` timed out")]
    Timeout { collection: String, region: Region },

    #[error("Querying collection `{collection}` failed: {source}")]
    Store {
        collection: String,
        #[source]
        source: StoreError,
    },

    #[error("Collection `{collection}` holds a malformed document: {source}")]
    MalformedDocument {
        collection: String,
        #[source]
        source: DecodeError,
    },
}

impl QueryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, QueryError::Timeout { .. })
    }
}

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Unknown sample key `{0}`")]
    UnknownSample(String),

    #[error("Sample key `{0}` is already in the table")]
    DuplicateSample(String),

    #[error("Sample index {index} is out of range for a table of {len} samples")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Can't read sample table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}, line {line}: {reason}")]
    InvalidTable {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

///
/// Some per-sample queries of a fan-out failed. Carries what did succeed.
///
#[derive(Debug)]
pub struct PartialQueryError {
    pub succeeded: RaggedResult,
    pub failures: Vec<(String, QueryError)>,
}

impl fmt::Display for PartialQueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} sample queries over {} failed",
            self.failures.len(),
            self.failures.len() + self.succeeded.len(),
            self.succeeded.region()
        )?;
        for (key, error) in &self.failures {
            write!(f, "; {}: {}", key, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for PartialQueryError {}

impl PartialQueryError {
    pub fn failed_keys(&self) -> Vec<&str> {
        self.failures.iter().map(|(key, _)| key.as_str()).collect()
    }
}

#[derive(Error, Debug)]
pub enum RaggedQueryError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Partial(#[from] PartialQueryError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file {0} must end in `.toml`, `.yaml` or `.yml`")]
    InvalidFileType(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;
