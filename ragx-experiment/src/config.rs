use std::env;
use std::ffi::OsStr;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs::home_dir;
use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_POOL_SIZE, DEFAULT_STORE_FILE, DEFAULT_TIMEOUT_MS, DEFAULT_WORKERS, RAGX_STORE_ENV,
};
use crate::errors::ConfigError;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Store file, environment variables are expanded. Falls back to `RAGX_STORE`.
    pub path: Option<String>,
    pub pool_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: StoreBackend::default(),
            path: None,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    pub workers: usize,
    /// Per sample time limit, `0` for none.
    pub timeout_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            workers: DEFAULT_WORKERS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ImportConfig {
    pub batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            batch_size: ragx_import::consts::DEFAULT_BATCH_SIZE,
        }
    }
}

///
/// Settings of an experiment session: which store to open, how wide the query fan-out is
/// and how imports are batched. Every section and field is optional.
///
/// ```toml
/// [store]
/// backend = "sqlite"
/// path = "$HOME/.ragx/store.sqlite"
/// pool_size = 4
///
/// [query]
/// workers = 4
/// timeout_ms = 30000
///
/// [import]
/// batch_size = 1000
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ExperimentConfig {
    pub store: StoreConfig,
    pub query: QueryConfig,
    pub import: ImportConfig,
}

impl ExperimentConfig {
    /// A configuration backed by an in-process store.
    pub fn in_memory() -> Self {
        let mut config = ExperimentConfig::default();
        config.store.backend = StoreBackend::Memory;
        config
    }

    pub fn with_store_path(mut self, path: impl Into<String>) -> Self {
        self.store.path = Some(path.into());
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.query.workers = workers;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.query.timeout_ms = timeout_ms;
        self
    }

    ///
    /// The store file, with environment variables expanded.
    ///
    /// Unset variables are left as they are, like an unexpandable path in a shell.
    pub fn store_path(&self) -> PathBuf {
        let raw = self
            .store
            .path
            .clone()
            .unwrap_or_else(|| get_default_store_path().to_string_lossy().into_owned());
        let expanded = shellexpand::env(&raw)
            .unwrap_or_else(|_| raw.clone().into())
            .into_owned();
        PathBuf::from(expanded)
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.query.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Fan-out width, at least one worker.
    pub fn workers(&self) -> usize {
        self.query.workers.max(1)
    }
}

impl TryFrom<&Path> for ExperimentConfig {
    type Error = ConfigError;

    ///
    /// Read a configuration from a `.toml`, `.yaml` or `.yml` file.
    ///
    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        match path.extension().and_then(OsStr::to_str) {
            Some("toml") => {
                let raw = read_to_string(path)?;
                Ok(toml::from_str(&raw)?)
            }
            Some("yaml") | Some("yml") => {
                let raw = read_to_string(path)?;
                Ok(serde_yaml::from_str(&raw)?)
            }
            _ => Err(ConfigError::InvalidFileType(path.to_path_buf())),
        }
    }
}

/// Get the default store file from `RAGX_STORE`, else `~/.ragx/store.sqlite`
///
/// # Returns
/// - path to the store file
pub fn get_default_store_path() -> PathBuf {
    if let Ok(val) = env::var(RAGX_STORE_ENV) {
        PathBuf::from(val)
    } else {
        let home = env::var("HOME")
            .ok()
            .or_else(|| home_dir().map(|p| p.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "/tmp".to_string());

        PathBuf::from(home).join(DEFAULT_STORE_FILE)
    }
}
