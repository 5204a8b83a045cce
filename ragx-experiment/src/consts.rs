//! Environment variables and defaults of an experiment session.

/// Environment variable naming the store file when the configuration does not.
///
/// ```bash
/// export RAGX_STORE=/data/roadmap/store.sqlite
/// ```
pub const RAGX_STORE_ENV: &str = "RAGX_STORE";

/// Store file used when neither the configuration nor `RAGX_STORE` names one, below `$HOME`.
pub const DEFAULT_STORE_FILE: &str = ".ragx/store.sqlite";

pub const DEFAULT_POOL_SIZE: usize = 4;

pub const DEFAULT_WORKERS: usize = 4;

/// Per sample query time limit in milliseconds. `0` disables the limit.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Column of a sample table naming the backing collection, when it differs from the key.
pub const COLLECTION_COLUMN: &str = "collection";

/// Attribute set by `import_sample` to the dialect a sample was imported with.
pub const FORMAT_ATTRIBUTE: &str = "format";
