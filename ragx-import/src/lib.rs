//! Import genomic interval files into a document store.
//!
//! Each file is one sample. Its rows are normalized against a dialect from the
//! [`ragx_core::SchemaRegistry`] and written, in batches, to a collection named after the
//! sample key. Files may be plain text or gzipped.
//!
//! ```rust,no_run
//! use ragx_core::SchemaRegistry;
//! use ragx_docstore::SqliteStore;
//! use ragx_import::Importer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::open("/tmp/ragx/store.sqlite", 4)?;
//! let registry = SchemaRegistry::default();
//!
//! let report = Importer::new(&registry).import_file("E003_15_coreMarks.bed.gz", "E003", "chromHMM", &store)?;
//! println!("{} records into {}", report.records_written, report.collection);
//! # Ok(())
//! # }
//! ```
pub mod consts;
pub mod errors;
pub mod importer;

// re-exports
pub use self::errors::{ImportError, ImportResult};
pub use self::importer::{ImportReport, Importer, import_file, import_records};
