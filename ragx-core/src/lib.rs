//! Core data model for ragx.
//!
//! This crate holds the pieces every other ragx crate agrees on: genomic [`Region`]s, the
//! normalized [`IntervalRecord`] that gets written to (and read back from) a document store,
//! and the [`SchemaRegistry`] describing how each supported interval-file dialect maps its
//! columns onto a record.
//!
//! ## Quick Start
//!
//! ```rust
//! use ragx_core::schema::{normalize, SchemaRegistry};
//!
//! let registry = SchemaRegistry::default();
//! let chromhmm = registry.dialect_for("chromHMM").unwrap();
//!
//! let record = normalize("chr1\t150\t250\tA", chromhmm).unwrap();
//! assert_eq!(record.start, 150);
//! assert_eq!(record.get("state").unwrap().as_text(), Some("A"));
//! ```
//!
//! All coordinates are normalized to 0-based, half-open `[start, end)` intervals regardless of
//! the dialect they were read from.
pub mod errors;
pub mod models;
pub mod schema;
pub mod utils;

// re-exports
pub use self::errors::{DecodeError, RegionParseError, SchemaError};
pub use self::models::{FieldValue, IntervalRecord, Region};
pub use self::schema::{Dialect, FieldSet, SchemaRegistry};
