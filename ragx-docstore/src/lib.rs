//! The document-store boundary ragx talks to.
//!
//! ragx never owns interval rows itself: every sample lives in a named collection of an
//! external document store and is reached through two verbs only, `insert_many` while
//! importing and `find` (filter + skip + limit) while querying. This crate defines that
//! boundary as the [`DocumentStore`] trait together with the filter expression it accepts,
//! and ships two adapters:
//!
//! - [`MemoryStore`]: an in-process store, handy for tests and small sessions.
//! - [`SqliteStore`] (feature `sqlite`, on by default): documents kept as JSON in an SQLite
//!   file, with a connection pool so concurrent workers never share a connection.
//!
//! ```rust
//! use ragx_docstore::{DocumentStore, Filter, FindOptions, MemoryStore};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! let doc = json!({"chrom": "chr1", "start": 100, "end": 200});
//! store.insert_many("s1", &[doc.as_object().unwrap().clone()]).unwrap();
//!
//! let filter = Filter::eq("chrom", "chr1").and(Filter::lt("start", 150));
//! let hits = store.find("s1", &filter, &FindOptions::default()).unwrap();
//! assert_eq!(hits.len(), 1);
//! ```
pub mod errors;
pub mod filter;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod pool;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

// re-exports
pub use self::errors::{StoreError, StoreResult};
pub use self::filter::{Filter, FindOptions};
pub use self::memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use self::sqlite::SqliteStore;
pub use self::traits::{Document, DocumentStore};
