//! Ragged multi-sample experiments over a document store.
//!
//! A [`RaggedExperiment`] binds a table of sample metadata to the per-sample collections of
//! one shared [`ragx_docstore::DocumentStore`]. Queries never load a whole file: a region is
//! turned into a store filter ([`query::overlap_filter`]) and each sample's collection
//! answers with the records overlapping it. Asking many samples at once fans the queries
//! out on a worker pool and gathers a [`RaggedResult`], one possibly empty list of records
//! per sample.
//!
//! ## Quick Start
//!
//! ```rust
//! use ragx_core::{IntervalRecord, Region};
//! use ragx_docstore::{DocumentStore, MemoryStore};
//! use ragx_experiment::{ExperimentConfig, RaggedExperiment, SampleTable};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! store.insert_many("s1", &[IntervalRecord::new("chr1", 100, 200).to_document()])?;
//! store.insert_many("s2", &[IntervalRecord::new("chr1", 150, 250).to_document()])?;
//!
//! let samples = SampleTable::from_collections(store.list_collections()?)?;
//! let experiment = RaggedExperiment::new(store, samples, &ExperimentConfig::in_memory())?;
//!
//! let result = experiment.overlaps(&["s1", "s2"], &"chr1:180-190".parse::<Region>()?, 0, None)?;
//! assert_eq!(result.total_records(), 2);
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod consts;
pub mod container;
pub mod errors;
pub mod query;
pub mod ragged;

// re-exports
pub use self::config::{ExperimentConfig, StoreBackend};
pub use self::container::{RaggedExperiment, Sample, SampleTable};
pub use self::errors::{
    ConfigError, ConnectionError, ContainerError, PartialQueryError, QueryError,
    RaggedQueryError,
};
pub use self::query::{OverlapQuery, RegionPages, overlap_filter, query_region};
pub use self::ragged::{RaggedResult, overlaps_across_samples};
