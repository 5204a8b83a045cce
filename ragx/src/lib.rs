//! # ragx
//!
//! Ragged multi-sample genomic interval experiments backed by a document store.
//!
//! Interval files of several dialects (BED, narrowPeak, broadPeak, chromHMM, GFF, ...) are
//! imported into one collection per sample. A [`experiment::RaggedExperiment`] ties those
//! collections to a table of sample metadata and answers region queries across samples in
//! parallel. The ragged per-sample hits can then be squared into an
//! [`assay::AssayMatrix`].
//!
//! Each piece lives in its own crate and is re-exported here behind a cargo feature of the
//! same name.
//!
//! ```rust
//! # #[cfg(feature = "assay")]
//! # fn main() -> anyhow::Result<()> {
//! use ragx::assay::compact_assay;
//! use ragx::core::{IntervalRecord, Region};
//! use ragx::docstore::{DocumentStore, MemoryStore};
//! use ragx::experiment::{ExperimentConfig, RaggedExperiment, SampleTable};
//!
//! let store = MemoryStore::new();
//! store.insert_many("s1", &[IntervalRecord::new("chr1", 100, 200).to_document()])?;
//! store.insert_many("s2", &[IntervalRecord::new("chr1", 150, 250).to_document()])?;
//!
//! let samples = SampleTable::from_collections(["s1", "s2"])?;
//! let experiment = RaggedExperiment::new(store, samples, &ExperimentConfig::in_memory())?;
//!
//! let result = experiment.overlaps_all(&"chr1:1-300".parse::<Region>()?, 0, None)?;
//! let matrix = compact_assay(&result, "start");
//! assert_eq!(matrix.ncols(), 3);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "assay"))]
//! # fn main() {}
//! ```

#[cfg(feature = "core")]
#[doc(inline)]
pub use ragx_core as core;

#[cfg(feature = "docstore")]
#[doc(inline)]
pub use ragx_docstore as docstore;

#[cfg(feature = "import")]
#[doc(inline)]
pub use ragx_import as import;

#[cfg(feature = "experiment")]
#[doc(inline)]
pub use ragx_experiment as experiment;

#[cfg(feature = "assay")]
#[doc(inline)]
pub use ragx_assay as assay;
