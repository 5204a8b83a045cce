//! Fixed-shape assay matrices from ragged overlap results.
//!
//! A [`ragx_experiment::RaggedResult`] holds a different number of records per sample. The
//! builders here line those records up against a common set of genomic columns so that the
//! result can be handed to numeric tooling:
//!
//! - [`sparse_assay`]: a column for every distinct interval
//! - [`compact_assay`]: a column for every covered segment between interval endpoints
//! - [`reduced_assay`]: a column for every caller supplied bin, summarised by a [`reducers`] closure
//!
//! Every builder returns an [`AssayMatrix`] with samples as rows. Absent cells are `None`.
//!
//! ## Quick Start
//!
//! ```rust
//! use ragx_assay::compact_assay;
//! use ragx_core::{IntervalRecord, Region};
//! use ragx_experiment::RaggedResult;
//!
//! let result = RaggedResult::from_samples(
//!     Region::new("chr1", 1, 300),
//!     vec![
//!         ("s1".to_string(), vec![IntervalRecord::new("chr1", 100, 200)]),
//!         ("s2".to_string(), vec![IntervalRecord::new("chr1", 150, 250)]),
//!     ],
//! );
//!
//! let matrix = compact_assay(&result, "start");
//! assert_eq!(matrix.shape(), (2, 3));
//! ```
pub mod bins;
pub mod compact;
pub mod errors;
mod index;
pub mod io;
pub mod matrix;
pub mod reduced;
pub mod reducers;
pub mod sparse;

// re-exports
pub use self::bins::{split_region, tile_region};
pub use self::compact::compact_assay;
pub use self::errors::{AssayError, AssayResult};
pub use self::matrix::{AssayMatrix, AssayPolicy, AssayValue};
pub use self::reduced::reduced_assay;
pub use self::sparse::sparse_assay;
