use log::debug;

use ragx_core::{IntervalRecord, Region};
use ragx_experiment::RaggedResult;

use crate::index::OverlapIndex;
use crate::matrix::{AssayMatrix, AssayPolicy};

///
/// One column per caller supplied bin, each cell a summary of the overlapping records.
///
/// For every sample and bin the records overlapping the bin are collected in collection
/// order and handed to `reducer`. The cell is absent when no record overlaps the bin or the
/// reducer returns `None`. Columns keep the order of `bins`.
///
/// # Arguments
/// - result: per-sample overlap hits
/// - bins: column regions, see [`crate::tile_region`] and [`crate::split_region`]
/// - reducer: summary of one sample's hits in one bin, see [`crate::reducers`]
///
/// # Example
/// ```rust
/// use ragx_assay::{reduced_assay, reducers, tile_region};
/// use ragx_core::{IntervalRecord, Region};
/// use ragx_experiment::RaggedResult;
///
/// let region = Region::new("chr1", 0, 200);
/// let result = RaggedResult::from_samples(
///     region.clone(),
///     vec![("s1".to_string(), vec![IntervalRecord::new("chr1", 50, 150)])],
/// );
/// let bins = tile_region(&region, 100).unwrap();
/// let matrix = reduced_assay(&result, &bins, reducers::count());
/// assert_eq!(matrix.get(0, 1), Some(&1));
/// ```
pub fn reduced_assay<T, F>(result: &RaggedResult, bins: &[Region], reducer: F) -> AssayMatrix<T>
where
    F: Fn(&[&IntervalRecord]) -> Option<T>,
{
    let rows = result.keys().into_iter().map(String::from).collect();
    let mut matrix = AssayMatrix::empty(rows, bins.to_vec(), AssayPolicy::Reduced);

    for (row, (_, records)) in result.iter().enumerate() {
        let index = OverlapIndex::build(records);
        for (col, bin) in bins.iter().enumerate() {
            let hits = index.find(&bin.chr, bin.start, bin.end);
            if hits.is_empty() {
                continue;
            }
            matrix.set(row, col, reducer(hits.as_slice()));
        }
    }

    debug!(
        "reduced assay of {} over {} bins: {} cells present",
        result.region(),
        bins.len(),
        matrix.present_count()
    );
    matrix
}
