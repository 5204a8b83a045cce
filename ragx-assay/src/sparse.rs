use std::collections::BTreeSet;

use fxhash::{FxHashMap, FxHashSet};
use log::debug;

use ragx_core::{FieldValue, IntervalRecord, Region};
use ragx_experiment::RaggedResult;

use crate::matrix::{AssayMatrix, AssayPolicy};

///
/// One column per distinct interval found in any sample.
///
/// Columns are sorted by chromosome, then start, then end. A cell holds `field` of the
/// sample's record with exactly the column's interval. When a sample repeats an interval the
/// first record in its collection order wins, even if it lacks `field`.
///
/// # Arguments
/// - result: per-sample overlap hits
/// - field: record field to place in the cells; coordinate names are accepted
pub fn sparse_assay(result: &RaggedResult, field: &str) -> AssayMatrix<FieldValue> {
    let columns: Vec<Region> = result
        .iter()
        .flat_map(|(_, records)| records.iter().map(IntervalRecord::region))
        .collect::<BTreeSet<Region>>()
        .into_iter()
        .collect();

    let cells = {
        let lookup: FxHashMap<(&str, u32, u32), usize> = columns
            .iter()
            .enumerate()
            .map(|(i, r)| ((r.chr.as_str(), r.start, r.end), i))
            .collect();

        let mut cells = Vec::new();
        for (row, (_, records)) in result.iter().enumerate() {
            let mut claimed = FxHashSet::default();
            for record in records {
                let Some(&col) = lookup.get(&(record.chr.as_str(), record.start, record.end))
                else {
                    continue;
                };
                if claimed.insert(col) {
                    cells.push((row, col, record.get(field)));
                }
            }
        }
        cells
    };

    let rows = result.keys().into_iter().map(String::from).collect();
    let mut matrix = AssayMatrix::empty(rows, columns, AssayPolicy::Sparse);
    for (row, col, value) in cells {
        matrix.set(row, col, value);
    }

    debug!(
        "sparse assay of {}: {} x {}, {} cells present",
        result.region(),
        matrix.nrows(),
        matrix.ncols(),
        matrix.present_count()
    );
    matrix
}
