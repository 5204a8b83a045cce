use std::collections::BTreeMap;

use log::debug;

use ragx_core::{FieldValue, Region};
use ragx_experiment::RaggedResult;

use crate::index::OverlapIndex;
use crate::matrix::{AssayMatrix, AssayPolicy};

///
/// One column per disjoint segment cut out by the interval endpoints of all samples.
///
/// On each chromosome every start and end of a positive-width record becomes a boundary.
/// Consecutive boundaries make a segment, and a segment is kept when at least one sample
/// has a record covering it. The cell of a sample is `field` of the first record in its
/// collection order that covers the segment. Zero-width records neither cut nor cover.
///
/// For hits `s1: [100,200)` and `s2: [150,250)` the columns are `[100,150)`, `[150,200)`
/// and `[200,250)`.
pub fn compact_assay(result: &RaggedResult, field: &str) -> AssayMatrix<FieldValue> {
    let indexes: Vec<OverlapIndex> = result
        .iter()
        .map(|(_, records)| OverlapIndex::build(records))
        .collect();

    let mut boundaries: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
    for (_, records) in result.iter() {
        for record in records.iter().filter(|r| r.width() > 0) {
            let points = boundaries.entry(record.chr.as_str()).or_default();
            points.push(record.start);
            points.push(record.end);
        }
    }

    let mut columns = Vec::new();
    let mut cells = Vec::new();
    for (chr, mut points) in boundaries {
        points.sort_unstable();
        points.dedup();

        for pair in points.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let covering: Vec<_> = indexes
                .iter()
                .map(|index| index.first_covering(chr, start, end))
                .collect();
            if covering.iter().all(Option::is_none) {
                continue;
            }

            let col = columns.len();
            columns.push(Region::new(chr, start, end));
            for (row, hit) in covering.into_iter().enumerate() {
                if let Some(record) = hit {
                    cells.push((row, col, record.get(field)));
                }
            }
        }
    }

    let rows = result.keys().into_iter().map(String::from).collect();
    let mut matrix = AssayMatrix::empty(rows, columns, AssayPolicy::Compact);
    for (row, col, value) in cells {
        matrix.set(row, col, value);
    }

    debug!(
        "compact assay of {}: {} x {}, {} cells present",
        result.region(),
        matrix.nrows(),
        matrix.ncols(),
        matrix.present_count()
    );
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use ragx_core::IntervalRecord;
    use rstest::*;

    fn labels(matrix: &AssayMatrix<FieldValue>) -> Vec<String> {
        matrix.columns().iter().map(Region::as_string).collect()
    }

    #[rstest]
    fn test_uncovered_gap_is_dropped() {
        let result = RaggedResult::from_samples(
            Region::new("chr1", 0, 1000),
            vec![(
                "s1".to_string(),
                vec![
                    IntervalRecord::new("chr1", 0, 10).with_field("v", 1i64),
                    IntervalRecord::new("chr1", 20, 30).with_field("v", 2i64),
                ],
            )],
        );

        let matrix = compact_assay(&result, "v");
        assert_eq!(labels(&matrix), vec!["chr1:0-10", "chr1:20-30"]);
        assert_eq!(matrix.get(0, 1), Some(&FieldValue::Int(2)));
    }

    #[rstest]
    fn test_nested_intervals_first_in_order_wins() {
        let result = RaggedResult::from_samples(
            Region::new("chr1", 0, 1000),
            vec![(
                "s1".to_string(),
                vec![
                    IntervalRecord::new("chr1", 0, 100).with_field("v", "outer"),
                    IntervalRecord::new("chr1", 40, 60).with_field("v", "inner"),
                ],
            )],
        );

        let matrix = compact_assay(&result, "v");
        assert_eq!(labels(&matrix), vec!["chr1:0-40", "chr1:40-60", "chr1:60-100"]);
        for col in 0..3 {
            assert_eq!(matrix.get(0, col), Some(&FieldValue::from("outer")));
        }
    }

    #[rstest]
    fn test_zero_width_contributes_nothing() {
        let result = RaggedResult::from_samples(
            Region::new("chr1", 0, 1000),
            vec![
                ("s1".to_string(), vec![IntervalRecord::new("chr1", 10, 20)]),
                ("s2".to_string(), vec![IntervalRecord::new("chr1", 15, 15)]),
            ],
        );

        let matrix = compact_assay(&result, "start");
        assert_eq!(labels(&matrix), vec!["chr1:10-20"]);
        assert_eq!(matrix.get(1, 0), None);
    }

    #[rstest]
    fn test_inverted_record_contributes_nothing() {
        let result = RaggedResult::from_samples(
            Region::new("chr1", 100, 400),
            vec![
                ("s1".to_string(), vec![IntervalRecord::new("chr1", 300, 200)]),
                ("s2".to_string(), vec![IntervalRecord::new("chr1", 150, 250)]),
            ],
        );

        let matrix = compact_assay(&result, "start");
        assert_eq!(labels(&matrix), vec!["chr1:150-250"]);
        assert_eq!(matrix.get(0, 0), None);
        assert_eq!(matrix.get(1, 0), Some(&FieldValue::Int(150)));
    }
}
