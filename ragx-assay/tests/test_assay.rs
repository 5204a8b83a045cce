use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use pretty_assertions::assert_eq;
use rstest::*;

use ragx_assay::{
    AssayPolicy, compact_assay, reduced_assay, reducers, sparse_assay, split_region, tile_region,
};
use ragx_core::{FieldValue, Region};
use ragx_docstore::MemoryStore;
use ragx_experiment::{ExperimentConfig, RaggedExperiment, RaggedResult, SampleTable};

#[fixture]
fn path_to_data() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../tests/data")
}

#[fixture]
fn experiment(path_to_data: PathBuf) -> RaggedExperiment<MemoryStore> {
    let mut experiment = RaggedExperiment::new(
        MemoryStore::new(),
        SampleTable::new(),
        &ExperimentConfig::in_memory(),
    )
    .unwrap();
    for (file, key, dialect) in [
        ("s1.broadPeak", "s1", "broadPeak"),
        ("s2.chromhmm.bed", "s2", "chromHMM"),
    ] {
        experiment
            .import_sample(path_to_data.join(file), key, dialect, Vec::<(String, String)>::new())
            .unwrap();
    }
    experiment
}

fn labels(columns: &[Region]) -> Vec<String> {
    columns.iter().map(Region::as_string).collect()
}

fn read_gz(path: &Path) -> String {
    let mut text = String::new();
    GzDecoder::new(std::fs::File::open(path).unwrap())
        .read_to_string(&mut text)
        .unwrap();
    text
}

#[rstest]
fn test_concrete_scenario_compact(experiment: RaggedExperiment<MemoryStore>) {
    let result = experiment
        .overlaps(&["s1", "s2"], &"chr1:1-300".parse().unwrap(), 0, None)
        .unwrap();

    let matrix = compact_assay(&result, "start");
    assert_eq!(matrix.policy(), AssayPolicy::Compact);
    assert_eq!(matrix.rows(), &["s1".to_string(), "s2".to_string()]);
    assert_eq!(
        labels(matrix.columns()),
        vec!["chr1:100-150", "chr1:150-200", "chr1:200-250"]
    );

    assert_eq!(matrix.get(0, 0), Some(&FieldValue::Int(100)));
    assert_eq!(matrix.get(0, 1), Some(&FieldValue::Int(100)));
    assert_eq!(matrix.get(0, 2), None);
    assert_eq!(matrix.get(1, 0), None);
    assert_eq!(matrix.get(1, 1), Some(&FieldValue::Int(150)));
    assert_eq!(matrix.get(1, 2), Some(&FieldValue::Int(150)));
}

#[rstest]
fn test_sparse_shape(experiment: RaggedExperiment<MemoryStore>) {
    let result = experiment.overlaps_all(&Region::new("chr1", 0, 1000), 0, None).unwrap();

    let matrix = sparse_assay(&result, "state");
    assert_eq!(matrix.shape(), (2, 4));
    assert_eq!(
        labels(matrix.columns()),
        vec!["chr1:100-200", "chr1:150-250", "chr1:500-600", "chr1:700-800"]
    );
    // one cell per record, and s1 has no `state` field
    assert_eq!(matrix.present_count(), 2);
    assert_eq!(matrix.get(1, 3), Some(&FieldValue::from("B")));
}

#[rstest]
fn test_reduced_over_tiles(experiment: RaggedExperiment<MemoryStore>) {
    let region = Region::new("chr1", 0, 1000);
    let result = experiment.overlaps_all(&region, 0, None).unwrap();

    let bins = tile_region(&region, 250).unwrap();
    let counts = reduced_assay(&result, &bins, reducers::count());
    assert_eq!(counts.shape(), (2, 4));
    assert_eq!(counts.get(0, 0), Some(&1));
    assert_eq!(counts.get(1, 0), Some(&1));
    assert_eq!(counts.get(1, 1), None);
    assert_eq!(counts.get(0, 2), Some(&1));

    let signal = reduced_assay(&result, &bins, reducers::max("signal_value"));
    assert_eq!(signal.get(0, 0), Some(&7.5));
    assert_eq!(signal.get(1, 0), None);
}

#[rstest]
fn test_empty_result_is_well_formed() {
    let region = Region::new("chr1", 0, 100);
    let result = RaggedResult::from_samples(
        region.clone(),
        vec![("s1".to_string(), vec![]), ("s2".to_string(), vec![])],
    );

    let bins = split_region(&region, 4).unwrap();
    let reduced = reduced_assay(&result, &bins, reducers::first("score"));
    assert_eq!(reduced.shape(), (2, 4));
    assert_eq!(reduced.present_count(), 0);

    assert_eq!(sparse_assay(&result, "score").shape(), (2, 0));
    assert_eq!(compact_assay(&result, "score").shape(), (2, 0));
}

#[rstest]
fn test_write_tsv(experiment: RaggedExperiment<MemoryStore>) {
    let result = experiment
        .overlaps(&["s1", "s2"], &"chr1:1-300".parse().unwrap(), 0, None)
        .unwrap();
    let matrix = compact_assay(&result, "start");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assay.tsv");
    matrix.write_tsv(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "sample\tchr1:100-150\tchr1:150-200\tchr1:200-250",
            "s1\t100\t100\tNA",
            "s2\tNA\t150\t150",
        ]
    );
}

#[rstest]
fn test_write_matrix_market(experiment: RaggedExperiment<MemoryStore>) {
    let result = experiment
        .overlaps(&["s1", "s2"], &"chr1:1-300".parse().unwrap(), 0, None)
        .unwrap();
    let matrix = compact_assay(&result, "start");

    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("assay");
    let prefix = prefix.to_str().unwrap();
    matrix.write_matrix_market(prefix).unwrap();

    let mtx = read_gz(Path::new(&format!("{}_matrix.mtx.gz", prefix)));
    let lines: Vec<&str> = mtx.lines().collect();
    assert_eq!(
        lines,
        vec![
            "%%MatrixMarket matrix coordinate real general",
            "2 3 4",
            "1 1 100",
            "1 2 100",
            "2 2 150",
            "2 3 150",
        ]
    );

    let rows = read_gz(Path::new(&format!("{}_rows.tsv.gz", prefix)));
    assert_eq!(rows, "s1\ns2\n");
    let columns = read_gz(Path::new(&format!("{}_columns.tsv.gz", prefix)));
    assert_eq!(columns, "chr1:100-150\nchr1:150-200\nchr1:200-250\n");
}
