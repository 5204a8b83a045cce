use std::fmt::{self, Display};

use ndarray::{Array2, ArrayView1};
use sprs::{CsMat, TriMat};

use ragx_core::{FieldValue, Region};

/// How the columns of an [`AssayMatrix`] were derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssayPolicy {
    /// One column per distinct interval.
    Sparse,
    /// One column per covered disjoint segment.
    Compact,
    /// One column per caller supplied bin.
    Reduced,
}

impl Display for AssayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssayPolicy::Sparse => "sparse",
            AssayPolicy::Compact => "compact",
            AssayPolicy::Reduced => "reduced",
        };
        write!(f, "{}", name)
    }
}

///
/// A cell value that may have a numeric reading.
///
pub trait AssayValue {
    fn numeric(&self) -> Option<f64>;
}

impl AssayValue for FieldValue {
    fn numeric(&self) -> Option<f64> {
        self.as_f64()
    }
}

impl AssayValue for f64 {
    fn numeric(&self) -> Option<f64> {
        Some(*self)
    }
}

impl AssayValue for i64 {
    fn numeric(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl AssayValue for usize {
    fn numeric(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl AssayValue for String {
    fn numeric(&self) -> Option<f64> {
        None
    }
}

///
/// A samples x regions matrix derived from a ragged result.
///
/// Rows are sample keys in result order, columns are genomic regions. A cell is `None`
/// where the sample has no value for the region. Matrices are views for analysis and are
/// never written back to a store.
///
#[derive(Debug, Clone, PartialEq)]
pub struct AssayMatrix<T> {
    rows: Vec<String>,
    columns: Vec<Region>,
    values: Array2<Option<T>>,
    policy: AssayPolicy,
}

impl<T> AssayMatrix<T> {
    /// An all-absent matrix of the given labels.
    pub(crate) fn empty(rows: Vec<String>, columns: Vec<Region>, policy: AssayPolicy) -> Self {
        let values = Array2::from_shape_fn((rows.len(), columns.len()), |_| None);
        AssayMatrix {
            rows,
            columns,
            values,
            policy,
        }
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: Option<T>) {
        self.values[[row, col]] = value;
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[Region] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<Option<T>> {
        &self.values
    }

    pub fn policy(&self) -> AssayPolicy {
        self.policy
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    /// The value at `(row, col)`; `None` when absent or out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.values.get((row, col)).and_then(Option::as_ref)
    }

    pub fn row_index(&self, key: &str) -> Option<usize> {
        self.rows.iter().position(|k| k == key)
    }

    pub fn column_index(&self, region: &Region) -> Option<usize> {
        self.columns.iter().position(|c| c == region)
    }

    pub fn row(&self, key: &str) -> Option<ArrayView1<'_, Option<T>>> {
        self.row_index(key).map(|i| self.values.row(i))
    }

    /// Number of cells holding a value.
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    ///
    /// Transform every present cell. Cells for which `f` returns `None` become absent.
    ///
    pub fn map_values<U, F>(&self, f: F) -> AssayMatrix<U>
    where
        F: Fn(&T) -> Option<U>,
    {
        AssayMatrix {
            rows: self.rows.clone(),
            columns: self.columns.clone(),
            values: self.values.map(|v| v.as_ref().and_then(&f)),
            policy: self.policy,
        }
    }
}

impl<T: AssayValue> AssayMatrix<T> {
    ///
    /// Dense numeric view. Absent and non-numeric cells are `NaN`.
    ///
    pub fn to_f64(&self) -> Array2<f64> {
        self.values.map(|v| {
            v.as_ref()
                .and_then(AssayValue::numeric)
                .unwrap_or(f64::NAN)
        })
    }

    ///
    /// Compressed sparse row view holding the present numeric cells.
    ///
    pub fn to_csr(&self) -> CsMat<f64> {
        let mut triplets = TriMat::new(self.shape());
        for ((row, col), value) in self.values.indexed_iter() {
            if let Some(v) = value.as_ref().and_then(AssayValue::numeric) {
                triplets.add_triplet(row, col, v);
            }
        }
        triplets.to_csr()
    }
}
