use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use log::{debug, info};

use crate::errors::AssayResult;
use crate::matrix::{AssayMatrix, AssayValue};

/// Marker written for absent cells in text output.
pub const ABSENT_MARKER: &str = "NA";

/// Open `path` for writing, gzip compressed when it ends in `.gz`.
fn create_writer(path: &Path) -> AssayResult<Box<dyn Write>> {
    let file = File::create(path)?;
    let is_gzipped = path.extension().is_some_and(|ext| ext == "gz");
    if is_gzipped {
        Ok(Box::new(BufWriter::new(GzEncoder::new(
            file,
            Compression::default(),
        ))))
    } else {
        Ok(Box::new(BufWriter::new(file)))
    }
}

impl<T: Display> AssayMatrix<T> {
    ///
    /// Write the matrix as a tab separated table.
    ///
    /// The header is `sample` followed by one `chr:start-end` label per column; each following
    /// line is a sample key and its cells, with [`ABSENT_MARKER`] for absent cells.
    ///
    pub fn write_tsv<P: AsRef<Path>>(&self, path: P) -> AssayResult<()> {
        let path = path.as_ref();
        let mut writer = create_writer(path)?;

        write!(writer, "sample")?;
        for column in self.columns() {
            write!(writer, "\t{}", column)?;
        }
        writeln!(writer)?;

        for (i, key) in self.rows().iter().enumerate() {
            write!(writer, "{}", key)?;
            for cell in self.values().row(i) {
                match cell {
                    Some(value) => write!(writer, "\t{}", value)?,
                    None => write!(writer, "\t{}", ABSENT_MARKER)?,
                }
            }
            writeln!(writer)?;
        }
        writer.flush()?;

        info!(
            "wrote {} x {} {} assay to {}",
            self.nrows(),
            self.ncols(),
            self.policy(),
            path.display()
        );
        Ok(())
    }
}

impl<T: AssayValue> AssayMatrix<T> {
    ///
    /// Write the present numeric cells in Matrix Market coordinate format.
    ///
    /// Produces three gzip files:
    /// - `{prefix}_matrix.mtx.gz`: 1-based `(row, col, value)` triplets in row-major order
    /// - `{prefix}_rows.tsv.gz`: sample keys, one per line
    /// - `{prefix}_columns.tsv.gz`: region labels, one per line
    ///
    /// Cells without a numeric reading are left out.
    ///
    pub fn write_matrix_market(&self, prefix: &str) -> AssayResult<()> {
        let triplets: Vec<(usize, usize, f64)> = self
            .values()
            .indexed_iter()
            .filter_map(|((row, col), cell)| {
                cell.as_ref()
                    .and_then(AssayValue::numeric)
                    .map(|v| (row, col, v))
            })
            .collect();

        let skipped = self.present_count() - triplets.len();
        if skipped > 0 {
            debug!("{} present cells have no numeric value and were left out", skipped);
        }

        let mtx_path = format!("{}_matrix.mtx.gz", prefix);
        let mut mtx = create_writer(Path::new(&mtx_path))?;
        writeln!(mtx, "%%MatrixMarket matrix coordinate real general")?;
        writeln!(mtx, "{} {} {}", self.nrows(), self.ncols(), triplets.len())?;
        for (row, col, value) in &triplets {
            writeln!(mtx, "{} {} {}", row + 1, col + 1, value)?;
        }
        mtx.flush()?;

        let rows_path = format!("{}_rows.tsv.gz", prefix);
        let mut rows = create_writer(Path::new(&rows_path))?;
        for key in self.rows() {
            writeln!(rows, "{}", key)?;
        }
        rows.flush()?;

        let columns_path = format!("{}_columns.tsv.gz", prefix);
        let mut columns = create_writer(Path::new(&columns_path))?;
        for region in self.columns() {
            writeln!(columns, "{}", region)?;
        }
        columns.flush()?;

        info!(
            "wrote {} non-empty cells of a {} x {} assay to {}",
            triplets.len(),
            self.nrows(),
            self.ncols(),
            mtx_path
        );
        Ok(())
    }
}
