use std::io::BufRead;
use std::path::{Path, PathBuf};

use log::{debug, info};

use ragx_core::IntervalRecord;
use ragx_core::schema::{FieldSet, SchemaRegistry, normalize};
use ragx_core::utils::{get_dynamic_reader, is_column_header, is_header_line};
use ragx_docstore::{Document, DocumentStore};

use crate::consts::DEFAULT_BATCH_SIZE;
use crate::errors::{ImportError, ImportResult};

///
/// What an import wrote.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub path: PathBuf,
    pub collection: String,
    pub dialect: String,
    pub records_written: usize,
    /// Blank, comment, track/browser and column header lines.
    pub lines_skipped: usize,
}

///
/// Imports interval files, resolving dialects by name against a [`SchemaRegistry`].
///
/// # Examples
///
/// ```rust
/// use ragx_core::SchemaRegistry;
/// use ragx_docstore::MemoryStore;
/// use ragx_import::Importer;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("s1.bed");
/// std::fs::write(&path, "chr1\t100\t200\n")?;
///
/// let registry = SchemaRegistry::default();
/// let store = MemoryStore::new();
/// let report = Importer::new(&registry)
///     .with_batch_size(500)
///     .import_file(&path, "s1", "bed3", &store)?;
/// assert_eq!(report.records_written, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Importer<'a> {
    registry: &'a SchemaRegistry,
    batch_size: usize,
}

impl<'a> Importer<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Importer {
            registry,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Number of documents sent per `insert_many` call. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    ///
    /// Import `path` into collection `sample_key`, reading it as the dialect named `dialect`.
    ///
    pub fn import_file<S, P>(
        &self,
        path: P,
        sample_key: &str,
        dialect: &str,
        store: &S,
    ) -> ImportResult<ImportReport>
    where
        S: DocumentStore + ?Sized,
        P: AsRef<Path>,
    {
        let field_set = self
            .registry
            .dialect_for(dialect)
            .map_err(ImportError::UnknownDialect)?;
        import_file_batched(path.as_ref(), sample_key, field_set, store, self.batch_size)
    }
}

///
/// Read an interval file of the given dialect and write its rows into collection
/// `sample_key`, one document per row.
///
/// The import stops at the first row that fails to normalize. Batches written before that
/// row stay in the store, so a failed import can leave a partially filled collection.
/// Importing into an existing collection appends to it.
///
/// # Arguments
/// - path: plain or gzipped (`.gz`) tab separated interval file
/// - sample_key: the sample, which also names its collection
/// - dialect: field layout of the file
/// - store: where the documents go
pub fn import_file<S, P>(
    path: P,
    sample_key: &str,
    dialect: &FieldSet,
    store: &S,
) -> ImportResult<ImportReport>
where
    S: DocumentStore + ?Sized,
    P: AsRef<Path>,
{
    import_file_batched(
        path.as_ref(),
        sample_key,
        dialect,
        store,
        DEFAULT_BATCH_SIZE,
    )
}

fn import_file_batched<S: DocumentStore + ?Sized>(
    path: &Path,
    sample_key: &str,
    dialect: &FieldSet,
    store: &S,
    batch_size: usize,
) -> ImportResult<ImportReport> {
    if sample_key.trim().is_empty() {
        return Err(ImportError::InvalidSampleKey);
    }

    let io_error = |source: std::io::Error| ImportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = get_dynamic_reader(path).map_err(io_error)?;

    let flush = |batch: &mut Vec<Document>| -> ImportResult<usize> {
        let written = store
            .insert_many(sample_key, batch)
            .map_err(|source| ImportError::Store {
                path: path.to_path_buf(),
                collection: sample_key.to_string(),
                source,
            })?;
        debug!("flushed {} documents into {}", written, sample_key);
        batch.clear();
        Ok(written)
    };

    let mut batch: Vec<Document> = Vec::with_capacity(batch_size);
    let mut records_written = 0;
    let mut lines_skipped = 0;
    let mut seen_data = false;

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(io_error)?;

        if line.trim().is_empty() || is_header_line(&line) {
            lines_skipped += 1;
            continue;
        }
        // a bare `chrom start end` header may only be the first data-like line
        if !seen_data
            && is_column_header(
                &line,
                dialect.chrom_column,
                dialect.start_column,
                dialect.end_column,
            )
        {
            seen_data = true;
            lines_skipped += 1;
            continue;
        }
        seen_data = true;

        let record = normalize(&line, dialect).map_err(|source| ImportError::Schema {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        batch.push(record.to_document());

        if batch.len() >= batch_size {
            records_written += flush(&mut batch)?;
        }
    }

    if !batch.is_empty() {
        records_written += flush(&mut batch)?;
    }

    info!(
        "imported {} {} records from {} into {}",
        records_written,
        dialect.name,
        path.display(),
        sample_key
    );

    Ok(ImportReport {
        path: path.to_path_buf(),
        collection: sample_key.to_string(),
        dialect: dialect.name.clone(),
        records_written,
        lines_skipped,
    })
}

///
/// Write already normalized records into `collection` in a single batch.
///
pub fn import_records<S: DocumentStore + ?Sized>(
    records: &[IntervalRecord],
    collection: &str,
    store: &S,
) -> ImportResult<usize> {
    if collection.trim().is_empty() {
        return Err(ImportError::InvalidSampleKey);
    }

    let documents: Vec<Document> = records.iter().map(IntervalRecord::to_document).collect();
    store
        .insert_many(collection, &documents)
        .map_err(|source| ImportError::Write {
            collection: collection.to_string(),
            source,
        })
}
