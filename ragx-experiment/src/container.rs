//! Sample metadata bound to collections of one shared document store.
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::BufRead;
use std::path::Path;

use log::info;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use ragx_core::SchemaRegistry;
use ragx_core::utils::get_dynamic_reader;
use ragx_docstore::{DocumentStore, MemoryStore, SqliteStore};
use ragx_import::{ImportReport, Importer};

use crate::config::{ExperimentConfig, StoreBackend};
use crate::consts::{COLLECTION_COLUMN, FORMAT_ATTRIBUTE};
use crate::errors::{ConnectionError, ContainerError};

///
/// One sample: a key, the collection holding its intervals, and descriptive attributes
/// (`format`, `tissue`, `assay` ...).
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub key: String,
    pub collection: String,
    pub attributes: BTreeMap<String, String>,
}

impl Sample {
    /// A sample whose collection is named after its key.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Sample {
            collection: key.clone(),
            key,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

///
/// Ordered sample metadata, one row per sample, keys unique.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTable {
    samples: Vec<Sample>,
    index: HashMap<String, usize>,
}

impl SampleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Result<Self, ContainerError> {
        let mut table = SampleTable::new();
        for sample in samples {
            table.push(sample)?;
        }
        Ok(table)
    }

    ///
    /// A bare table with one sample per collection name, as listed by a store.
    ///
    pub fn from_collections<I, T>(names: I) -> Result<Self, ContainerError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        SampleTable::from_samples(names.into_iter().map(Sample::new))
    }

    ///
    /// Read a tab separated sample table.
    ///
    /// The first line is a header. Its first column holds the sample key, a `collection`
    /// column overrides the collection name, every other column becomes an attribute.
    /// Empty cells are left out. Blank and `#` lines are skipped.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        let io_error = |source: std::io::Error| ContainerError::Io {
            path: path.to_path_buf(),
            source,
        };
        let invalid = |line: usize, reason: String| ContainerError::InvalidTable {
            path: path.to_path_buf(),
            line,
            reason,
        };

        let reader = get_dynamic_reader(path).map_err(io_error)?;
        let mut columns: Vec<String> = Vec::new();
        let mut table = SampleTable::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(io_error)?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let cells: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();

            if columns.is_empty() {
                columns = cells.iter().map(|c| c.trim().to_string()).collect();
                continue;
            }

            if cells.len() > columns.len() {
                return Err(invalid(
                    index + 1,
                    format!("{} cells for {} header columns", cells.len(), columns.len()),
                ));
            }
            let key = cells[0].trim();
            if key.is_empty() {
                return Err(invalid(index + 1, "empty sample key".to_string()));
            }

            let mut sample = Sample::new(key);
            for (name, value) in columns.iter().zip(cells.iter()).skip(1) {
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                if name == COLLECTION_COLUMN {
                    sample.collection = value.to_string();
                } else {
                    sample.attributes.insert(name.clone(), value.to_string());
                }
            }
            table.push(sample)?;
        }

        Ok(table)
    }

    pub fn push(&mut self, sample: Sample) -> Result<(), ContainerError> {
        if self.index.contains_key(&sample.key) {
            return Err(ContainerError::DuplicateSample(sample.key));
        }
        self.index.insert(sample.key.clone(), self.samples.len());
        self.samples.push(sample);
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        key: &str,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ContainerError> {
        let position = self.position(key)?;
        self.samples[position]
            .attributes
            .insert(name.into(), value.into());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Sample> {
        self.index.get(key).map(|&i| &self.samples[i])
    }

    pub fn position(&self, key: &str) -> Result<usize, ContainerError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| ContainerError::UnknownSample(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.key.as_str()).collect()
    }

    /// Every attribute name used by at least one sample, sorted.
    pub fn columns(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self
            .samples
            .iter()
            .flat_map(|s| s.attributes.keys().map(String::as_str))
            .collect();
        names.into_iter().collect()
    }
}

///
/// A ragged experiment: sample metadata plus one store handle shared by every query.
///
/// The store is validated once, when the experiment is built, and never reopened per query.
/// Multi-sample queries fan out on the experiment's own worker pool.
///
/// # Examples
///
/// ```rust
/// use ragx_docstore::MemoryStore;
/// use ragx_experiment::{ExperimentConfig, RaggedExperiment, Sample, SampleTable};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let samples = SampleTable::from_samples([
///     Sample::new("s1").with_attribute("tissue", "liver"),
///     Sample::new("s2").with_attribute("tissue", "brain"),
/// ])?;
/// let experiment = RaggedExperiment::new(MemoryStore::new(), samples, &ExperimentConfig::in_memory())?;
///
/// assert_eq!(experiment.samples_with("tissue", "liver"), vec!["s1"]);
/// # Ok(())
/// # }
/// ```
pub struct RaggedExperiment<S: DocumentStore> {
    store: S,
    samples: SampleTable,
    registry: SchemaRegistry,
    pool: ThreadPool,
    config: ExperimentConfig,
}

impl RaggedExperiment<Box<dyn DocumentStore>> {
    ///
    /// Create the store the configuration names, then the experiment over it.
    ///
    pub fn open(config: &ExperimentConfig, samples: SampleTable) -> Result<Self, ConnectionError> {
        let store: Box<dyn DocumentStore> = match config.store.backend {
            StoreBackend::Memory => Box::new(MemoryStore::new()),
            StoreBackend::Sqlite => {
                let path = config.store_path();
                let store = SqliteStore::open(&path, config.store.pool_size).map_err(|source| {
                    ConnectionError::Unreachable {
                        target: path.display().to_string(),
                        source,
                    }
                })?;
                Box::new(store)
            }
        };
        RaggedExperiment::new(store, samples, config)
    }
}

impl<S: DocumentStore> RaggedExperiment<S> {
    ///
    /// Bind `samples` to `store`. The store is pinged here, the only place a connection
    /// is validated.
    ///
    pub fn new(
        store: S,
        samples: SampleTable,
        config: &ExperimentConfig,
    ) -> Result<Self, ConnectionError> {
        store.ping().map_err(|source| ConnectionError::Unreachable {
            target: store.describe(),
            source,
        })?;

        let workers = config.workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("ragx-query-{}", i))
            .build()
            .map_err(|e| ConnectionError::ThreadPool {
                workers,
                reason: e.to_string(),
            })?;

        info!(
            "ragged experiment over {} samples on {} with {} workers",
            samples.len(),
            store.describe(),
            workers
        );

        Ok(RaggedExperiment {
            store,
            samples,
            registry: SchemaRegistry::default(),
            pool,
            config: config.clone(),
        })
    }

    /// Use `registry` to resolve dialects in [`RaggedExperiment::import_sample`].
    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn samples(&self) -> &SampleTable {
        &self.samples
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub(crate) fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    /// Keys of the samples matching `predicate`, in table order.
    pub fn samples_where<F>(&self, predicate: F) -> Vec<String>
    where
        F: Fn(&Sample) -> bool,
    {
        self.samples
            .iter()
            .filter(|s| predicate(s))
            .map(|s| s.key.clone())
            .collect()
    }

    /// Keys of the samples whose attribute `column` equals `value`.
    pub fn samples_with(&self, column: &str, value: &str) -> Vec<String> {
        self.samples_where(|s| s.attribute(column) == Some(value))
    }

    pub fn collection_name_for(&self, key: &str) -> Result<&str, ContainerError> {
        self.samples
            .get(key)
            .map(|s| s.collection.as_str())
            .ok_or_else(|| ContainerError::UnknownSample(key.to_string()))
    }

    ///
    /// The metadata rows of `keys`, in the order given.
    ///
    pub fn metadata_subset<K: AsRef<str>>(&self, keys: &[K]) -> Result<SampleTable, ContainerError> {
        let mut subset = SampleTable::new();
        for key in keys {
            let key = key.as_ref();
            let sample = self
                .samples
                .get(key)
                .ok_or_else(|| ContainerError::UnknownSample(key.to_string()))?;
            subset.push(sample.clone())?;
        }
        Ok(subset)
    }

    /// Resolve positional sample indices into keys.
    pub fn keys_at(&self, indices: &[usize]) -> Result<Vec<String>, ContainerError> {
        let keys = self.samples.keys();
        indices
            .iter()
            .map(|&index| {
                keys.get(index)
                    .map(|k| k.to_string())
                    .ok_or(ContainerError::IndexOutOfRange {
                        index,
                        len: keys.len(),
                    })
            })
            .collect()
    }

    ///
    /// Import an interval file as sample `key` and record it in the metadata table.
    ///
    /// A new key gets a row with `attributes` plus `format` set to the dialect. For a
    /// known key the records are appended to its collection and the attributes updated.
    ///
    pub fn import_sample<P, I>(
        &mut self,
        path: P,
        key: &str,
        dialect: &str,
        attributes: I,
    ) -> Result<ImportReport, ContainerError>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = (String, String)>,
    {
        let collection = self
            .samples
            .get(key)
            .map(|s| s.collection.clone())
            .unwrap_or_else(|| key.to_string());

        let report = Importer::new(&self.registry)
            .with_batch_size(self.config.import.batch_size)
            .import_file(path, &collection, dialect, &self.store)?;

        if self.samples.get(key).is_none() {
            self.samples
                .push(Sample::new(key).with_collection(collection.as_str()))?;
        }
        self.samples
            .set_attribute(key, FORMAT_ATTRIBUTE, report.dialect.as_str())?;
        for (name, value) in attributes {
            self.samples.set_attribute(key, name, value)?;
        }

        Ok(report)
    }

    /// Samples whose collection the store doesn't hold, in table order.
    pub fn missing_collections(&self) -> Result<Vec<String>, ContainerError> {
        let present: BTreeSet<String> = self.store.list_collections()?.into_iter().collect();
        Ok(self.samples_where(|s| !present.contains(&s.collection)))
    }
}
