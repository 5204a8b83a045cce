//! One region, many samples: the ragged overlap query.
use std::collections::HashSet;

use log::{debug, warn};
use rayon::prelude::*;

use ragx_core::{IntervalRecord, Region};
use ragx_docstore::DocumentStore;

use crate::container::RaggedExperiment;
use crate::errors::{ContainerError, PartialQueryError, QueryResult, RaggedQueryError};
use crate::query::{OverlapQuery, validate_region};

///
/// Per-sample overlap hits of one region, in the order the samples were requested.
///
/// Every requested sample has an entry, possibly empty. Records inside an entry keep the
/// store's document order of that sample's collection.
///
#[derive(Debug, Clone, PartialEq)]
pub struct RaggedResult {
    region: Region,
    samples: Vec<(String, Vec<IntervalRecord>)>,
}

impl RaggedResult {
    pub fn new(region: Region) -> Self {
        RaggedResult {
            region,
            samples: Vec::new(),
        }
    }

    pub fn from_samples(region: Region, samples: Vec<(String, Vec<IntervalRecord>)>) -> Self {
        RaggedResult { region, samples }
    }

    pub fn push(&mut self, key: impl Into<String>, records: Vec<IntervalRecord>) {
        self.samples.push((key.into(), records));
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn get(&self, key: &str) -> Option<&[IntervalRecord]> {
        self.samples
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, records)| records.as_slice())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.samples.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[IntervalRecord])> {
        self.samples
            .iter()
            .map(|(k, records)| (k.as_str(), records.as_slice()))
    }

    /// Number of samples, including those without hits.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Hits per sample.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.samples
            .iter()
            .map(|(k, records)| (k.as_str(), records.len()))
            .collect()
    }

    pub fn total_records(&self) -> usize {
        self.samples.iter().map(|(_, records)| records.len()).sum()
    }

    pub fn into_inner(self) -> Vec<(String, Vec<IntervalRecord>)> {
        self.samples
    }
}

///
/// Query `region` in the collection of every sample in `keys`, in parallel.
///
/// Keys are resolved before anything is sent to the store, an unknown or repeated key fails
/// the whole call. Each sample is queried at most once with the configured time limit and no retries.
/// When some samples fail the error carries the samples that did succeed together with
/// every failing key and its cause.
///
/// # Arguments
/// - experiment: the samples and their shared store
/// - keys: samples to query; the result keeps this order
/// - region: 0-based half-open query window
/// - skip: matches to skip in each sample
/// - limit: maximum matches per sample, `None` for all
pub fn overlaps_across_samples<S, K>(
    experiment: &RaggedExperiment<S>,
    keys: &[K],
    region: &Region,
    skip: usize,
    limit: Option<usize>,
) -> Result<RaggedResult, RaggedQueryError>
where
    S: DocumentStore,
    K: AsRef<str>,
{
    validate_region(region)?;

    let mut seen = HashSet::new();
    let targets = keys
        .iter()
        .map(|key| -> Result<(String, String), RaggedQueryError> {
            let key = key.as_ref();
            if !seen.insert(key) {
                return Err(ContainerError::DuplicateSample(key.to_string()).into());
            }
            let collection = experiment.collection_name_for(key)?;
            Ok((key.to_string(), collection.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let query = OverlapQuery::new(region.clone())
        .with_skip(skip)
        .with_limit(limit)
        .with_timeout(experiment.config().timeout());

    let outcomes: Vec<(String, QueryResult<Vec<IntervalRecord>>)> = experiment.pool().install(|| {
        targets
            .par_iter()
            .map(|(key, collection)| {
                let outcome = query.run(experiment.store(), collection);
                (key.clone(), outcome)
            })
            .collect()
    });

    let mut succeeded = RaggedResult::new(region.clone());
    let mut failures = Vec::new();
    for (key, outcome) in outcomes {
        match outcome {
            Ok(records) => succeeded.push(key, records),
            Err(e) => {
                warn!("query of {} in sample {} failed: {}", region, key, e);
                failures.push((key, e));
            }
        }
    }

    debug!(
        "{} records over {} samples overlap {}",
        succeeded.total_records(),
        succeeded.len(),
        region
    );

    if failures.is_empty() {
        Ok(succeeded)
    } else {
        Err(PartialQueryError {
            succeeded,
            failures,
        }
        .into())
    }
}

impl<S: DocumentStore> RaggedExperiment<S> {
    /// See [`overlaps_across_samples`].
    pub fn overlaps<K: AsRef<str>>(
        &self,
        keys: &[K],
        region: &Region,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<RaggedResult, RaggedQueryError> {
        overlaps_across_samples(self, keys, region, skip, limit)
    }

    /// Query `region` in every sample of the table.
    pub fn overlaps_all(
        &self,
        region: &Region,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<RaggedResult, RaggedQueryError> {
        let keys = self.samples().keys();
        overlaps_across_samples(self, keys.as_slice(), region, skip, limit)
    }
}
