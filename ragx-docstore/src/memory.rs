use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Instant;

use log::debug;

use crate::errors::{StoreError, StoreResult};
use crate::filter::{Filter, FindOptions};
use crate::traits::{Document, DocumentStore, check_collection_name};

/// How many documents are scanned between two deadline checks.
const DEADLINE_CHECK_EVERY: usize = 4096;

///
/// An in-process document store.
///
/// Collections are vectors of documents kept in insertion order, which is also the default
/// document order returned by [`DocumentStore::find`]. Readers share a lock, so concurrent
/// queries never block each other.
///
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Number of documents in a collection, 0 for an unknown one.
    ///
    pub fn count(&self, collection: &str) -> StoreResult<usize> {
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(collections.get(collection).map_or(0, |docs| docs.len()))
    }
}

impl DocumentStore for MemoryStore {
    fn insert_many(&self, collection: &str, documents: &[Document]) -> StoreResult<usize> {
        check_collection_name(collection)?;
        if documents.is_empty() {
            return Ok(0);
        }

        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents.iter().cloned());

        debug!("inserted {} documents into {}", documents.len(), collection);
        Ok(documents.len())
    }

    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        check_collection_name(collection)?;
        filter.validate()?;

        let deadline = options.timeout.map(|t| Instant::now() + t);
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;

        let docs = match collections.get(collection) {
            Some(docs) => docs,
            None => return Ok(Vec::new()),
        };

        let limit = options.limit.unwrap_or(usize::MAX);
        let mut skipped = 0;
        let mut found = Vec::new();

        for (scanned, doc) in docs.iter().enumerate() {
            if found.len() >= limit {
                break;
            }
            if let Some(deadline) = deadline {
                if scanned % DEADLINE_CHECK_EVERY == 0 && Instant::now() >= deadline {
                    return Err(StoreError::Timeout(collection.to_string()));
                }
            }
            if !filter.matches(doc) {
                continue;
            }
            if skipped < options.skip {
                skipped += 1;
                continue;
            }
            found.push(doc.clone());
        }

        Ok(found)
    }

    fn list_collections(&self) -> StoreResult<Vec<String>> {
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn ping(&self) -> StoreResult<()> {
        self.collections
            .read()
            .map(|_| ())
            .map_err(|_| StoreError::Poisoned)
    }

    fn describe(&self) -> String {
        String::from("memory")
    }
}
