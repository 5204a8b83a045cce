use std::sync::Arc;

use serde_json::{Map, Value};

use crate::errors::{StoreError, StoreResult};
use crate::filter::{Filter, FindOptions};

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

///
/// A handle on a document store holding named, independently queryable collections.
///
/// Implementations must be safe to share between worker threads. A store whose native
/// connection is not thread safe pools connections instead of sharing one.
///
pub trait DocumentStore: Send + Sync {
    ///
    /// Append documents to a collection, creating it on first write.
    ///
    /// Returns the number of documents written.
    fn insert_many(&self, collection: &str, documents: &[Document]) -> StoreResult<usize>;

    ///
    /// Find the documents of a collection matching `filter`.
    ///
    /// `options.skip` and `options.limit` are applied after filtering, over the store's default
    /// document order for the collection. An unknown collection yields no documents.
    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>>;

    /// Names of all collections holding at least one document, sorted.
    fn list_collections(&self) -> StoreResult<Vec<String>>;

    /// Check the store is reachable.
    fn ping(&self) -> StoreResult<()>;

    /// Short human readable location of the store, used in logs and errors.
    fn describe(&self) -> String;
}

pub(crate) fn check_collection_name(collection: &str) -> StoreResult<()> {
    if collection.trim().is_empty() {
        return Err(StoreError::InvalidCollection(collection.to_string()));
    }
    Ok(())
}

impl<T: DocumentStore + ?Sized> DocumentStore for Box<T> {
    fn insert_many(&self, collection: &str, documents: &[Document]) -> StoreResult<usize> {
        (**self).insert_many(collection, documents)
    }

    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        (**self).find(collection, filter, options)
    }

    fn list_collections(&self) -> StoreResult<Vec<String>> {
        (**self).list_collections()
    }

    fn ping(&self) -> StoreResult<()> {
        (**self).ping()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    fn insert_many(&self, collection: &str, documents: &[Document]) -> StoreResult<usize> {
        (**self).insert_many(collection, documents)
    }

    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        (**self).find(collection, filter, options)
    }

    fn list_collections(&self) -> StoreResult<Vec<String>> {
        (**self).list_collections()
    }

    fn ping(&self) -> StoreResult<()> {
        (**self).ping()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
