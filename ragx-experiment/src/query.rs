//! Overlap queries against a single sample collection.
use std::time::Duration;

use log::debug;

use ragx_core::models::record::{CHROM_KEY, END_KEY, START_KEY};
use ragx_core::{IntervalRecord, Region};
use ragx_docstore::{DocumentStore, Filter, FindOptions};

use crate::errors::{QueryError, QueryResult};

///
/// The store filter selecting every interval overlapping `region`:
/// `chrom == region.chr && start < region.end && end > region.start`.
///
/// Intervals that only touch the region (`[2,5)` against `[5,8)`) are not selected.
///
pub fn overlap_filter(region: &Region) -> Filter {
    Filter::eq(CHROM_KEY, region.chr.as_str())
        .and(Filter::lt(START_KEY, region.end))
        .and(Filter::gt(END_KEY, region.start))
}

///
/// Check a region can be queried: non-empty chromosome and `start <= end`.
///
pub fn validate_region(region: &Region) -> QueryResult<()> {
    let malformed = |reason: &str| QueryError::MalformedRegion {
        region: format!("{}:{}-{}", region.chr, region.start, region.end),
        reason: reason.to_string(),
    };

    if region.chr.trim().is_empty() {
        return Err(malformed("empty chromosome"));
    }
    if region.start > region.end {
        return Err(malformed("start is greater than end"));
    }
    Ok(())
}

///
/// Find the records of `collection` overlapping `region`.
///
/// `skip` and `limit` go to the store unmodified, `limit == None` returns every match.
/// Records come back in the store's document order for the collection, which is stable
/// across repeated queries of an unmodified collection. An unknown collection or a region
/// outside the collection's span gives an empty vector.
///
/// # Arguments
/// - store: the shared store handle
/// - collection: the sample's collection
/// - region: 0-based half-open query window
/// - skip: matches to skip
/// - limit: maximum matches to return
pub fn query_region<S: DocumentStore + ?Sized>(
    store: &S,
    collection: &str,
    region: &Region,
    skip: usize,
    limit: Option<usize>,
) -> QueryResult<Vec<IntervalRecord>> {
    OverlapQuery::new(region.clone())
        .with_skip(skip)
        .with_limit(limit)
        .run(store, collection)
}

///
/// An overlap query with pagination, a time limit and extra field filters.
///
/// # Examples
///
/// ```rust
/// use ragx_core::{IntervalRecord, Region};
/// use ragx_docstore::{DocumentStore, Filter, MemoryStore};
/// use ragx_experiment::query::OverlapQuery;
///
/// let store = MemoryStore::new();
/// let docs = [
///     IntervalRecord::new("chr1", 150, 250).with_field("state", "A").to_document(),
///     IntervalRecord::new("chr1", 180, 190).with_field("state", "B").to_document(),
/// ];
/// store.insert_many("s2", &docs).unwrap();
///
/// let hits = OverlapQuery::new(Region::new("chr1", 100, 200))
///     .with_filter(Filter::eq("state", "B"))
///     .run(&store, "s2")
///     .unwrap();
/// assert_eq!(hits.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapQuery {
    region: Region,
    skip: usize,
    limit: Option<usize>,
    timeout: Option<Duration>,
    filters: Vec<Filter>,
}

impl OverlapQuery {
    pub fn new(region: Region) -> Self {
        OverlapQuery {
            region,
            skip: 0,
            limit: None,
            timeout: None,
            filters: Vec::new(),
        }
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// AND a simple field filter onto the overlap predicate.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// The full store filter: overlap plus every extra field filter.
    pub fn filter(&self) -> Filter {
        self.filters
            .iter()
            .cloned()
            .fold(overlap_filter(&self.region), Filter::and)
    }

    fn options(&self) -> FindOptions {
        FindOptions::new()
            .with_skip(self.skip)
            .with_limit(self.limit)
            .with_timeout(self.timeout)
    }

    pub fn run<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        collection: &str,
    ) -> QueryResult<Vec<IntervalRecord>> {
        validate_region(&self.region)?;
        self.run_with(store, collection, &self.options())
    }

    fn run_with<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        collection: &str,
        options: &FindOptions,
    ) -> QueryResult<Vec<IntervalRecord>> {
        let docs = store
            .find(collection, &self.filter(), options)
            .map_err(|source| {
                if source.is_timeout() {
                    QueryError::Timeout {
                        collection: collection.to_string(),
                        region: self.region.clone(),
                    }
                } else {
                    QueryError::Store {
                        collection: collection.to_string(),
                        source,
                    }
                }
            })?;

        debug!(
            "{} documents of {} overlap {}",
            docs.len(),
            collection,
            self.region
        );

        docs.iter()
            .map(|doc| {
                IntervalRecord::from_document(doc).map_err(|source| QueryError::MalformedDocument {
                    collection: collection.to_string(),
                    source,
                })
            })
            .collect()
    }

    ///
    /// Page through the matches `page_size` records at a time.
    ///
    /// The query's own skip and limit bound the whole walk, so pages never reach past
    /// `skip + limit` matches.
    pub fn pages<'a, S: DocumentStore + ?Sized>(
        &self,
        store: &'a S,
        collection: &'a str,
        page_size: usize,
    ) -> RegionPages<'a, S> {
        RegionPages {
            query: self.clone(),
            store,
            collection,
            page_size: page_size.max(1),
            fetched: 0,
            done: false,
        }
    }
}

///
/// Iterator over the pages of an [`OverlapQuery`], each page one `find` call.
///
/// Stops after the first short or empty page, and after the first error.
pub struct RegionPages<'a, S: DocumentStore + ?Sized> {
    query: OverlapQuery,
    store: &'a S,
    collection: &'a str,
    page_size: usize,
    fetched: usize,
    done: bool,
}

impl<S: DocumentStore + ?Sized> Iterator for RegionPages<'_, S> {
    type Item = QueryResult<Vec<IntervalRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Err(e) = validate_region(&self.query.region) {
            self.done = true;
            return Some(Err(e));
        }

        let remaining = match self.query.limit {
            Some(limit) => limit.saturating_sub(self.fetched),
            None => usize::MAX,
        };
        let page_limit = self.page_size.min(remaining);
        if page_limit == 0 {
            self.done = true;
            return None;
        }

        let options = FindOptions::new()
            .with_skip(self.query.skip + self.fetched)
            .with_limit(Some(page_limit))
            .with_timeout(self.query.timeout);

        match self.query.run_with(self.store, self.collection, &options) {
            Ok(page) if page.is_empty() => {
                self.done = true;
                None
            }
            Ok(page) => {
                self.fetched += page.len();
                if page.len() < page_limit {
                    self.done = true;
                }
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
