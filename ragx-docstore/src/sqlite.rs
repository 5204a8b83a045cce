use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};
use rusqlite::types::Value as SqlValue;
use rusqlite::{ErrorCode, params, params_from_iter};
use serde_json::Value;

use crate::errors::{StoreError, StoreResult};
use crate::filter::{Filter, FindOptions};
use crate::pool::ConnectionPool;
use crate::traits::{Document, DocumentStore, check_collection_name};

/// SQLite VM instructions between two deadline checks of a timed query.
const PROGRESS_CHECK_OPS: i32 = 1000;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    body TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS documents_region ON documents (
    collection,
    json_extract(body, '$.chrom'),
    json_extract(body, '$.start')
);
";

///
/// A document store kept in a single SQLite file.
///
/// Every document is a JSON text row tagged with its collection name. Rows come back in
/// insertion order. An expression index over `(collection, chrom, start)` keeps overlap
/// queries off full scans.
///
/// # Examples
///
/// ```rust,no_run
/// use ragx_docstore::{DocumentStore, SqliteStore};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStore::open("/tmp/ragx/store.sqlite", 4)?;
/// println!("collections: {:?}", store.list_collections()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SqliteStore {
    path: PathBuf,
    pool: ConnectionPool,
}

impl SqliteStore {
    ///
    /// Open (or create) the store at `path`.
    ///
    /// # Arguments
    /// - path: database file; parent folders are created
    /// - pool_size: how many idle connections are kept for reuse
    pub fn open<P: AsRef<Path>>(path: P, pool_size: usize) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Connection {
                target: path.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let pool = ConnectionPool::new(&path, pool_size);
        pool.get()?.execute_batch(SCHEMA)?;

        info!("opened sqlite document store at {}", path.display());
        Ok(SqliteStore { path, pool })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    fn run_find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let (clause, mut values) = to_sql(filter)?;
        let sql = format!(
            "SELECT body FROM documents WHERE collection = ? AND {} ORDER BY id LIMIT ? OFFSET ?",
            clause
        );

        let mut params: Vec<SqlValue> = Vec::with_capacity(values.len() + 3);
        params.push(SqlValue::Text(collection.to_string()));
        params.append(&mut values);
        params.push(SqlValue::Integer(
            options.limit.map_or(-1, |limit| limit as i64),
        ));
        params.push(SqlValue::Integer(options.skip as i64));

        let conn = self.pool.get()?;
        if let Some(timeout) = options.timeout {
            let deadline = Instant::now() + timeout;
            conn.progress_handler(PROGRESS_CHECK_OPS, Some(move || Instant::now() >= deadline));
        }

        let result = (|| -> StoreResult<Vec<Document>> {
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
                row.get::<_, String>(0)
            })?;

            let mut docs = Vec::new();
            for body in rows {
                docs.push(serde_json::from_str::<Document>(&body?)?);
            }
            Ok(docs)
        })();

        if options.timeout.is_some() {
            conn.progress_handler(0, None::<fn() -> bool>);
        }

        match result {
            Err(StoreError::Sqlite(rusqlite::Error::SqliteFailure(err, _)))
                if err.code == ErrorCode::OperationInterrupted =>
            {
                Err(StoreError::Timeout(collection.to_string()))
            }
            other => other,
        }
    }
}

impl DocumentStore for SqliteStore {
    fn insert_many(&self, collection: &str, documents: &[Document]) -> StoreResult<usize> {
        check_collection_name(collection)?;
        if documents.is_empty() {
            return Ok(0);
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare_cached("INSERT INTO documents (collection, body) VALUES (?1, ?2)")?;
            for doc in documents {
                let body = serde_json::to_string(doc)?;
                stmt.execute(params![collection, body])?;
            }
        }
        tx.commit()?;

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
        self.run_find(collection, filter, options)
    }

    fn list_collections(&self) -> StoreResult<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare_cached("SELECT DISTINCT collection FROM documents ORDER BY collection")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn ping(&self) -> StoreResult<()> {
        let conn = self.pool.get()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| StoreError::Connection {
                target: self.describe(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

fn json_path(field: &str) -> String {
    // field names are validated identifiers, safe to inline so the expression index matches
    format!("json_extract(body, '$.{}')", field)
}

/// `json_type` values a stored field must have to be compared with `value`.
fn json_types_for(value: &Value) -> &'static str {
    match value {
        Value::Number(_) => "'integer', 'real'",
        Value::String(_) => "'text'",
        Value::Bool(_) => "'true', 'false'",
        _ => "'null'",
    }
}

fn to_sql_value(value: &Value) -> StoreResult<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(*b as i64)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(SqlValue::Integer(i)),
            None => n
                .as_f64()
                .map(SqlValue::Real)
                .ok_or_else(|| StoreError::InvalidFilter(format!("unsupported number {}", n))),
        },
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        other => Err(StoreError::InvalidFilter(format!(
            "operand must be a scalar, got {}",
            other
        ))),
    }
}

///
/// One typed comparison. The stored value must have the operand's JSON type, so that
/// SQLite's cross-type ordering (numbers before text) never produces a match.
///
fn comparison(field: &str, op: &str, value: &Value) -> StoreResult<(String, Vec<SqlValue>)> {
    let type_guard = format!(
        "json_type(body, '$.{}') IN ({})",
        field,
        json_types_for(value)
    );
    if value.is_null() {
        // null only orders equal to itself
        let clause = match op {
            "=" | "<=" | ">=" => type_guard,
            _ => "0".to_string(),
        };
        return Ok((clause, Vec::new()));
    }
    Ok((
        format!("{} AND {} {} ?", type_guard, json_path(field), op),
        vec![to_sql_value(value)?],
    ))
}

///
/// Translate a filter into a SQL boolean expression plus its positional parameters.
///
fn to_sql(filter: &Filter) -> StoreResult<(String, Vec<SqlValue>)> {
    match filter {
        Filter::All => Ok(("1".to_string(), Vec::new())),
        Filter::Eq(field, value) => comparison(field, "=", value),
        Filter::Lt(field, value) => comparison(field, "<", value),
        Filter::Lte(field, value) => comparison(field, "<=", value),
        Filter::Gt(field, value) => comparison(field, ">", value),
        Filter::Gte(field, value) => comparison(field, ">=", value),
        Filter::In(field, values) => {
            if values.is_empty() {
                return Ok(("0".to_string(), Vec::new()));
            }
            let mut clauses = Vec::with_capacity(values.len());
            let mut params = Vec::new();
            for value in values {
                let (clause, mut values) = comparison(field, "=", value)?;
                clauses.push(format!("({})", clause));
                params.append(&mut values);
            }
            Ok((clauses.join(" OR "), params))
        }
        Filter::And(filters) => {
            if filters.is_empty() {
                return Ok(("1".to_string(), Vec::new()));
            }
            let mut clauses = Vec::with_capacity(filters.len());
            let mut params = Vec::new();
            for f in filters {
                let (clause, mut values) = to_sql(f)?;
                clauses.push(format!("({})", clause));
                params.append(&mut values);
            }
            Ok((clauses.join(" AND "), params))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;

    fn interval(chrom: &str, start: u32, end: u32, state: &str) -> Document {
        json!({"chrom": chrom, "start": start, "end": end, "state": state})
            .as_object()
            .unwrap()
            .clone()
    }

    #[fixture]
    fn store() -> (tempfile::TempDir, SqliteStore) {
        let tempdir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(tempdir.path().join("nested/store.sqlite"), 4).unwrap();
        let docs = vec![
            interval("chr1", 2, 5, "A"),
            interval("chr1", 5, 8, "B"),
            interval("chr2", 1, 100, "A"),
            interval("chr1", 50, 80, "C"),
        ];
        store.insert_many("s1", &docs).unwrap();
        (tempdir, store)
    }

    #[rstest]
    fn test_find_in_insertion_order(store: (tempfile::TempDir, SqliteStore)) {
        let (_dir, store) = store;
        let filter = Filter::eq("chrom", "chr1");
        let hits = store.find("s1", &filter, &FindOptions::new()).unwrap();

        let starts: Vec<i64> = hits.iter().map(|d| d["start"].as_i64().unwrap()).collect();
        assert_eq!(starts, vec![2, 5, 50]);
    }

    #[rstest]
    fn test_half_open_translation(store: (tempfile::TempDir, SqliteStore)) {
        let (_dir, store) = store;
        let filter = Filter::eq("chrom", "chr1")
            .and(Filter::lt("start", 6))
            .and(Filter::gt("end", 5));
        let hits = store.find("s1", &filter, &FindOptions::new()).unwrap();

        assert_eq!(hits, vec![interval("chr1", 5, 8, "B")]);
    }

    #[rstest]
    fn test_skip_limit_and_in(store: (tempfile::TempDir, SqliteStore)) {
        let (_dir, store) = store;
        let filter = Filter::is_in("state", ["A", "C"]);

        let all = store.find("s1", &filter, &FindOptions::new()).unwrap();
        assert_eq!(all.len(), 3);

        let page = store
            .find(
                "s1",
                &filter,
                &FindOptions::new().with_skip(1).with_limit(Some(1)),
            )
            .unwrap();
        assert_eq!(page, vec![all[1].clone()]);

        let none = store
            .find("s1", &Filter::is_in("state", Vec::<String>::new()), &FindOptions::new())
            .unwrap();
        assert!(none.is_empty());
    }

    #[rstest]
    fn test_collections_are_independent(store: (tempfile::TempDir, SqliteStore)) {
        let (_dir, store) = store;
        store
            .insert_many("s2", &[interval("chr1", 2, 5, "Z")])
            .unwrap();

        assert_eq!(store.list_collections().unwrap(), vec!["s1", "s2"]);
        let hits = store.find("s2", &Filter::All, &FindOptions::new()).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(store.find("s3", &Filter::All, &FindOptions::new()).unwrap().is_empty());
    }

    #[rstest]
    fn test_reopen_keeps_documents(store: (tempfile::TempDir, SqliteStore)) {
        let (dir, store) = store;
        let path = store.path().to_path_buf();
        drop(store);

        let reopened = SqliteStore::open(&path, 1).unwrap();
        assert!(reopened.ping().is_ok());
        let hits = reopened.find("s1", &Filter::All, &FindOptions::new()).unwrap();
        assert_eq!(hits.len(), 4);
        drop(dir);
    }

    #[rstest]
    fn test_concurrent_readers(store: (tempfile::TempDir, SqliteStore)) {
        let (_dir, store) = store;
        let store = Arc::new(store);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .find("s1", &Filter::eq("chrom", "chr1"), &FindOptions::new())
                        .unwrap()
                        .len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3);
        }
    }

    #[rstest]
    fn test_zero_timeout_interrupts(store: (tempfile::TempDir, SqliteStore)) {
        let (_dir, store) = store;
        let docs: Vec<Document> = (0..5000).map(|i| interval("chr3", i, i + 1, "A")).collect();
        store.insert_many("big", &docs).unwrap();

        let options = FindOptions::new().with_timeout(Some(Duration::ZERO));
        let result = store.find("big", &Filter::gte("end", 0), &options);
        assert!(result.unwrap_err().is_timeout());

        // the handler is cleared, the pooled connection works untimed afterwards
        let hits = store.find("big", &Filter::gte("end", 0), &FindOptions::new()).unwrap();
        assert_eq!(hits.len(), 5000);
    }

    #[rstest]
    fn test_to_sql() {
        let filter = Filter::eq("chrom", "chr1").and(Filter::lt("start", 10));
        let (clause, params) = to_sql(&filter).unwrap();
        assert_eq!(
            clause,
            "(json_type(body, '$.chrom') IN ('text') AND json_extract(body, '$.chrom') = ?) \
             AND (json_type(body, '$.start') IN ('integer', 'real') AND json_extract(body, '$.start') < ?)"
        );
        assert_eq!(
            params,
            vec![SqlValue::Text("chr1".to_string()), SqlValue::Integer(10)]
        );
    }

    #[rstest]
    #[case(Filter::gt("state", 5))]
    #[case(Filter::lt("state", 5))]
    #[case(Filter::gte("start", "a"))]
    #[case(Filter::eq("missing", serde_json::Value::Null))]
    #[case(Filter::is_in("start", [json!("2"), json!(5)]))]
    #[case(Filter::lte("start", 5.5))]
    fn test_matches_memory_store(
        store: (tempfile::TempDir, SqliteStore),
        #[case] filter: Filter,
    ) {
        let (_dir, store) = store;
        let memory = crate::MemoryStore::new();
        let docs = store.find("s1", &Filter::All, &FindOptions::new()).unwrap();
        memory.insert_many("s1", &docs).unwrap();

        let in_sqlite = store.find("s1", &filter, &FindOptions::new()).unwrap();
        let in_memory = memory.find("s1", &filter, &FindOptions::new()).unwrap();
        assert_eq!(in_sqlite, in_memory);
    }
}
