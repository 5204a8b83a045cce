//! Filter expressions and find options understood by every [`crate::DocumentStore`].
use std::cmp::Ordering;
use std::time::Duration;

use serde_json::Value;

use crate::errors::{StoreError, StoreResult};
use crate::traits::Document;

///
/// A simple document predicate: field comparisons joined by AND.
///
/// Comparisons between values of different JSON types never match.
///
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    Eq(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    In(String, Vec<Value>),
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn lt(field: &str, value: impl Into<Value>) -> Self {
        Filter::Lt(field.to_string(), value.into())
    }

    pub fn lte(field: &str, value: impl Into<Value>) -> Self {
        Filter::Lte(field.to_string(), value.into())
    }

    pub fn gt(field: &str, value: impl Into<Value>) -> Self {
        Filter::Gt(field.to_string(), value.into())
    }

    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Filter::Gte(field.to_string(), value.into())
    }

    pub fn is_in<V: Into<Value>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(
            field.to_string(),
            values.into_iter().map(Into::into).collect(),
        )
    }

    ///
    /// Combine two filters with AND, flattening nested conjunctions.
    ///
    pub fn and(self, other: Filter) -> Filter {
        let mut parts = Vec::new();
        for filter in [self, other] {
            match filter {
                Filter::All => {}
                Filter::And(inner) => parts.extend(inner),
                f => parts.push(f),
            }
        }
        match parts.len() {
            0 => Filter::All,
            1 => parts.remove(0),
            _ => Filter::And(parts),
        }
    }

    ///
    /// Evaluate the filter against a document.
    ///
    pub fn matches(&self, doc: &Document) -> bool {
        let cmp = |field: &str, value: &Value| doc.get(field).and_then(|v| compare(v, value));

        match self {
            Filter::All => true,
            Filter::Eq(field, value) => cmp(field, value) == Some(Ordering::Equal),
            Filter::Lt(field, value) => cmp(field, value) == Some(Ordering::Less),
            Filter::Lte(field, value) => matches!(
                cmp(field, value),
                Some(Ordering::Less) | Some(Ordering::Equal)
            ),
            Filter::Gt(field, value) => cmp(field, value) == Some(Ordering::Greater),
            Filter::Gte(field, value) => matches!(
                cmp(field, value),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
            Filter::In(field, values) => values
                .iter()
                .any(|value| cmp(field, value) == Some(Ordering::Equal)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }

    ///
    /// Check field names and operand types. Field names must be plain identifiers
    /// (`[A-Za-z0-9_]`), operands must be scalars.
    ///
    pub fn validate(&self) -> StoreResult<()> {
        let check = |field: &str, value: &Value| -> StoreResult<()> {
            if !is_valid_field(field) {
                return Err(StoreError::InvalidFilter(format!(
                    "field name {:?} is not a plain identifier",
                    field
                )));
            }
            if value.is_array() || value.is_object() {
                return Err(StoreError::InvalidFilter(format!(
                    "operand for field {} must be a scalar, got {}",
                    field, value
                )));
            }
            Ok(())
        };

        match self {
            Filter::All => Ok(()),
            Filter::Eq(field, value)
            | Filter::Lt(field, value)
            | Filter::Lte(field, value)
            | Filter::Gt(field, value)
            | Filter::Gte(field, value) => check(field, value),
            Filter::In(field, values) => {
                if values.is_empty() {
                    // an empty IN list is valid and matches nothing, but the name still has to be sane
                    return check(field, &Value::Null);
                }
                values.iter().try_for_each(|value| check(field, value))
            }
            Filter::And(filters) => filters.iter().try_for_each(Filter::validate),
        }
    }
}

pub(crate) fn is_valid_field(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

///
/// Order two JSON scalars of the same type. Integers compare exactly, other numbers as floats.
///
pub(crate) fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => Some(l.cmp(&r)),
            _ => l.as_f64()?.partial_cmp(&r.as_f64()?),
        },
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

///
/// Pagination and time limit of one `find` call.
///
/// `skip` and `limit` are handed to the store untouched. A `limit` of `None` returns every
/// remaining document.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub skip: usize,
    pub limit: Option<usize>,
    pub timeout: Option<Duration>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
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
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;

    #[fixture]
    fn doc() -> Document {
        json!({"chrom": "chr1", "start": 100, "end": 200, "score": 7.5, "state": "A"})
            .as_object()
            .unwrap()
            .clone()
    }

    #[rstest]
    #[case(Filter::eq("chrom", "chr1"), true)]
    #[case(Filter::eq("chrom", "chr2"), false)]
    #[case(Filter::lt("start", 101), true)]
    #[case(Filter::lt("start", 100), false)]
    #[case(Filter::lte("start", 100), true)]
    #[case(Filter::gt("end", 199.5), true)]
    #[case(Filter::gte("score", 7.5), true)]
    #[case(Filter::is_in("state", ["B", "A"]), true)]
    #[case(Filter::is_in("state", Vec::<String>::new()), false)]
    #[case(Filter::eq("start", "100"), false)]
    #[case(Filter::eq("missing", 1), false)]
    #[case(Filter::All, true)]
    fn test_matches(doc: Document, #[case] filter: Filter, #[case] expected: bool) {
        assert_eq!(filter.matches(&doc), expected);
    }

    #[rstest]
    fn test_and_flattens(doc: Document) {
        let filter = Filter::eq("chrom", "chr1")
            .and(Filter::lt("start", 300))
            .and(Filter::All)
            .and(Filter::gt("end", 150));

        match &filter {
            Filter::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected a conjunction, got {:?}", other),
        }
        assert!(filter.matches(&doc));
        assert_eq!(Filter::All.and(Filter::All), Filter::All);
    }

    #[rstest]
    fn test_validate() {
        assert!(Filter::eq("signal_value", 1).validate().is_ok());
        assert!(Filter::eq("bad field", 1).validate().is_err());
        assert!(Filter::eq("x')--", 1).validate().is_err());
        assert!(Filter::eq("state", json!(["A"])).validate().is_err());
        assert!(
            Filter::All
                .and(Filter::gt("", 1))
                .validate()
                .is_err()
        );
    }
}
