//! Ready-made reducers for [`crate::reduced_assay`].
//!
//! Each function returns a closure turning the records of one sample overlapping one bin
//! into a single cell value. Records whose field is missing, or not numeric for the
//! numeric reducers, are ignored; a reducer with nothing left to combine returns `None` and
//! the cell stays absent.
use ragx_core::{FieldValue, IntervalRecord};

fn numbers(hits: &[&IntervalRecord], field: &str) -> Vec<f64> {
    hits.iter()
        .filter_map(|r| r.get(field).and_then(|v| v.as_f64()))
        .collect()
}

pub fn max(field: &str) -> impl Fn(&[&IntervalRecord]) -> Option<f64> {
    let field = field.to_string();
    move |hits: &[&IntervalRecord]| {
        numbers(hits, &field)
            .into_iter()
            .reduce(f64::max)
    }
}

pub fn min(field: &str) -> impl Fn(&[&IntervalRecord]) -> Option<f64> {
    let field = field.to_string();
    move |hits: &[&IntervalRecord]| {
        numbers(hits, &field)
            .into_iter()
            .reduce(f64::min)
    }
}

pub fn sum(field: &str) -> impl Fn(&[&IntervalRecord]) -> Option<f64> {
    let field = field.to_string();
    move |hits: &[&IntervalRecord]| numbers(hits, &field).into_iter().reduce(|a, b| a + b)
}

/// Arithmetic mean of the numeric values.
pub fn mean(field: &str) -> impl Fn(&[&IntervalRecord]) -> Option<f64> {
    let field = field.to_string();
    move |hits: &[&IntervalRecord]| {
        let values = numbers(hits, &field);
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

/// Number of overlapping records.
pub fn count() -> impl Fn(&[&IntervalRecord]) -> Option<usize> {
    |hits: &[&IntervalRecord]| Some(hits.len())
}

///
/// Join the values of `field` with `sep`, in collection order.
///
pub fn concat(field: &str, sep: &str) -> impl Fn(&[&IntervalRecord]) -> Option<String> {
    let field = field.to_string();
    let sep = sep.to_string();
    move |hits: &[&IntervalRecord]| {
        let parts: Vec<String> = hits
            .iter()
            .filter_map(|r| r.get(&field))
            .map(|v| v.to_string())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(&sep))
        }
    }
}

/// `field` of the first overlapping record.
pub fn first(field: &str) -> impl Fn(&[&IntervalRecord]) -> Option<FieldValue> {
    let field = field.to_string();
    move |hits: &[&IntervalRecord]| hits.first().and_then(|r| r.get(&field))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn records() -> Vec<IntervalRecord> {
        vec![
            IntervalRecord::new("chr1", 0, 10)
                .with_field("score", 2.0)
                .with_field("state", "A"),
            IntervalRecord::new("chr1", 5, 15)
                .with_field("score", 6.0)
                .with_field("state", "B"),
            IntervalRecord::new("chr1", 8, 9).with_field("score", "n/a"),
        ]
    }

    #[rstest]
    fn test_numeric_reducers(records: Vec<IntervalRecord>) {
        let hits: Vec<&IntervalRecord> = records.iter().collect();

        assert_eq!(max("score")(&hits[..]), Some(6.0));
        assert_eq!(min("score")(&hits[..]), Some(2.0));
        assert_eq!(sum("score")(&hits[..]), Some(8.0));
        assert_eq!(mean("score")(&hits[..]), Some(4.0));
        assert_eq!(mean("missing")(&hits[..]), None);
        assert_eq!(count()(&hits[..]), Some(3));
    }

    #[rstest]
    fn test_text_reducers(records: Vec<IntervalRecord>) {
        let hits: Vec<&IntervalRecord> = records.iter().collect();

        assert_eq!(concat("state", ",")(&hits[..]), Some("A,B".to_string()));
        assert_eq!(first("state")(&hits[..]), Some(FieldValue::from("A")));
        assert_eq!(first("state")(&hits[2..]), None);
    }
}
