use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde_json::{Map, Number, Value};

use crate::errors::DecodeError;
use crate::models::Region;
use crate::schema::FieldKind;

/// Document keys holding the interval coordinates.
pub const CHROM_KEY: &str = "chrom";
pub const START_KEY: &str = "start";
pub const END_KEY: &str = "end";

///
/// A typed value of one dialect-specific field (score, state label, peak signal ...).
///
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Text(_) => FieldKind::Text,
        }
    }

    /// Numeric view of the value. Text is never coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Int(v) => Value::from(*v),
            FieldValue::Float(v) => Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(v) => Value::String(v.clone()),
        }
    }

    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(v) => Some(FieldValue::Int(v)),
                None => n.as_f64().map(FieldValue::Float),
            },
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

///
/// One normalized interval observation. Coordinates are 0-based, half-open.
///
/// Every record of a collection carries the full field set of the dialect it was
/// imported with.
///
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalRecord {
    pub chr: String,
    pub start: u32,
    pub end: u32,
    pub fields: BTreeMap<String, FieldValue>,
}

impl IntervalRecord {
    pub fn new(chr: impl Into<String>, start: u32, end: u32) -> Self {
        IntervalRecord {
            chr: chr.into(),
            start,
            end,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    ///
    /// Get a field by name. The coordinate keys resolve too, so `start` can be used as the
    /// value of interest in an assay.
    ///
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        match name {
            CHROM_KEY => Some(FieldValue::Text(self.chr.clone())),
            START_KEY => Some(FieldValue::Int(self.start as i64)),
            END_KEY => Some(FieldValue::Int(self.end as i64)),
            _ => self.fields.get(name).cloned(),
        }
    }

    pub fn width(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn region(&self) -> Region {
        Region::new(self.chr.clone(), self.start, self.end)
    }

    ///
    /// Convert the record into a store document: `chrom`, `start`, `end` plus one key per field.
    ///
    pub fn to_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert(CHROM_KEY.to_string(), Value::from(self.chr.clone()));
        doc.insert(START_KEY.to_string(), Value::from(self.start));
        doc.insert(END_KEY.to_string(), Value::from(self.end));
        for (name, value) in &self.fields {
            doc.insert(name.clone(), value.to_json());
        }
        doc
    }

    ///
    /// Rebuild a record from a store document. Keys starting with `_` are store bookkeeping
    /// and are ignored.
    ///
    pub fn from_document(doc: &Map<String, Value>) -> Result<Self, DecodeError> {
        let chr = doc
            .get(CHROM_KEY)
            .ok_or_else(|| DecodeError::MissingKey(CHROM_KEY.to_string()))?
            .as_str()
            .ok_or_else(|| DecodeError::invalid(CHROM_KEY, doc))?
            .to_string();

        let coordinate = |key: &str| -> Result<u32, DecodeError> {
            let value = doc
                .get(key)
                .ok_or_else(|| DecodeError::MissingKey(key.to_string()))?;
            value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| DecodeError::invalid(key, doc))
        };
        let start = coordinate(START_KEY)?;
        let end = coordinate(END_KEY)?;
        if start > end {
            return Err(DecodeError::invalid(START_KEY, doc));
        }

        let mut fields = BTreeMap::new();
        for (key, value) in doc {
            if key == CHROM_KEY || key == START_KEY || key == END_KEY || key.starts_with('_') {
                continue;
            }
            let value = FieldValue::from_json(value).ok_or_else(|| DecodeError::invalid(key, doc))?;
            fields.insert(key.clone(), value);
        }

        Ok(IntervalRecord {
            chr,
            start,
            end,
            fields,
        })
    }

    ///
    /// Get the tab separated, BED-like line of the record
    ///
    pub fn as_string(&self) -> String {
        let mut line = format!("{}\t{}\t{}", self.chr, self.start, self.end);
        for value in self.fields.values() {
            line.push('\t');
            line.push_str(&value.to_string());
        }
        line
    }
}

impl Display for IntervalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}
