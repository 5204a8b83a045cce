use thiserror::Error;

use crate::schema::FieldKind;

/// Raised when a raw row cannot be normalized against a dialect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Unknown interval file dialect: {0}")]
    UnknownDialect(String),

    #[error("Missing required field `{field}` for dialect {dialect}")]
    MissingField { field: String, dialect: String },

    #[error("Invalid {field} coordinate `{value}` for dialect {dialect}")]
    InvalidCoordinate {
        field: String,
        value: String,
        dialect: String,
    },

    #[error("Empty chromosome name for dialect {0}")]
    EmptyChrom(String),

    #[error("Interval start {start} is greater than end {end}")]
    InvertedInterval { start: u32, end: u32 },

    #[error("Invalid value `{value}` for {kind} field `{field}`")]
    InvalidValue {
        field: String,
        value: String,
        kind: FieldKind,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionParseError {
    #[error("Region must look like `chr:start-end`, got: {0}")]
    InvalidFormat(String),

    #[error("Invalid coordinate in region `{0}`")]
    InvalidCoordinate(String),

    #[error("Region start is greater than end: {0}")]
    InvertedRegion(String),
}

/// Raised when a store document does not decode into an interval record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Document is missing key `{0}`")]
    MissingKey(String),

    #[error("Invalid value for key `{key}` in document {document}")]
    InvalidKey { key: String, document: String },
}

impl DecodeError {
    pub(crate) fn invalid(key: &str, doc: &serde_json::Map<String, serde_json::Value>) -> Self {
        DecodeError::InvalidKey {
            key: key.to_string(),
            document: serde_json::Value::Object(doc.clone()).to_string(),
        }
    }
}
