//! Interval-file dialects and row normalization.
//!
//! A dialect is plain data: a [`FieldSet`] naming where chrom/start/end live, which coordinate
//! convention the file uses and which extra typed fields follow. Supporting a new file flavour
//! means registering another [`FieldSet`], nothing else changes.
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::SchemaError;
use crate::models::{FieldValue, IntervalRecord};

/// Columns holding this are treated as missing and take the field default.
const MISSING_VALUE: &str = ".";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int,
    Float,
    Text,
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Int => "integer",
            FieldKind::Float => "float",
            FieldKind::Text => "text",
        };
        write!(f, "{}", name)
    }
}

/// How a dialect writes its coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateBase {
    /// BED convention, `[start, end)` with the first base at 0.
    #[default]
    ZeroHalfOpen,
    /// GFF convention, `[start, end]` with the first base at 1.
    OneClosed,
}

///
/// One optional, typed column of a dialect.
///
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub column: usize,
    pub kind: FieldKind,
    pub default: FieldValue,
}

impl FieldSpec {
    pub fn new(name: &str, column: usize, kind: FieldKind, default: FieldValue) -> Self {
        FieldSpec {
            name: name.to_string(),
            column,
            kind,
            default,
        }
    }

    fn parse(&self, raw: Option<&str>) -> Result<FieldValue, SchemaError> {
        let raw = match raw {
            None => return Ok(self.default.clone()),
            Some(raw) if raw.is_empty() || raw == MISSING_VALUE => {
                return Ok(self.default.clone());
            }
            Some(raw) => raw,
        };

        let invalid = || SchemaError::InvalidValue {
            field: self.name.clone(),
            value: raw.to_string(),
            kind: self.kind,
        };

        match self.kind {
            FieldKind::Int => raw.parse::<i64>().map(FieldValue::Int).map_err(|_| invalid()),
            FieldKind::Float => match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(FieldValue::Float(v)),
                _ => Err(invalid()),
            },
            FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
        }
    }
}

///
/// The field layout of one interval-file dialect.
///
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    pub name: String,
    pub base: CoordinateBase,
    pub chrom_column: usize,
    pub start_column: usize,
    pub end_column: usize,
    pub fields: Vec<FieldSpec>,
}

impl FieldSet {
    ///
    /// A BED-like layout: chrom, start, end in the first three columns, 0-based half-open.
    ///
    pub fn bed_like(name: &str) -> Self {
        FieldSet {
            name: name.to_string(),
            base: CoordinateBase::ZeroHalfOpen,
            chrom_column: 0,
            start_column: 1,
            end_column: 2,
            fields: Vec::new(),
        }
    }

    pub fn with_base(mut self, base: CoordinateBase) -> Self {
        self.base = base;
        self
    }

    pub fn with_core_columns(mut self, chrom: usize, start: usize, end: usize) -> Self {
        self.chrom_column = chrom;
        self.start_column = start;
        self.end_column = end;
        self
    }

    pub fn with_field(
        mut self,
        name: &str,
        column: usize,
        kind: FieldKind,
        default: impl Into<FieldValue>,
    ) -> Self {
        self.fields
            .push(FieldSpec::new(name, column, kind, default.into()));
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn core_value<'a>(
        &self,
        columns: &[&'a str],
        column: usize,
        field: &str,
    ) -> Result<&'a str, SchemaError> {
        columns
            .get(column)
            .copied()
            .ok_or_else(|| SchemaError::MissingField {
                field: field.to_string(),
                dialect: self.name.clone(),
            })
    }

    fn coordinate(&self, columns: &[&str], column: usize, field: &str) -> Result<u32, SchemaError> {
        let raw = self.core_value(columns, column, field)?;
        raw.trim()
            .parse::<u32>()
            .map_err(|_| SchemaError::InvalidCoordinate {
                field: field.to_string(),
                value: raw.to_string(),
                dialect: self.name.clone(),
            })
    }
}

///
/// The dialects that ship with ragx.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Bed3,
    Bed6,
    BedGraph,
    NarrowPeak,
    BroadPeak,
    /// Multi-state categorical segmentation (ChromHMM dense/expanded BED).
    ChromHmm,
    Gff,
}

impl Dialect {
    pub const ALL: [Dialect; 7] = [
        Dialect::Bed3,
        Dialect::Bed6,
        Dialect::BedGraph,
        Dialect::NarrowPeak,
        Dialect::BroadPeak,
        Dialect::ChromHmm,
        Dialect::Gff,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Bed3 => "bed3",
            Dialect::Bed6 => "bed6",
            Dialect::BedGraph => "bedGraph",
            Dialect::NarrowPeak => "narrowPeak",
            Dialect::BroadPeak => "broadPeak",
            Dialect::ChromHmm => "chromHMM",
            Dialect::Gff => "gff",
        }
    }

    ///
    /// Get the field layout of the dialect
    ///
    pub fn field_set(&self) -> FieldSet {
        use FieldKind::*;

        let base = FieldSet::bed_like(self.name());
        match self {
            Dialect::Bed3 => base,
            Dialect::Bed6 => base
                .with_field("name", 3, Text, ".")
                .with_field("score", 4, Int, 0i64)
                .with_field("strand", 5, Text, "."),
            Dialect::BedGraph => base.with_field("value", 3, Float, 0.0),
            Dialect::NarrowPeak => base
                .with_field("name", 3, Text, ".")
                .with_field("score", 4, Int, 0i64)
                .with_field("strand", 5, Text, ".")
                .with_field("signal_value", 6, Float, -1.0)
                .with_field("p_value", 7, Float, -1.0)
                .with_field("q_value", 8, Float, -1.0)
                .with_field("peak", 9, Int, -1i64),
            Dialect::BroadPeak => base
                .with_field("name", 3, Text, ".")
                .with_field("score", 4, Int, 0i64)
                .with_field("strand", 5, Text, ".")
                .with_field("signal_value", 6, Float, -1.0)
                .with_field("p_value", 7, Float, -1.0)
                .with_field("q_value", 8, Float, -1.0),
            Dialect::ChromHmm => base
                .with_field("state", 3, Text, "")
                .with_field("score", 4, Int, 0i64)
                .with_field("strand", 5, Text, ".")
                .with_field("item_rgb", 8, Text, "."),
            Dialect::Gff => base
                .with_base(CoordinateBase::OneClosed)
                .with_core_columns(0, 3, 4)
                .with_field("source", 1, Text, ".")
                .with_field("feature", 2, Text, ".")
                .with_field("score", 5, Float, -1.0)
                .with_field("strand", 6, Text, ".")
                .with_field("phase", 7, Text, ".")
                .with_field("attributes", 8, Text, "."),
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Dialect {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bed" | "bed3" => Ok(Dialect::Bed3),
            "bed6" => Ok(Dialect::Bed6),
            "bedgraph" | "bdg" => Ok(Dialect::BedGraph),
            "narrowpeak" => Ok(Dialect::NarrowPeak),
            "broadpeak" => Ok(Dialect::BroadPeak),
            "chromhmm" | "chmm" => Ok(Dialect::ChromHmm),
            "gff" | "gff3" | "gtf" => Ok(Dialect::Gff),
            _ => Err(SchemaError::UnknownDialect(s.to_string())),
        }
    }
}

///
/// Registry of known dialects, keyed by case-insensitive name.
///
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    dialects: HashMap<String, FieldSet>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        let mut registry = SchemaRegistry::empty();
        for dialect in Dialect::ALL {
            registry.register(dialect.field_set());
        }
        registry
    }
}

impl SchemaRegistry {
    pub fn empty() -> Self {
        SchemaRegistry {
            dialects: HashMap::new(),
        }
    }

    ///
    /// Register a dialect. A dialect with the same name is replaced and returned.
    ///
    pub fn register(&mut self, field_set: FieldSet) -> Option<FieldSet> {
        self.dialects
            .insert(field_set.name.to_lowercase(), field_set)
    }

    ///
    /// Resolve a dialect name (or a built-in alias such as `bed` or `gff3`) to its field set.
    ///
    pub fn dialect_for(&self, name: &str) -> Result<&FieldSet, SchemaError> {
        if let Some(field_set) = self.dialects.get(&name.to_lowercase()) {
            return Ok(field_set);
        }

        Dialect::from_str(name)
            .ok()
            .and_then(|d| self.dialects.get(&d.name().to_lowercase()))
            .ok_or_else(|| SchemaError::UnknownDialect(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.dialects.values().map(|d| d.name.as_str()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.dialects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialects.is_empty()
    }
}

///
/// Normalize one tab separated row into an [`IntervalRecord`].
///
/// Coordinates are converted to 0-based half-open. Optional columns that are absent or hold `.`
/// take the dialect default, so every record of a dialect has the same field set.
///
/// # Arguments
/// - raw_row: one line of the interval file, without header handling
/// - dialect: the field layout to apply
pub fn normalize(raw_row: &str, dialect: &FieldSet) -> Result<IntervalRecord, SchemaError> {
    let row = raw_row.trim_end_matches(['\r', '\n']);
    let columns: Vec<&str> = row.split('\t').collect();

    let chr = dialect
        .core_value(&columns, dialect.chrom_column, "chrom")?
        .trim();
    if chr.is_empty() {
        return Err(SchemaError::EmptyChrom(dialect.name.clone()));
    }

    let raw_start = dialect.coordinate(&columns, dialect.start_column, "start")?;
    let end = dialect.coordinate(&columns, dialect.end_column, "end")?;

    let start = match dialect.base {
        CoordinateBase::ZeroHalfOpen => raw_start,
        CoordinateBase::OneClosed => {
            raw_start
                .checked_sub(1)
                .ok_or_else(|| SchemaError::InvalidCoordinate {
                    field: "start".to_string(),
                    value: raw_start.to_string(),
                    dialect: dialect.name.clone(),
                })?
        }
    };

    if start > end {
        return Err(SchemaError::InvertedInterval { start, end });
    }

    let mut record = IntervalRecord::new(chr, start, end);
    for spec in &dialect.fields {
        let value = spec.parse(columns.get(spec.column).copied())?;
        record.fields.insert(spec.name.clone(), value);
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn registry() -> SchemaRegistry {
        SchemaRegistry::default()
    }

    #[rstest]
    fn test_normalize_bed3(registry: SchemaRegistry) {
        let bed3 = registry.dialect_for("bed").unwrap();
        let record = normalize("chr1\t100\t200\textra\tcolumns\n", bed3).unwrap();

        assert_eq!(record, IntervalRecord::new("chr1", 100, 200));
        assert!(record.fields.is_empty());
    }

    #[rstest]
    fn test_normalize_narrow_peak(registry: SchemaRegistry) {
        let narrow = registry.dialect_for("narrowPeak").unwrap();
        let record = normalize(
            "chr1\t32481\t32787\tSRX4150706.05_peak_1\t92\t.\t7.69231\t13.22648\t9.25988\t155",
            narrow,
        )
        .unwrap();

        assert_eq!(record.start, 32481);
        assert_eq!(record.get("score"), Some(FieldValue::Int(92)));
        assert_eq!(record.get("strand"), Some(FieldValue::Text(".".to_string())));
        assert_eq!(record.get("signal_value"), Some(FieldValue::Float(7.69231)));
        assert_eq!(record.get("peak"), Some(FieldValue::Int(155)));
    }

    #[rstest]
    fn test_missing_optional_columns_take_defaults(registry: SchemaRegistry) {
        let broad = registry.dialect_for("broadPeak").unwrap();
        let record = normalize("chr1\t100\t200\tpeak_a", broad).unwrap();

        let names: Vec<&str> = broad.field_names().collect();
        assert_eq!(record.fields.len(), names.len());
        assert_eq!(record.get("p_value"), Some(FieldValue::Float(-1.0)));
        assert_eq!(record.get("name").unwrap().as_text(), Some("peak_a"));
    }

    #[rstest]
    fn test_normalize_chromhmm_state(registry: SchemaRegistry) {
        let chmm = registry.dialect_for("chromHMM").unwrap();
        let record = normalize("chr1\t150\t250\tA", chmm).unwrap();

        assert_eq!(record.get("state").unwrap().as_text(), Some("A"));
        assert_eq!(record.get("item_rgb").unwrap().as_text(), Some("."));
    }

    #[rstest]
    fn test_normalize_gff_is_one_based(registry: SchemaRegistry) {
        let gff = registry.dialect_for("gff3").unwrap();
        let record = normalize(
            "chr2\tensembl\tgene\t1001\t2000\t.\t+\t.\tID=gene0",
            gff,
        )
        .unwrap();

        assert_eq!(record.region().to_string(), "chr2:1000-2000");
        assert_eq!(record.get("feature").unwrap().as_text(), Some("gene"));
        assert_eq!(record.get("score"), Some(FieldValue::Float(-1.0)));

        let zero_start = normalize("chr2\tsrc\tgene\t0\t10", gff);
        assert!(matches!(
            zero_start,
            Err(SchemaError::InvalidCoordinate { .. })
        ));
    }

    #[rstest]
    #[case("chr1\t100", SchemaError::MissingField { field: "end".into(), dialect: "bed3".into() })]
    #[case("chr1\tabc\t200", SchemaError::InvalidCoordinate { field: "start".into(), value: "abc".into(), dialect: "bed3".into() })]
    #[case("chr1\t-1\t200", SchemaError::InvalidCoordinate { field: "start".into(), value: "-1".into(), dialect: "bed3".into() })]
    #[case("\t100\t200", SchemaError::EmptyChrom("bed3".into()))]
    #[case("chr1\t300\t200", SchemaError::InvertedInterval { start: 300, end: 200 })]
    fn test_normalize_errors(
        registry: SchemaRegistry,
        #[case] row: &str,
        #[case] expected: SchemaError,
    ) {
        let bed3 = registry.dialect_for("bed3").unwrap();
        assert_eq!(normalize(row, bed3), Err(expected));
    }

    #[rstest]
    fn test_invalid_optional_value(registry: SchemaRegistry) {
        let bed6 = registry.dialect_for("bed6").unwrap();
        let result = normalize("chr1\t1\t2\tname\thigh\t+", bed6);
        assert_eq!(
            result,
            Err(SchemaError::InvalidValue {
                field: "score".into(),
                value: "high".into(),
                kind: FieldKind::Int,
            })
        );

        let graph = registry.dialect_for("bedGraph").unwrap();
        assert!(normalize("chr1\t1\t2\tNaN", graph).is_err());
    }

    #[rstest]
    fn test_register_custom_dialect() {
        let mut registry = SchemaRegistry::default();
        let before = registry.len();

        let dhs = FieldSet::bed_like("dhsFootprint")
            .with_field("tissue", 3, FieldKind::Text, "unknown")
            .with_field("density", 4, FieldKind::Float, 0.0);
        assert!(registry.register(dhs).is_none());
        assert_eq!(registry.len(), before + 1);

        let resolved = registry.dialect_for("DHSFOOTPRINT").unwrap();
        let record = normalize("chr3\t5\t9\tliver\t0.25", resolved).unwrap();
        assert_eq!(record.get("density"), Some(FieldValue::Float(0.25)));
    }

    #[rstest]
    fn test_unknown_dialect(registry: SchemaRegistry) {
        assert_eq!(
            registry.dialect_for("vcf"),
            Err(SchemaError::UnknownDialect("vcf".to_string()))
        );
        assert!(SchemaRegistry::empty().dialect_for("bed3").is_err());
    }

    #[rstest]
    fn test_dialect_names_round_trip() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.name().parse::<Dialect>().unwrap(), dialect);
            assert_eq!(dialect.field_set().name, dialect.name());
        }
        assert_eq!(Dialect::default(), Dialect::Bed3);
    }
}
