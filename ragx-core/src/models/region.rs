use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::RegionParseError;

///
/// Region struct, a genomic query window or a column label in an assay matrix.
///
/// Coordinates are 0-based and half-open: `[start, end)`.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Region {
    pub chr: String,
    pub start: u32,
    pub end: u32,
}

impl Region {
    pub fn new(chr: impl Into<String>, start: u32, end: u32) -> Self {
        Region {
            chr: chr.into(),
            start,
            end,
        }
    }

    ///
    /// Get width of the region
    ///
    pub fn width(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    ///
    /// Half-open overlap test against another interval on the same chromosome.
    ///
    /// Intervals that only touch (`[2,5)` and `[5,8)`) do not overlap.
    ///
    pub fn overlaps(&self, chr: &str, start: u32, end: u32) -> bool {
        self.chr == chr && start < self.end && end > self.start
    }

    ///
    /// Does this region fully contain `other`?
    ///
    pub fn contains(&self, other: &Region) -> bool {
        self.chr == other.chr && self.start <= other.start && other.end <= self.end
    }

    ///
    /// Get the `chr:start-end` string of the region
    ///
    pub fn as_string(&self) -> String {
        format!("{}:{}-{}", self.chr, self.start, self.end)
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl FromStr for Region {
    type Err = RegionParseError;

    ///
    /// Parse `chr1:100-200` (thousands separators allowed) or a tab separated
    /// `chr1\t100\t200` line.
    ///
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (chr, start, end) = if s.contains('\t') {
            let mut parts = s.split('\t');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(chr), Some(start), Some(end)) => (chr, start, end),
                _ => return Err(RegionParseError::InvalidFormat(s.to_string())),
            }
        } else {
            let (chr, range) = s
                .rsplit_once(':')
                .ok_or_else(|| RegionParseError::InvalidFormat(s.to_string()))?;
            let (start, end) = range
                .split_once('-')
                .ok_or_else(|| RegionParseError::InvalidFormat(s.to_string()))?;
            (chr, start, end)
        };

        if chr.is_empty() {
            return Err(RegionParseError::InvalidFormat(s.to_string()));
        }

        let parse = |raw: &str| {
            raw.replace(',', "")
                .parse::<u32>()
                .map_err(|_| RegionParseError::InvalidCoordinate(s.to_string()))
        };
        let start = parse(start)?;
        let end = parse(end)?;

        if start > end {
            return Err(RegionParseError::InvertedRegion(s.to_string()));
        }

        Ok(Region::new(chr, start, end))
    }
}

impl TryFrom<&str> for Region {
    type Error = RegionParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Region::from_str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("chr1:100-200", Region::new("chr1", 100, 200))]
    #[case("chr1:1,000-2,500", Region::new("chr1", 1000, 2500))]
    #[case("chrX\t5\t8", Region::new("chrX", 5, 8))]
    #[case("HLA-A*01:01:1-20", Region::new("HLA-A*01:01", 1, 20))]
    fn test_parse_region(#[case] input: &str, #[case] expected: Region) {
        assert_eq!(input.parse::<Region>().unwrap(), expected);
    }

    #[rstest]
    #[case("chr1")]
    #[case(":1-2")]
    #[case("chr1:a-2")]
    #[case("chr1:300-200")]
    fn test_parse_bad_region(#[case] input: &str) {
        assert!(input.parse::<Region>().is_err());
    }

    #[rstest]
    fn test_half_open_overlap() {
        let query = Region::new("chr1", 5, 6);
        assert!(!query.overlaps("chr1", 2, 5));
        assert!(query.overlaps("chr1", 5, 8));
        assert!(!query.overlaps("chr2", 5, 8));
    }

    #[rstest]
    fn test_display_round_trip() {
        let region = Region::new("chr2", 10, 20);
        assert_eq!(region.to_string(), "chr2:10-20");
        assert_eq!(region.to_string().parse::<Region>().unwrap(), region);
        assert_eq!(region.width(), 10);
    }
}
