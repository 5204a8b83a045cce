use ragx_core::Region;

use crate::errors::{AssayError, AssayResult};

fn check_region(region: &Region) -> AssayResult<()> {
    if region.start > region.end {
        return Err(AssayError::InvalidBins(format!(
            "region {} starts after it ends",
            region
        )));
    }
    Ok(())
}

///
/// Cut `region` into consecutive bins of `width` bases. The last bin is shorter when the
/// region width is not a multiple of `width`.
///
pub fn tile_region(region: &Region, width: u32) -> AssayResult<Vec<Region>> {
    check_region(region)?;
    if width == 0 {
        return Err(AssayError::InvalidBins("tile width must be positive".to_string()));
    }

    let mut bins = Vec::new();
    let mut start = region.start;
    while start < region.end {
        let end = start.saturating_add(width).min(region.end);
        bins.push(Region::new(region.chr.as_str(), start, end));
        start = end;
    }
    Ok(bins)
}

///
/// Split `region` into `n` consecutive bins of near-equal width.
///
/// Fails when `n` is zero or larger than the region width (a zero-width region may only be
/// split into one bin).
///
pub fn split_region(region: &Region, n: usize) -> AssayResult<Vec<Region>> {
    check_region(region)?;
    let width = region.width() as u64;
    if n == 0 || n as u64 > width.max(1) {
        return Err(AssayError::InvalidBins(format!(
            "cannot split {} into {} bins",
            region, n
        )));
    }

    let n = n as u64;
    let bins = (0..n)
        .map(|i| {
            let start = region.start as u64 + i * width / n;
            let end = region.start as u64 + (i + 1) * width / n;
            Region::new(region.chr.as_str(), start as u32, end as u32)
        })
        .collect();
    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn labels(bins: &[Region]) -> Vec<String> {
        bins.iter().map(Region::as_string).collect()
    }

    #[rstest]
    fn test_tile_truncates_last_bin() {
        let bins = tile_region(&Region::new("chr1", 100, 350), 100).unwrap();
        assert_eq!(labels(&bins), vec!["chr1:100-200", "chr1:200-300", "chr1:300-350"]);
    }

    #[rstest]
    fn test_tile_rejects_zero_width() {
        assert!(tile_region(&Region::new("chr1", 0, 10), 0).is_err());
        assert!(tile_region(&Region::new("chr1", 5, 5), 3).unwrap().is_empty());
    }

    #[rstest]
    #[case(4, vec!["chr1:0-2", "chr1:2-5", "chr1:5-7", "chr1:7-10"])]
    #[case(1, vec!["chr1:0-10"])]
    #[case(3, vec!["chr1:0-3", "chr1:3-6", "chr1:6-10"])]
    fn test_split(#[case] n: usize, #[case] expected: Vec<&str>) {
        let bins = split_region(&Region::new("chr1", 0, 10), n).unwrap();
        assert_eq!(labels(&bins), expected);
    }

    #[rstest]
    fn test_split_rejects_bad_counts() {
        assert!(split_region(&Region::new("chr1", 0, 10), 0).is_err());
        assert!(split_region(&Region::new("chr1", 0, 10), 11).is_err());
        assert!(split_region(&Region::new("chr1", 10, 5), 1).is_err());
        assert_eq!(split_region(&Region::new("chr1", 10, 10), 1).unwrap().len(), 1);
        assert_eq!(split_region(&Region::new("chr1", 0, 10), 10).unwrap().len(), 10);
    }
}
