use fxhash::FxHashMap;

use ragx_core::IntervalRecord;

/// One indexed record: its span and its position in the indexed slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Span {
    start: u32,
    end: u32,
    order: usize,
}

#[derive(Debug, Default)]
struct ChromSpans {
    /// Sorted by start.
    spans: Vec<Span>,
    /// Width of the widest span.
    max_len: u32,
}

///
/// A binary interval search index over a slice of records.
///
/// Spans are kept per chromosome, sorted by start, together with the widest span. A query
/// binary searches the first span starting at or after `start - max_len` and scans forward
/// until spans start past the query end. Results come back in slice order, which for a
/// sample's records is its collection order.
///
#[derive(Debug)]
pub(crate) struct OverlapIndex<'a> {
    records: &'a [IntervalRecord],
    chroms: FxHashMap<&'a str, ChromSpans>,
}

impl<'a> OverlapIndex<'a> {
    pub(crate) fn build(records: &'a [IntervalRecord]) -> Self {
        let mut chroms: FxHashMap<&'a str, ChromSpans> = FxHashMap::default();
        for (order, record) in records.iter().enumerate() {
            // inverted spans overlap nothing
            if record.start > record.end {
                continue;
            }
            let entry = chroms.entry(record.chr.as_str()).or_default();
            entry.spans.push(Span {
                start: record.start,
                end: record.end,
                order,
            });
            entry.max_len = entry.max_len.max(record.width());
        }
        for entry in chroms.values_mut() {
            entry.spans.sort();
        }

        OverlapIndex { records, chroms }
    }

    /// First span index that can overlap a query starting at `start`.
    fn lower_bound(start: u32, spans: &[Span]) -> usize {
        let mut size = spans.len();
        let mut low = 0;

        while size > 0 {
            let half = size / 2;
            let other_half = size - half;
            let mid = low + half;
            let other_low = low + other_half;
            size = half;
            low = if spans[mid].start < start { other_low } else { low }
        }
        low
    }

    fn spans_overlapping(&self, chr: &str, start: u32, end: u32) -> impl Iterator<Item = &Span> {
        let spans: &[Span] = self
            .chroms
            .get(chr)
            .map(|c| c.spans.as_slice())
            .unwrap_or(&[]);
        let max_len = self.chroms.get(chr).map_or(0, |c| c.max_len);
        let offset = Self::lower_bound(start.saturating_sub(max_len), spans);

        spans[offset..]
            .iter()
            .take_while(move |s| s.start < end)
            .filter(move |s| s.end > start)
    }

    ///
    /// Records overlapping `[start, end)`, in slice order.
    ///
    pub(crate) fn find(&self, chr: &str, start: u32, end: u32) -> Vec<&'a IntervalRecord> {
        let mut orders: Vec<usize> = self
            .spans_overlapping(chr, start, end)
            .map(|s| s.order)
            .collect();
        orders.sort_unstable();
        let records = self.records;
        orders.into_iter().map(|i| &records[i]).collect()
    }

    ///
    /// The earliest record, in slice order, covering all of `[start, end)`.
    ///
    pub(crate) fn first_covering(&self, chr: &str, start: u32, end: u32) -> Option<&'a IntervalRecord> {
        let records = self.records;
        self.spans_overlapping(chr, start, end)
            .filter(|s| s.start <= start && s.end >= end && s.end > s.start)
            .map(|s| s.order)
            .min()
            .map(|i| &records[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn records() -> Vec<IntervalRecord> {
        vec![
            IntervalRecord::new("chr1", 50, 60),
            IntervalRecord::new("chr1", 0, 100),
            IntervalRecord::new("chr1", 55, 58),
            IntervalRecord::new("chr2", 0, 10),
            IntervalRecord::new("chr1", 200, 210),
        ]
    }

    fn spans(hits: &[&IntervalRecord]) -> Vec<(u32, u32)> {
        hits.iter().map(|r| (r.start, r.end)).collect()
    }

    #[rstest]
    fn test_find_in_slice_order(records: Vec<IntervalRecord>) {
        let index = OverlapIndex::build(&records);

        assert_eq!(
            spans(&index.find("chr1", 56, 57)),
            vec![(50, 60), (0, 100), (55, 58)]
        );
        assert_eq!(spans(&index.find("chr1", 100, 200)), vec![]);
        assert_eq!(spans(&index.find("chr1", 99, 201)), vec![(0, 100), (200, 210)]);
        assert_eq!(spans(&index.find("chrX", 0, 1000)), vec![]);
    }

    #[rstest]
    fn test_wide_interval_found_past_many_starts() {
        let mut records = vec![IntervalRecord::new("chr1", 0, 10_000)];
        records.extend((1..100).map(|i| IntervalRecord::new("chr1", i * 10, i * 10 + 1)));
        let index = OverlapIndex::build(&records);

        let hits = index.find("chr1", 5_000, 5_001);
        assert_eq!(spans(&hits), vec![(0, 10_000)]);
    }

    #[rstest]
    fn test_inverted_record_is_never_hit() {
        let records = vec![
            IntervalRecord::new("chr1", 300, 200),
            IntervalRecord::new("chr1", 100, 150),
        ];
        let index = OverlapIndex::build(&records);

        assert_eq!(spans(&index.find("chr1", 0, 1000)), vec![(100, 150)]);
        assert!(index.first_covering("chr1", 200, 300).is_none());
    }

    #[rstest]
    fn test_first_covering(records: Vec<IntervalRecord>) {
        let index = OverlapIndex::build(&records);

        let first = index.first_covering("chr1", 55, 58).unwrap();
        assert_eq!((first.start, first.end), (50, 60));
        let first = index.first_covering("chr1", 40, 60).unwrap();
        assert_eq!((first.start, first.end), (0, 100));
        assert!(index.first_covering("chr1", 150, 160).is_none());
        assert!(index.first_covering("chr2", 9, 12).is_none());
    }
}
