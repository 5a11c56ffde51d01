use crate::common::types::{Sample, Timestamp};
use crate::iter::SeriesIterator;

/// Cursor over a fixed, time-ordered slice of samples.
///
/// Seeks are binary searches restricted to the samples at or after the current position, so a
/// run of seeks with non-decreasing targets never rescans what it already passed. Seeking to an
/// earlier timestamp does not rewind; construct a new iterator instead.
#[derive(Debug, Clone)]
pub struct ListSeriesIterator<'a> {
    list: &'a [Sample],
    /// `None` until the first `advance` or `seek`.
    idx: Option<usize>,
}

impl<'a> ListSeriesIterator<'a> {
    pub fn new(list: &'a [Sample]) -> Self {
        Self { list, idx: None }
    }

    /// Current index, or `None` before the first sample. Equals `len` once exhausted.
    pub fn index(&self) -> Option<usize> {
        self.idx
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl SeriesIterator for ListSeriesIterator<'_> {
    fn advance(&mut self) -> bool {
        let next = self.idx.map_or(0, |idx| idx + 1).min(self.list.len());
        self.idx = Some(next);
        next < self.list.len()
    }

    fn current(&self) -> Option<Sample> {
        self.idx.and_then(|idx| self.list.get(idx)).copied()
    }

    fn seek(&mut self, t: Timestamp) -> bool {
        let start = self.idx.unwrap_or(0).min(self.list.len());
        // binary search between current position and end
        let offset = self.list[start..].partition_point(|s| s.timestamp < t);
        let idx = start + offset;
        self.idx = Some(idx);
        idx < self.list.len()
    }
}

impl Iterator for ListSeriesIterator<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            self.current()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn samples(timestamps: &[Timestamp]) -> Vec<Sample> {
        timestamps
            .iter()
            .enumerate()
            .map(|(i, &t)| Sample::new(t, i as f64))
            .collect()
    }

    #[test]
    fn test_current_before_advance() {
        let list = samples(&[1, 2, 3]);
        let it = ListSeriesIterator::new(&list);
        assert_eq!(it.current(), None);
        assert_eq!(it.index(), None);
    }

    #[test]
    fn test_advance_visits_all_in_order() {
        let list = samples(&[1, 2, 2, 5]);
        let mut it = ListSeriesIterator::new(&list);
        let mut seen = vec![];
        while it.advance() {
            seen.push(it.current().unwrap());
        }
        assert_eq!(seen, list);
        assert_eq!(it.current(), None);
        // stays exhausted
        assert!(!it.advance());
        assert_eq!(it.index(), Some(list.len()));
    }

    #[test]
    fn test_empty_list() {
        let list: Vec<Sample> = vec![];
        let mut it = ListSeriesIterator::new(&list);
        assert!(!it.advance());
        assert_eq!(it.current(), None);

        let mut it = ListSeriesIterator::new(&list);
        assert!(!it.seek(0));
        assert!(it.error().is_none());
    }

    #[test_case(0, Some(0) ; "before first sample")]
    #[test_case(10, Some(0) ; "exact first")]
    #[test_case(11, Some(1) ; "between samples")]
    #[test_case(30, Some(2) ; "exact duplicate start")]
    #[test_case(50, Some(4) ; "last sample")]
    #[test_case(51, None ; "past the end")]
    fn test_seek_from_start(target: Timestamp, expected: Option<usize>) {
        let list = samples(&[10, 20, 30, 30, 50]);
        let mut it = ListSeriesIterator::new(&list);
        let found = it.seek(target);
        assert_eq!(found, expected.is_some());
        match expected {
            Some(idx) => {
                assert_eq!(it.index(), Some(idx));
                assert_eq!(it.current(), Some(list[idx]));
            }
            None => assert_eq!(it.current(), None),
        }
    }

    #[test]
    fn test_seek_does_not_rewind() {
        let list = samples(&[10, 20, 30, 40]);
        let mut it = ListSeriesIterator::new(&list);
        assert!(it.seek(30));
        assert_eq!(it.index(), Some(2));

        // earlier target: cursor stays on the current sample
        assert!(it.seek(5));
        assert_eq!(it.index(), Some(2));
        assert_eq!(it.current().unwrap().timestamp, 30);
    }

    #[test]
    fn test_seek_after_advance() {
        let list = samples(&[10, 20, 30, 40]);
        let mut it = ListSeriesIterator::new(&list);
        assert!(it.advance());
        assert!(it.advance());
        assert_eq!(it.current().unwrap().timestamp, 20);

        assert!(it.seek(25));
        assert_eq!(it.current().unwrap().timestamp, 30);

        assert!(it.advance());
        assert_eq!(it.current().unwrap().timestamp, 40);
        assert!(!it.advance());

        // exhausted cursor cannot be revived by seeking
        assert!(!it.seek(0));
        assert_eq!(it.current(), None);
    }

    #[test]
    fn test_std_iterator() {
        let list = samples(&[1, 2, 3]);
        let it = ListSeriesIterator::new(&list);
        let collected: Vec<Sample> = it.collect();
        assert_eq!(collected, list);
    }

    fn sorted_timestamps() -> impl Strategy<Value = Vec<Timestamp>> {
        prop::collection::vec(-1000i64..1000, 1..64).prop_map(|mut v| {
            v.sort();
            v
        })
    }

    proptest! {
        #[test]
        fn prop_advance_visits_every_element(ts in sorted_timestamps()) {
            let list = samples(&ts);
            let mut it = ListSeriesIterator::new(&list);
            let mut i = 0;
            while it.advance() {
                prop_assert_eq!(it.current(), Some(list[i]));
                i += 1;
            }
            prop_assert_eq!(i, list.len());
        }

        #[test]
        fn prop_seek_is_monotonic(
            ts in sorted_timestamps(),
            mut targets in prop::collection::vec(-1100i64..1100, 1..16)
        ) {
            targets.sort();
            let list = samples(&ts);
            let mut it = ListSeriesIterator::new(&list);
            let mut last_idx = 0usize;
            for t in targets {
                let found = it.seek(t);
                let expected = list.partition_point(|s| s.timestamp < t);
                let idx = it.index().unwrap();
                prop_assert_eq!(idx, expected);
                prop_assert!(idx >= last_idx);
                prop_assert_eq!(found, idx < list.len());
                last_idx = idx;
            }
        }

        #[test]
        fn prop_backward_seek_leaves_cursor(ts in sorted_timestamps(), pick in 0usize..64) {
            let list = samples(&ts);
            let pick = pick % list.len();
            let mut it = ListSeriesIterator::new(&list);
            prop_assert!(it.seek(list[pick].timestamp));
            let pos = it.index();
            let current = it.current().unwrap();
            prop_assert!(it.seek(current.timestamp - 1));
            prop_assert_eq!(it.index(), pos);
        }
    }
}
