use serde::{Deserialize, Serialize};
use crate::common::labels::Labels;
use crate::common::types::{is_time_ordered, Sample};
use crate::error::{TsdbError, TsdbResult};
use crate::iter::{BoxedSeriesIterator, ListSeriesIterator};

/// A labeled series whose samples can be walked with a fresh iterator.
pub trait Series {
    fn labels(&self) -> &Labels;
    fn iterator(&self) -> BoxedSeriesIterator<'_>;
}

/// One logical time series used as test input: a label set and its samples in timestamp order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesFixture {
    labels: Labels,
    samples: Vec<Sample>,
}

impl SeriesFixture {
    /// Creates a fixture, rejecting sample lists whose timestamps decrease.
    pub fn new(labels: Labels, samples: Vec<Sample>) -> TsdbResult<Self> {
        if !is_time_ordered(&samples) {
            let msg = format!("samples for {} are not in timestamp order", labels);
            return Err(TsdbError::Construction(msg));
        }
        Ok(Self { labels, samples })
    }

    /// Used where ordering is already guaranteed, e.g. by the generator.
    pub(crate) fn new_unchecked(labels: Labels, samples: Vec<Sample>) -> Self {
        debug_assert!(is_time_ordered(&samples));
        Self { labels, samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn min_time(&self) -> Option<i64> {
        self.samples.first().map(|s| s.timestamp)
    }

    pub fn max_time(&self) -> Option<i64> {
        self.samples.last().map(|s| s.timestamp)
    }
}

impl Series for SeriesFixture {
    fn labels(&self) -> &Labels {
        &self.labels
    }

    fn iterator(&self) -> BoxedSeriesIterator<'_> {
        Box::new(ListSeriesIterator::new(&self.samples))
    }
}

impl<T: Series + ?Sized> Series for &T {
    fn labels(&self) -> &Labels {
        (**self).labels()
    }

    fn iterator(&self) -> BoxedSeriesIterator<'_> {
        (**self).iterator()
    }
}
