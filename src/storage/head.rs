//! In-memory mutable ingestion buffer.
//!
//! Samples are written through a [`HeadAppender`] and only become part of the head when the
//! appender commits. A series seen for the first time gets its reference right away, but only
//! joins the head when the session commits; it keeps that reference for the lifetime of the head.

use ahash::AHashMap;
use tracing::debug;
use crate::common::labels::Labels;
use crate::common::types::{Sample, Timestamp};
use crate::config::get_global_settings;
use crate::error::{TsdbError, TsdbResult};
use crate::iter::{BoxedSeriesIterator, ListSeriesIterator};
use crate::series::Series;
use crate::storage::appender::{Appender, SeriesRef};

#[derive(Debug, Clone)]
pub struct HeadOptions {
    /// Time span the head accepts behind its newest sample is half of this.
    pub chunk_range: i64,
}

impl Default for HeadOptions {
    fn default() -> Self {
        Self {
            chunk_range: get_global_settings().chunk_range,
        }
    }
}

/// A series held by the head. Only committed samples are visible.
#[derive(Debug, Clone)]
pub struct HeadSeries {
    series_ref: SeriesRef,
    labels: Labels,
    samples: Vec<Sample>,
}

impl HeadSeries {
    pub fn series_ref(&self) -> SeriesRef {
        self.series_ref
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    fn max_time(&self) -> Option<Timestamp> {
        self.samples.last().map(|s| s.timestamp)
    }
}

impl Series for HeadSeries {
    fn labels(&self) -> &Labels {
        &self.labels
    }

    fn iterator(&self) -> BoxedSeriesIterator<'_> {
        Box::new(ListSeriesIterator::new(&self.samples))
    }
}

#[derive(Debug)]
pub struct Head {
    chunk_range: i64,
    /// Indexed by `series_ref - 1`.
    series: Vec<HeadSeries>,
    refs: AHashMap<Labels, SeriesRef>,
    min_time: Option<Timestamp>,
    max_time: Option<Timestamp>,
    num_samples: usize,
}

impl Head {
    pub fn new(options: HeadOptions) -> TsdbResult<Self> {
        if options.chunk_range <= 0 {
            let msg = format!("chunk range must be positive, got {}", options.chunk_range);
            return Err(TsdbError::InvalidConfiguration(msg));
        }
        Ok(Self {
            chunk_range: options.chunk_range,
            series: Vec::new(),
            refs: AHashMap::new(),
            min_time: None,
            max_time: None,
            num_samples: 0,
        })
    }

    /// Starts an append session. The head cannot be read or written otherwise until the
    /// appender is dropped.
    pub fn appender(&mut self) -> HeadAppender<'_> {
        HeadAppender {
            head: self,
            pending: Vec::new(),
            pending_max: AHashMap::new(),
            created: Vec::new(),
            created_refs: AHashMap::new(),
        }
    }

    /// Lowest committed timestamp, `None` while the head is empty.
    pub fn min_time(&self) -> Option<Timestamp> {
        self.min_time
    }

    /// Highest committed timestamp, `None` while the head is empty.
    pub fn max_time(&self) -> Option<Timestamp> {
        self.max_time
    }

    pub fn chunk_range(&self) -> i64 {
        self.chunk_range
    }

    pub fn num_series(&self) -> usize {
        self.series.len()
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn is_empty(&self) -> bool {
        self.num_samples == 0
    }

    pub fn series(&self) -> impl Iterator<Item = &HeadSeries> {
        self.series.iter()
    }

    pub fn get_series(&self, series_ref: SeriesRef) -> Option<&HeadSeries> {
        self.index_of(series_ref).map(|idx| &self.series[idx])
    }

    pub fn get_series_by_labels(&self, labels: &Labels) -> Option<&HeadSeries> {
        self.refs.get(labels).and_then(|r| self.get_series(*r))
    }

    fn index_of(&self, series_ref: SeriesRef) -> Option<usize> {
        if series_ref.is_none() {
            return None;
        }
        let idx = (series_ref.id() - 1) as usize;
        (idx < self.series.len()).then_some(idx)
    }

    fn create_series(&mut self, labels: Labels) -> SeriesRef {
        let series_ref = SeriesRef::new(self.series.len() as u64 + 1);
        self.refs.insert(labels.clone(), series_ref);
        self.series.push(HeadSeries {
            series_ref,
            labels,
            samples: Vec::new(),
        });
        series_ref
    }

    /// Samples older than this are rejected.
    fn min_valid_time(&self) -> Option<Timestamp> {
        self.max_time.map(|t| t.saturating_sub(self.chunk_range / 2))
    }
}

/// Append session against a [`Head`].
pub struct HeadAppender<'a> {
    head: &'a mut Head,
    pending: Vec<(SeriesRef, Sample)>,
    /// Newest pending timestamp per series, for ordering checks before commit.
    pending_max: AHashMap<SeriesRef, Timestamp>,
    /// Series first seen in this session, in reference order.
    created: Vec<Labels>,
    created_refs: AHashMap<Labels, SeriesRef>,
}

impl HeadAppender<'_> {
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn check_bounds(&self, t: Timestamp) -> TsdbResult<()> {
        match self.head.min_valid_time() {
            Some(min_valid) if t < min_valid => Err(TsdbError::OutOfBounds),
            _ => Ok(()),
        }
    }

    /// Newest committed timestamp of the series behind `series_ref`.
    fn committed_max(&self, series_ref: SeriesRef) -> TsdbResult<Option<Timestamp>> {
        if let Some(idx) = self.head.index_of(series_ref) {
            return Ok(self.head.series[idx].max_time());
        }
        let first_created = self.head.series.len() as u64 + 1;
        let created_end = first_created + self.created.len() as u64;
        if (first_created..created_end).contains(&series_ref.id()) {
            return Ok(None);
        }
        Err(TsdbError::SeriesNotFound(series_ref.id()))
    }

    fn append_sample(&mut self, series_ref: SeriesRef, t: Timestamp, v: f64) -> TsdbResult<()> {
        self.check_bounds(t)?;
        let committed_max = self.committed_max(series_ref)?;
        let pending_max = self.pending_max.get(&series_ref).copied();
        if let Some(last) = committed_max.max(pending_max) {
            if t < last {
                return Err(TsdbError::OutOfOrderSample);
            }
        }
        self.pending.push((series_ref, Sample::new(t, v)));
        self.pending_max.insert(series_ref, t);
        Ok(())
    }
}

impl Appender for HeadAppender<'_> {
    fn add_fast(&mut self, series_ref: SeriesRef, t: Timestamp, v: f64) -> TsdbResult<()> {
        self.append_sample(series_ref, t, v)
    }

    fn add(&mut self, labels: &Labels, t: Timestamp, v: f64) -> TsdbResult<SeriesRef> {
        labels.validate()?;
        let known = self
            .head
            .refs
            .get(labels)
            .or_else(|| self.created_refs.get(labels))
            .copied();
        if let Some(series_ref) = known {
            self.append_sample(series_ref, t, v)?;
            return Ok(series_ref);
        }

        // a new series is only registered once its first sample is accepted
        self.check_bounds(t)?;
        let series_ref = SeriesRef::new((self.head.series.len() + self.created.len()) as u64 + 1);
        self.created.push(labels.clone());
        self.created_refs.insert(labels.clone(), series_ref);
        self.append_sample(series_ref, t, v)?;
        Ok(series_ref)
    }

    fn commit(&mut self) -> TsdbResult<()> {
        let count = self.pending.len();
        let new_series = self.created.len();
        let head = &mut *self.head;
        for labels in self.created.drain(..) {
            head.create_series(labels);
        }
        self.created_refs.clear();
        for (series_ref, sample) in self.pending.drain(..) {
            let idx = (series_ref.id() - 1) as usize;
            head.series[idx].samples.push(sample);
            head.min_time = Some(head.min_time.map_or(sample.timestamp, |t| t.min(sample.timestamp)));
            head.max_time = Some(head.max_time.map_or(sample.timestamp, |t| t.max(sample.timestamp)));
        }
        head.num_samples += count;
        self.pending_max.clear();
        debug!(
            "head commit: {} samples, {} new series, {} series",
            count,
            new_series,
            head.series.len()
        );
        Ok(())
    }

    fn rollback(&mut self) -> TsdbResult<()> {
        debug!(
            "head rollback: {} samples and {} new series discarded",
            self.pending.len(),
            self.created.len()
        );
        self.pending.clear();
        self.pending_max.clear();
        self.created.clear();
        self.created_refs.clear();
        Ok(())
    }
}
