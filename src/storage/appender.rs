use std::fmt::Display;
use serde::{Deserialize, Serialize};
use crate::common::labels::Labels;
use crate::common::types::Timestamp;
use crate::error::TsdbResult;

/// Opaque per-series handle handed out by [`Appender::add`]. Only valid for the series it was
/// returned for, within the same ingestion buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesRef(u64);

impl SeriesRef {
    /// No reference yet: the next append must go through [`Appender::add`].
    pub const NONE: SeriesRef = SeriesRef(0);

    pub const fn new(id: u64) -> Self {
        SeriesRef(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl Display for SeriesRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Batched write access to a mutable ingestion buffer. Appended samples become visible only
/// after [`Appender::commit`].
pub trait Appender {
    /// Appends a sample to the series identified by `series_ref`. Cheap, but only valid with a
    /// reference previously returned by [`Appender::add`] for the same series.
    fn add_fast(&mut self, series_ref: SeriesRef, t: Timestamp, v: f64) -> TsdbResult<()>;

    /// Appends a sample to the series identified by `labels`, creating the series if needed,
    /// and returns its reference.
    fn add(&mut self, labels: &Labels, t: Timestamp, v: f64) -> TsdbResult<SeriesRef>;

    /// Applies every pending sample as one unit.
    fn commit(&mut self) -> TsdbResult<()>;

    /// Discards every pending sample.
    fn rollback(&mut self) -> TsdbResult<()>;
}

impl<A: Appender + ?Sized> Appender for &mut A {
    fn add_fast(&mut self, series_ref: SeriesRef, t: Timestamp, v: f64) -> TsdbResult<()> {
        (**self).add_fast(series_ref, t, v)
    }

    fn add(&mut self, labels: &Labels, t: Timestamp, v: f64) -> TsdbResult<SeriesRef> {
        (**self).add(labels, t, v)
    }

    fn commit(&mut self) -> TsdbResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> TsdbResult<()> {
        (**self).rollback()
    }
}
