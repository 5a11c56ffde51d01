mod list_series_iterator;

use crate::common::types::{Sample, Timestamp};
use crate::error::TsdbError;

pub use list_series_iterator::ListSeriesIterator;

pub type BoxedSeriesIterator<'a> = Box<dyn SeriesIterator + 'a>;

/// A seekable cursor over the samples of one series, in timestamp order.
///
/// The cursor starts before the first sample: `advance` or `seek` must succeed before `current`
/// returns anything.
pub trait SeriesIterator {
    /// Moves to the next sample. Returns false once the samples are exhausted.
    fn advance(&mut self) -> bool;

    /// The sample at the current position, or `None` if the cursor is not on a sample.
    fn current(&self) -> Option<Sample>;

    /// Moves forward to the first sample with `timestamp >= t`. Never moves backward: if the
    /// current sample is already at or after `t` the cursor stays where it is.
    fn seek(&mut self, t: Timestamp) -> bool;

    /// Error encountered while producing samples. Storage-backed iterators report I/O failures
    /// here; in-memory iterators never fail.
    fn error(&self) -> Option<&TsdbError> {
        None
    }
}
