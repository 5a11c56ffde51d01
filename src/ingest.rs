//! Feeds series into an [`Appender`] the way a production write path does: the first sample of
//! a series goes through the label-keyed `add`, later samples reuse the returned reference via
//! `add_fast`, falling back to `add` whenever the fast path fails for any reason.

use std::ops::AddAssign;
use tracing::debug;
use crate::error::{TsdbError, TsdbResult};
use crate::iter::SeriesIterator;
use crate::series::Series;
use crate::storage::{Appender, SeriesRef};

/// Counters for one ingestion run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AppendStats {
    pub series: usize,
    pub samples: usize,
    pub fast_appends: usize,
    pub full_appends: usize,
    /// Fast appends that failed and were retried through `add`.
    pub fast_append_fallbacks: usize,
}

impl AddAssign for AppendStats {
    fn add_assign(&mut self, rhs: Self) {
        self.series += rhs.series;
        self.samples += rhs.samples;
        self.fast_appends += rhs.fast_appends;
        self.full_appends += rhs.full_appends;
        self.fast_append_fallbacks += rhs.fast_append_fallbacks;
    }
}

/// Appends every sample of `series`, in iterator order. Does not commit.
///
/// On failure the samples appended so far stay in the appender.
pub fn append_series<A, S>(app: &mut A, series: &S) -> TsdbResult<AppendStats>
where
    A: Appender + ?Sized,
    S: Series + ?Sized,
{
    let labels = series.labels();
    let mut stats = AppendStats {
        series: 1,
        ..Default::default()
    };
    let mut series_ref = SeriesRef::NONE;
    let mut it = series.iterator();
    while it.advance() {
        let Some(sample) = it.current() else {
            break;
        };
        let (t, v) = (sample.timestamp, sample.value);
        stats.samples += 1;

        if !series_ref.is_none() {
            match app.add_fast(series_ref, t, v) {
                Ok(()) => {
                    stats.fast_appends += 1;
                    continue;
                }
                Err(e) => {
                    debug!("fast append for {} @ {} failed, falling back: {}", labels, t, e);
                    stats.fast_append_fallbacks += 1;
                }
            }
        }

        series_ref = app.add(labels, t, v).map_err(|e| TsdbError::Append {
            series: labels.to_string(),
            timestamp: t,
            source: Box::new(e),
        })?;
        stats.full_appends += 1;
    }

    if let Some(e) = it.error() {
        return Err(TsdbError::General(format!("iterating {}: {}", labels, e)));
    }
    Ok(stats)
}

/// Appends all series, then commits once.
///
/// An append failure is returned without committing or rolling back; the caller decides what to
/// do with the appender. A commit failure is returned as [`TsdbError::Commit`].
pub fn ingest<A, S>(app: &mut A, series: &[S]) -> TsdbResult<AppendStats>
where
    A: Appender + ?Sized,
    S: Series,
{
    let mut stats = AppendStats::default();
    for s in series {
        stats += append_series(app, s)?;
    }
    app.commit().map_err(|e| TsdbError::Commit(Box::new(e)))?;
    debug!(
        "ingested {} series, {} samples ({} fast, {} full)",
        stats.series, stats.samples, stats.fast_appends, stats.full_appends
    );
    Ok(stats)
}
