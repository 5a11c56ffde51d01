//! Test support for a time series store: deterministic series fixtures, an ingestion path that
//! exercises both the reference-based and the label-keyed append, a forward-only seekable sample
//! cursor, and helpers to open throwaway databases and write blocks.

pub mod common;
pub mod config;
pub mod error;
pub mod generators;
pub mod harness;
pub mod ingest;
pub mod iter;
pub mod series;
pub mod storage;


pub use common::{Label, Labels, Sample, Timestamp};
pub use error::{TsdbError, TsdbResult};
pub use generators::{gen_series, gen_series_with, series_labels, GeneratorOptions, RandAlgo};
pub use harness::{create_block, create_head, open_test_db, Cleanup};
pub use ingest::{append_series, ingest, AppendStats};
pub use iter::{BoxedSeriesIterator, ListSeriesIterator, SeriesIterator};
pub use series::{Series, SeriesFixture};
