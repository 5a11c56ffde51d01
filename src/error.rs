use std::io;
use std::path::PathBuf;
use thiserror::Error;
use crate::common::types::Timestamp;

#[derive(Debug, Error)]
/// Enum for the errors surfaced by fixture generation, ingestion and block creation.
pub enum TsdbError {
  #[error("Invalid generator parameters. {0}")]
  Construction(String),

  #[error("Append failed for series {series} @ {timestamp}: {source}")]
  Append {
    series: String,
    timestamp: Timestamp,
    #[source]
    source: Box<TsdbError>,
  },

  #[error("Commit failed: {0}")]
  Commit(#[source] Box<TsdbError>),

  #[error("Compaction failed. {0}")]
  Compaction(String),

  #[error("Filesystem error at {path:?}: {source}")]
  Filesystem {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Out of order sample")]
  OutOfOrderSample,

  #[error("Out of bounds")]
  OutOfBounds,

  #[error("Series not found. ref={0}")]
  SeriesNotFound(u64),

  #[error("Invalid labels. {0}")]
  InvalidLabels(String),

  #[error("Invalid configuration. {0}")]
  InvalidConfiguration(String),

  #[error("Serialization error. {0}")]
  CannotSerialize(String),

  #[error("Cannot deserialize. {0}")]
  CannotDeserialize(String),

  #[error("{0}")]
  General(String)
}

impl TsdbError {
  pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
    TsdbError::Filesystem {
      path: path.into(),
      source,
    }
  }
}

pub type TsdbResult<T> = Result<T, TsdbError>;
