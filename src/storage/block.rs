use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::common::types::{is_time_ordered, Timestamp};
use crate::error::{TsdbError, TsdbResult};
use crate::series::{Series, SeriesFixture};

pub const META_FILENAME: &str = "meta.json";
pub const SERIES_FILENAME: &str = "series.json";
pub const META_VERSION: u32 = 1;

/// Identifier of a block, also the name of its directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn from_u128(v: u128) -> Self {
        BlockId(format!("{:032x}", v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory of this block under `parent`.
    pub fn dir_in(&self, parent: &Path) -> PathBuf {
        parent.join(&self.0)
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStats {
    pub num_series: u64,
    pub num_samples: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetaCompaction {
    /// Number of compactions the block went through; freshly flushed blocks are level 1.
    pub level: u32,
    pub sources: Vec<BlockId>,
}

/// Block metadata. The block covers the half-open time range `[min_time, max_time)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    pub id: BlockId,
    pub min_time: Timestamp,
    pub max_time: Timestamp,
    pub stats: BlockStats,
    pub compaction: BlockMetaCompaction,
    pub version: u32,
}

impl BlockMeta {
    pub fn contains(&self, t: Timestamp) -> bool {
        self.min_time <= t && t < self.max_time
    }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> TsdbResult<()> {
    let buf = serde_json::to_vec_pretty(value)
        .map_err(|e| TsdbError::CannotSerialize(format!("{}: {}", path.display(), e)))?;
    fs::write(path, buf).map_err(|e| TsdbError::filesystem(path, e))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> TsdbResult<T> {
    let buf = fs::read(path).map_err(|e| TsdbError::filesystem(path, e))?;
    serde_json::from_slice(&buf)
        .map_err(|e| TsdbError::CannotDeserialize(format!("{}: {}", path.display(), e)))
}

/// A block read back from disk.
#[derive(Debug, Clone)]
pub struct Block {
    dir: PathBuf,
    meta: BlockMeta,
    series: Vec<SeriesFixture>,
}

impl Block {
    pub fn open(dir: &Path) -> TsdbResult<Self> {
        let meta: BlockMeta = read_json(&dir.join(META_FILENAME))?;
        if meta.version != META_VERSION {
            let msg = format!("{}: unsupported block version {}", dir.display(), meta.version);
            return Err(TsdbError::CannotDeserialize(msg));
        }
        let series: Vec<SeriesFixture> = read_json(&dir.join(SERIES_FILENAME))?;
        if let Some(bad) = series.iter().find(|s| !is_time_ordered(s.samples())) {
            let msg = format!("{}: samples of {} are out of order", dir.display(), bad.labels());
            return Err(TsdbError::CannotDeserialize(msg));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            meta,
            series,
        })
    }

    /// Reads only the metadata of the block in `dir`.
    pub fn read_meta(dir: &Path) -> TsdbResult<BlockMeta> {
        read_json(&dir.join(META_FILENAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn meta(&self) -> &BlockMeta {
        &self.meta
    }

    pub fn id(&self) -> &BlockId {
        &self.meta.id
    }

    pub fn series(&self) -> &[SeriesFixture] {
        &self.series
    }
}
