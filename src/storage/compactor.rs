use std::fs;
use std::path::Path;
use tracing::info;
use xxhash_rust::xxh3::Xxh3;
use crate::common::types::Timestamp;
use crate::error::{TsdbError, TsdbResult};
use crate::series::{Series, SeriesFixture};
use crate::storage::block::{write_json, BlockId, BlockMeta, BlockMetaCompaction, BlockStats, META_FILENAME, META_VERSION, SERIES_FILENAME};
use crate::storage::head::Head;

/// Flushes the contents of a head into durable blocks.
pub trait Compactor {
    /// Writes every committed head sample with `min_time <= t < max_time` into a new block under
    /// `dest` and returns its id. With a `parent` the block is one level above it and lists the
    /// parent's sources plus itself.
    fn write(
        &self,
        dest: &Path,
        head: &Head,
        min_time: Timestamp,
        max_time: Timestamp,
        parent: Option<&BlockMeta>,
    ) -> TsdbResult<BlockId>;
}

/// Writes head data into blocks. `ranges` are the allowed block spans; a block may not cover
/// more time than the largest of them.
#[derive(Debug, Clone)]
pub struct LeveledCompactor {
    ranges: Vec<i64>,
}

impl LeveledCompactor {
    pub fn new(ranges: Vec<i64>) -> TsdbResult<Self> {
        if ranges.is_empty() {
            return Err(TsdbError::InvalidConfiguration("at least one block range must be provided".to_string()));
        }
        if let Some(r) = ranges.iter().find(|r| **r <= 0) {
            let msg = format!("block ranges must be positive, got {}", r);
            return Err(TsdbError::InvalidConfiguration(msg));
        }
        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[i64] {
        &self.ranges
    }

    pub fn max_range(&self) -> i64 {
        self.ranges.iter().copied().max().unwrap_or_default()
    }
}

fn block_id(min_time: Timestamp, max_time: Timestamp, series: &[SeriesFixture]) -> BlockId {
    let mut hasher = Xxh3::new();
    hasher.update(&min_time.to_le_bytes());
    hasher.update(&max_time.to_le_bytes());
    for s in series {
        hasher.update(&s.labels().hash_value().to_le_bytes());
        for sample in s.samples() {
            hasher.update(&sample.timestamp.to_le_bytes());
            hasher.update(&sample.value.to_bits().to_le_bytes());
        }
    }
    BlockId::from_u128(hasher.digest128())
}

impl Compactor for LeveledCompactor {
    fn write(
        &self,
        dest: &Path,
        head: &Head,
        min_time: Timestamp,
        max_time: Timestamp,
        parent: Option<&BlockMeta>,
    ) -> TsdbResult<BlockId> {
        if min_time >= max_time {
            let msg = format!("empty block time range [{}, {})", min_time, max_time);
            return Err(TsdbError::Compaction(msg));
        }
        let span = max_time.abs_diff(min_time);
        if span > self.max_range().unsigned_abs() {
            let msg = format!(
                "block time range [{}, {}) spans {}, more than the largest block range {}",
                min_time, max_time, span, self.max_range()
            );
            return Err(TsdbError::Compaction(msg));
        }

        let mut series = Vec::with_capacity(head.num_series());
        let mut num_samples = 0u64;
        for s in head.series() {
            let samples = s.samples();
            let start = samples.partition_point(|x| x.timestamp < min_time);
            let end = samples.partition_point(|x| x.timestamp < max_time);
            if start >= end {
                continue;
            }
            num_samples += (end - start) as u64;
            series.push(SeriesFixture::new_unchecked(s.labels().clone(), samples[start..end].to_vec()));
        }
        series.sort_by(|a, b| a.labels().as_slice().cmp(b.labels().as_slice()));

        let id = block_id(min_time, max_time, &series);
        let compaction = match parent {
            Some(p) => {
                let mut sources = p.compaction.sources.clone();
                if !sources.contains(&id) {
                    sources.push(id.clone());
                }
                BlockMetaCompaction {
                    level: p.compaction.level + 1,
                    sources,
                }
            }
            None => BlockMetaCompaction {
                level: 1,
                sources: vec![id.clone()],
            },
        };
        let meta = BlockMeta {
            id: id.clone(),
            min_time,
            max_time,
            stats: BlockStats {
                num_series: series.len() as u64,
                num_samples,
            },
            compaction,
            version: META_VERSION,
        };

        // write into a temporary directory, then move it into place
        let dir = id.dir_in(dest);
        let tmp = dest.join(format!("{}.tmp", id));
        if tmp.exists() {
            fs::remove_dir_all(&tmp).map_err(|e| TsdbError::filesystem(&tmp, e))?;
        }
        fs::create_dir_all(&tmp).map_err(|e| TsdbError::filesystem(&tmp, e))?;
        write_json(&tmp.join(SERIES_FILENAME), &series)?;
        write_json(&tmp.join(META_FILENAME), &meta)?;
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| TsdbError::filesystem(&dir, e))?;
        }
        fs::rename(&tmp, &dir).map_err(|e| TsdbError::filesystem(&dir, e))?;

        info!(
            "write block {}: mint={} maxt={} series={} samples={}",
            id, min_time, max_time, meta.stats.num_series, num_samples
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::labels::Labels;
    use crate::storage::appender::Appender;
    use crate::storage::block::Block;
    use crate::storage::head::HeadOptions;

    fn head_with(samples: &[(&str, Timestamp)]) -> Head {
        let mut head = Head::new(HeadOptions { chunk_range: 10_000 }).unwrap();
        {
            let mut app = head.appender();
            for (job, t) in samples {
                app.add(&Labels::from_pairs(&[("job", job)]), *t, *t as f64).unwrap();
            }
            app.commit().unwrap();
        }
        head
    }

    #[test]
    fn test_new_validates_ranges() {
        assert!(LeveledCompactor::new(vec![]).is_err());
        assert!(LeveledCompactor::new(vec![100, 0]).is_err());
        assert_eq!(LeveledCompactor::new(vec![100]).unwrap().ranges(), &[100]);
    }

    #[test]
    fn test_write_selects_half_open_range() {
        let head = head_with(&[("a", 0), ("a", 1), ("a", 2), ("b", 2), ("c", 3)]);
        let dir = tempfile::tempdir().unwrap();
        let compactor = LeveledCompactor::new(vec![1000]).unwrap();

        let id = compactor.write(dir.path(), &head, 1, 3, None).unwrap();
        let block = Block::open(&id.dir_in(dir.path())).unwrap();
        let meta = block.meta();
        assert_eq!(meta.id, id);
        assert_eq!((meta.min_time, meta.max_time), (1, 3));
        assert_eq!(meta.stats.num_series, 2);
        assert_eq!(meta.stats.num_samples, 3);
        assert_eq!(meta.compaction.level, 1);
        assert_eq!(meta.compaction.sources, vec![id.clone()]);

        let a = &block.series()[0];
        assert_eq!(a.labels().get("job"), Some("a"));
        let ts: Vec<Timestamp> = a.samples().iter().map(|s| s.timestamp).collect();
        assert_eq!(ts, vec![1, 2]);
        assert!(!dir.path().join(format!("{}.tmp", id)).exists());
    }

    #[test]
    fn test_write_keeps_parent_lineage() {
        let head = head_with(&[("a", 0)]);
        let dir = tempfile::tempdir().unwrap();
        let compactor = LeveledCompactor::new(vec![1000]).unwrap();
        let first = compactor.write(dir.path(), &head, 0, 1, None).unwrap();
        let parent = Block::read_meta(&first.dir_in(dir.path())).unwrap();

        let head = head_with(&[("a", 5)]);
        let second = compactor.write(dir.path(), &head, 5, 6, Some(&parent)).unwrap();
        let meta = Block::read_meta(&second.dir_in(dir.path())).unwrap();
        assert_eq!(meta.compaction.level, 2);
        assert_eq!(meta.compaction.sources, vec![first.clone(), second.clone()]);

        let third = compactor.write(dir.path(), &head, 5, 7, Some(&meta)).unwrap();
        let meta = Block::read_meta(&third.dir_in(dir.path())).unwrap();
        assert_eq!(meta.compaction.level, 3);
        assert_eq!(meta.compaction.sources, vec![first, second, third]);
    }

    #[test]
    fn test_write_rejects_range_wider_than_blocks() {
        let head = head_with(&[("a", 0), ("a", 150)]);
        let dir = tempfile::tempdir().unwrap();
        let compactor = LeveledCompactor::new(vec![20, 100]).unwrap();
        assert_eq!(compactor.max_range(), 100);

        compactor.write(dir.path(), &head, 0, 100, None).unwrap();
        let err = compactor.write(dir.path(), &head, 0, 151, None).unwrap_err();
        assert!(matches!(err, TsdbError::Compaction(_)));
        // extreme bounds do not overflow
        let err = compactor.write(dir.path(), &head, i64::MIN, i64::MAX, None).unwrap_err();
        assert!(matches!(err, TsdbError::Compaction(_)));
    }

    #[test]
    fn test_write_rejects_empty_range() {
        let head = head_with(&[("a", 0)]);
        let dir = tempfile::tempdir().unwrap();
        let compactor = LeveledCompactor::new(vec![1000]).unwrap();
        let err = compactor.write(dir.path(), &head, 5, 5, None).unwrap_err();
        assert!(matches!(err, TsdbError::Compaction(_)));
    }
}
