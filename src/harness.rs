//! Helpers for tests that need a database on disk or a ready-made block.

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::info;
use crate::config::get_global_settings;
use crate::error::{TsdbError, TsdbResult};
use crate::ingest::ingest;
use crate::series::Series;
use crate::storage::{BlockId, Compactor, Db, DbOptions, Head, HeadOptions, LeveledCompactor};

/// Removes the directory of a test database.
///
/// Dropping it without calling [`Cleanup::cleanup`] removes the directory too, ignoring errors.
#[derive(Debug)]
pub struct Cleanup {
    dir: TempDir,
}

impl Cleanup {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn cleanup(self) -> TsdbResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|e| TsdbError::filesystem(&path, e))?;
        info!("removed test db at {}", path.display());
        Ok(())
    }
}

/// Opens a database in a fresh, uniquely named temporary directory.
///
/// The database is not closed by the returned [`Cleanup`]: closing on a failing test can hang,
/// so cleanup only deletes the files and closing is left to the caller.
pub fn open_test_db(options: Option<DbOptions>) -> TsdbResult<(Db, Cleanup)> {
    let prefix = &get_global_settings().temp_dir_prefix;
    let dir = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .map_err(|e| TsdbError::filesystem(std::env::temp_dir(), e))?;
    let db = Db::open(dir.path(), options)?;
    info!("opened test db at {}", dir.path().display());
    Ok((db, Cleanup { dir }))
}

/// Builds a head holding the committed samples of `series`.
pub fn create_head<S: Series>(series: &[S]) -> TsdbResult<Head> {
    let mut head = Head::new(HeadOptions::default())?;
    {
        let mut app = head.appender();
        ingest(&mut app, series)?;
    }
    Ok(head)
}

/// Writes `series` into a new block under `dir` and returns its id. The block lives in
/// `id.dir_in(dir)`. The samples must fit into the largest configured block range.
pub fn create_block<S: Series>(dir: &Path, series: &[S]) -> TsdbResult<BlockId> {
    let compactor = LeveledCompactor::new(get_global_settings().block_ranges.clone())?;
    create_block_with(&compactor, dir, series)
}

/// Same as [`create_block`], flushing through the given compactor.
pub fn create_block_with<C, S>(compactor: &C, dir: &Path, series: &[S]) -> TsdbResult<BlockId>
where
    C: Compactor + ?Sized,
    S: Series,
{
    let head = create_head(series)?;
    let (Some(min_time), Some(max_time)) = (head.min_time(), head.max_time()) else {
        return Err(TsdbError::Compaction("no samples to write".to_string()));
    };

    fs::create_dir_all(dir).map_err(|e| TsdbError::filesystem(dir, e))?;

    // Block time ranges are half-open [min, max), so the bound is one past the newest sample
    // or that sample would be left out of the block.
    let Some(end) = max_time.checked_add(1) else {
        return Err(TsdbError::Compaction(format!("no block can end after {}", max_time)));
    };
    compactor
        .write(dir, &head, min_time, end, None)
        .map_err(|e| match e {
            TsdbError::Compaction(_) => e,
            other => TsdbError::Compaction(other.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use crate::common::types::Timestamp;
    use crate::common::labels::Labels;
    use crate::common::types::Sample;
    use crate::generators::gen_series;
    use crate::series::SeriesFixture;
    use crate::storage::{Block, BlockMeta};

    #[derive(Default)]
    struct RecordingCompactor {
        calls: RefCell<Vec<(Timestamp, Timestamp)>>,
    }

    impl Compactor for RecordingCompactor {
        fn write(
            &self,
            _dest: &Path,
            _head: &Head,
            min_time: Timestamp,
            max_time: Timestamp,
            _parent: Option<&BlockMeta>,
        ) -> TsdbResult<BlockId> {
            self.calls.borrow_mut().push((min_time, max_time));
            Ok(BlockId::from_u128(7))
        }
    }

    struct FailingCompactor;

    impl Compactor for FailingCompactor {
        fn write(&self, dest: &Path, _: &Head, _: Timestamp, _: Timestamp, _: Option<&BlockMeta>) -> TsdbResult<BlockId> {
            Err(TsdbError::filesystem(dest, std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn test_open_and_cleanup() {
        let (db, cleanup) = open_test_db(None).unwrap();
        let path = cleanup.path().to_path_buf();
        assert_eq!(db.dir(), path.as_path());
        assert!(path.exists());

        cleanup.cleanup().unwrap();
        assert!(!path.exists());
        // the db handle is still usable for in-memory state
        assert!(db.head().is_empty());
    }

    #[test]
    fn test_test_dbs_are_unique() {
        let (_a, ca) = open_test_db(None).unwrap();
        let (_b, cb) = open_test_db(None).unwrap();
        assert_ne!(ca.path(), cb.path());
    }

    #[test]
    fn test_upper_bound_is_max_plus_one() {
        let series = gen_series(2, 1, 3, 9);
        let tmp = tempfile::tempdir().unwrap();
        let compactor = RecordingCompactor::default();
        let id = create_block_with(&compactor, tmp.path(), &series).unwrap();
        assert_eq!(id, BlockId::from_u128(7));
        assert_eq!(compactor.calls.into_inner(), vec![(3, 9)]);
    }

    #[test]
    fn test_block_contains_last_sample() {
        let series = gen_series(1, 2, 0, 10);
        let tmp = tempfile::tempdir().unwrap();
        let id = create_block(tmp.path(), &series).unwrap();
        let block = Block::open(&id.dir_in(tmp.path())).unwrap();
        assert_eq!(block.meta().max_time, 10);
        assert_eq!(block.series()[0].max_time(), Some(9));
        assert_eq!(block.series()[0].samples(), series[0].samples());
    }

    #[test]
    fn test_create_block_without_samples() {
        let tmp = tempfile::tempdir().unwrap();
        let series = gen_series(2, 2, 5, 5);
        let err = create_block(tmp.path(), &series).unwrap_err();
        assert!(matches!(err, TsdbError::Compaction(_)));
    }

    #[test]
    fn test_compactor_failure_is_compaction_error() {
        let tmp = tempfile::tempdir().unwrap();
        let series = gen_series(1, 1, 0, 2);
        let err = create_block_with(&FailingCompactor, tmp.path(), &series).unwrap_err();
        match err {
            TsdbError::Compaction(msg) => assert!(msg.contains("disk full")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_create_block_makes_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("blocks");
        let series = gen_series(1, 1, 0, 2);
        let id = create_block(&dir, &series).unwrap();
        assert!(id.dir_in(&dir).join("meta.json").exists());
    }

    #[test]
    fn test_create_block_wider_than_block_range() {
        let tmp = tempfile::tempdir().unwrap();
        let span = get_global_settings().block_ranges.iter().copied().max().unwrap();
        let samples = vec![Sample::new(0, 1.0), Sample::new(span, 2.0)];
        let series = SeriesFixture::new(Labels::from_pairs(&[("a", "b")]), samples).unwrap();
        let err = create_block(tmp.path(), &[series]).unwrap_err();
        assert!(matches!(err, TsdbError::Compaction(_)));
    }
}
