use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use crate::config::get_global_settings;
use crate::error::{TsdbError, TsdbResult};
use crate::storage::block::{Block, META_FILENAME};
use crate::storage::compactor::LeveledCompactor;
use crate::storage::head::{Head, HeadAppender, HeadOptions};

pub const LOCK_FILENAME: &str = "lock";

#[derive(Debug, Clone)]
pub struct DbOptions {
    /// Block ranges of the compactor. Must be non-empty and positive; no block may span more
    /// than the largest one.
    pub block_ranges: Vec<i64>,
    /// Time span of the head.
    pub chunk_range: i64,
    /// Do not create a lock file in the database directory.
    pub no_lockfile: bool,
}

impl Default for DbOptions {
    fn default() -> Self {
        let settings = get_global_settings();
        Self {
            block_ranges: settings.block_ranges.clone(),
            chunk_range: settings.chunk_range,
            no_lockfile: false,
        }
    }
}

/// A database rooted at a directory: a mutable head plus the blocks found in the directory.
#[derive(Debug)]
pub struct Db {
    dir: PathBuf,
    options: DbOptions,
    head: Head,
    compactor: LeveledCompactor,
    locked: bool,
}

impl Db {
    pub fn open(dir: &Path, options: Option<DbOptions>) -> TsdbResult<Self> {
        let options = options.unwrap_or_default();
        let compactor = LeveledCompactor::new(options.block_ranges.clone())?;
        fs::create_dir_all(dir).map_err(|e| TsdbError::filesystem(dir, e))?;

        let head = Head::new(HeadOptions {
            chunk_range: options.chunk_range,
        })?;

        let locked = !options.no_lockfile;
        if locked {
            let lock = dir.join(LOCK_FILENAME);
            if lock.exists() {
                // left behind by an instance that was never closed
                warn!("lock file {} already exists", lock.display());
            }
            fs::write(&lock, std::process::id().to_string())
                .map_err(|e| TsdbError::filesystem(&lock, e))?;
        }

        info!("opened db at {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            options,
            head,
            compactor,
            locked,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn options(&self) -> &DbOptions {
        &self.options
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    /// Compactor configured with this database's block ranges.
    pub fn compactor(&self) -> &LeveledCompactor {
        &self.compactor
    }

    pub fn appender(&mut self) -> HeadAppender<'_> {
        self.head.appender()
    }

    /// Opens every block directory under the database root, ordered by min time.
    pub fn blocks(&self) -> TsdbResult<Vec<Block>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| TsdbError::filesystem(&self.dir, e))?;
        let mut blocks = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TsdbError::filesystem(&self.dir, e))?;
            let path = entry.path();
            if path.is_dir() && path.join(META_FILENAME).exists() {
                blocks.push(Block::open(&path)?);
            }
        }
        blocks.sort_by_key(|b| b.meta().min_time);
        Ok(blocks)
    }

    /// Releases the lock file. The directory and its blocks stay in place.
    pub fn close(self) -> TsdbResult<()> {
        if self.locked {
            let lock = self.dir.join(LOCK_FILENAME);
            fs::remove_file(&lock).map_err(|e| TsdbError::filesystem(&lock, e))?;
        }
        info!("closed db at {}", self.dir.display());
        Ok(())
    }
}
