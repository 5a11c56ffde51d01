mod appender;
mod block;
mod compactor;
mod db;
mod head;

pub use appender::*;
pub use block::{Block, BlockId, BlockMeta, BlockMetaCompaction, BlockStats, META_FILENAME, META_VERSION, SERIES_FILENAME};
pub use compactor::*;
pub use db::*;
pub use head::*;
