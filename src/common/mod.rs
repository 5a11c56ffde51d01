pub mod labels;
pub mod types;

pub use labels::*;
pub use types::*;
