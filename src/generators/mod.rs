mod rand;
mod series;

use ::rand::prelude::*;
use crate::error::{TsdbError, TsdbResult};

pub use self::rand::*;
pub use series::*;

pub fn create_rng(seed: Option<u64>) -> TsdbResult<StdRng> {
    if let Some(seed) = seed {
        Ok(StdRng::seed_from_u64(seed))
    } else {
        StdRng::from_rng(thread_rng())
            .map_err(|e| TsdbError::Construction(format!("Error constructing rng {:?}", e)))
    }
}
