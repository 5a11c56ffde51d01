use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_LABEL_NAME: &str = "labelName";
pub const DEFAULT_LABEL_VALUE: &str = "labelValue";
pub const DEFAULT_TEMP_DIR_PREFIX: &str = "test";

/// Default head chunk range: two hours in milliseconds.
pub const DEFAULT_CHUNK_RANGE: i64 = 2 * 60 * 60 * 1000;
pub const DEFAULT_BLOCK_RANGE: i64 = 1_000_000;

pub const SEED_ENV: &str = "TSDB_TESTUTIL_SEED";
pub const TEMP_DIR_PREFIX_ENV: &str = "TSDB_TESTUTIL_TMP_PREFIX";
pub const CHUNK_RANGE_ENV: &str = "TSDB_TESTUTIL_CHUNK_RANGE";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Name of the label carrying the series index in generated fixtures.
    /// Filler labels are named by appending a position to it.
    pub default_label_name: String,
    /// Value prefix of the filler labels in generated fixtures.
    pub default_label_value: String,
    /// Prefix of the temporary directories created for test databases.
    pub temp_dir_prefix: String,
    /// Time span covered by the head of a test database.
    pub chunk_range: i64,
    /// Block ranges handed to the compactor.
    pub block_ranges: Vec<i64>,
    /// Seeds sample values of generated fixtures. Unseeded values differ from run to run.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_label_name: DEFAULT_LABEL_NAME.to_string(),
            default_label_value: DEFAULT_LABEL_VALUE.to_string(),
            temp_dir_prefix: DEFAULT_TEMP_DIR_PREFIX.to_string(),
            chunk_range: DEFAULT_CHUNK_RANGE,
            block_ranges: vec![DEFAULT_BLOCK_RANGE],
            seed: None,
        }
    }
}

impl Settings {
    /// Defaults, overridden by any of the environment variables that parse.
    pub fn from_env() -> Self {
        let mut res = Self::default();
        if let Some(seed) = get_setting_from_env::<u64>(SEED_ENV) {
            res.seed = Some(seed);
        }
        if let Some(prefix) = get_setting_from_env::<String>(TEMP_DIR_PREFIX_ENV) {
            if !prefix.is_empty() {
                res.temp_dir_prefix = prefix;
            }
        }
        if let Some(chunk_range) = get_setting_from_env::<i64>(CHUNK_RANGE_ENV) {
            if chunk_range > 0 {
                res.chunk_range = chunk_range;
            }
        }
        res
    }
}

static GLOBAL_SETTINGS: OnceLock<Settings> = OnceLock::new();

pub fn get_global_settings() -> &'static Settings {
    GLOBAL_SETTINGS.get_or_init(Settings::from_env)
}

fn get_setting_from_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
}
