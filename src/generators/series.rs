use std::ops::Range;
use crate::common::labels::{Label, Labels};
use crate::common::types::{Sample, Timestamp};
use crate::config::{get_global_settings, DEFAULT_LABEL_NAME, DEFAULT_LABEL_VALUE};
use crate::error::TsdbResult;
use crate::generators::{value_generator, RandAlgo};
use crate::series::SeriesFixture;

/// GeneratorOptions contains the parameters for generating a batch of series fixtures.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Number of series to generate.
    pub total_series: usize,
    /// Number of distinct label names on each series.
    pub label_count: usize,
    /// First sample timestamp (inclusive).
    pub min_time: Timestamp,
    /// End of the sample timestamps (exclusive).
    pub max_time: Timestamp,
    /// Name of the label holding the series index. Filler labels append their position to it.
    pub label_name: String,
    /// Value prefix of the filler labels.
    pub label_value: String,
    /// Range of values.
    pub range: Range<f64>,
    /// Seed for random number generator.
    pub seed: Option<u64>,
    /// Type of random number generator.
    pub typ: RandAlgo,
}

impl GeneratorOptions {
    pub fn new(total_series: usize, label_count: usize, min_time: Timestamp, max_time: Timestamp) -> Self {
        Self {
            total_series,
            label_count,
            min_time,
            max_time,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of samples each generated series will hold, saturating at `usize::MAX`.
    pub fn samples_per_series(&self) -> usize {
        if self.max_time <= self.min_time {
            return 0;
        }
        usize::try_from(self.max_time.abs_diff(self.min_time)).unwrap_or(usize::MAX)
    }
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        let settings = get_global_settings();
        Self {
            total_series: 0,
            label_count: 0,
            min_time: 0,
            max_time: 0,
            label_name: settings.default_label_name.clone(),
            label_value: settings.default_label_value.clone(),
            range: 0.0..1.0,
            seed: settings.seed,
            typ: RandAlgo::Rand,
        }
    }
}

/// Builds the label set of series `index`: `name="<index>"` plus filler labels
/// `name<j>="<value><j>"` for `j = 1..count`, so the result has exactly `count` names
/// (none when `count` is zero). Depends on nothing but its arguments.
pub fn label_set(name: &str, value: &str, index: usize, count: usize) -> Labels {
    if count == 0 {
        return Labels::default();
    }
    let mut labels = Vec::with_capacity(count);
    labels.push(Label::new(name, index.to_string()));
    for j in 1..count {
        labels.push(Label::new(format!("{name}{j}"), format!("{value}{j}")));
    }
    Labels::from_map(labels.into_iter().map(|l| (l.name, l.value)))
}

/// Labels of series `index` with the default label names.
pub fn series_labels(index: usize, count: usize) -> Labels {
    label_set(DEFAULT_LABEL_NAME, DEFAULT_LABEL_VALUE, index, count)
}

/// Generates `total_series` series with `label_count` labels each and one sample per
/// timestamp in `[min_time, max_time)`. Sample values are uniform in `[0, 1)`.
///
/// # Panics
///
/// If no random number generator can be created; use [`gen_series_with`] to handle that.
pub fn gen_series(total_series: usize, label_count: usize, min_time: Timestamp, max_time: Timestamp) -> Vec<SeriesFixture> {
    let options = GeneratorOptions::new(total_series, label_count, min_time, max_time);
    gen_series_with(&options).unwrap_or_else(|e| panic!("generating series fixtures: {}", e))
}

/// Generates series according to `options`. Fails only on an invalid value range.
pub fn gen_series_with(options: &GeneratorOptions) -> TsdbResult<Vec<SeriesFixture>> {
    if options.total_series == 0 || options.label_count == 0 {
        return Ok(vec![]);
    }

    let mut values = value_generator(options.typ, options.seed, &options.range)?;
    // capacity is only a hint; huge ranges grow as they are filled
    let sample_count = options.samples_per_series().min(1 << 16);

    let mut series = Vec::with_capacity(options.total_series);
    for i in 0..options.total_series {
        let labels = label_set(&options.label_name, &options.label_value, i, options.label_count);
        let mut samples = Vec::with_capacity(sample_count);
        for (t, v) in (options.min_time..options.max_time).zip(values.by_ref()) {
            samples.push(Sample::new(t, v));
        }
        series.push(SeriesFixture::new_unchecked(labels, samples));
    }
    Ok(series)
}
