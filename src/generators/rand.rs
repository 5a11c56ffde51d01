use std::ops::Range;
use rand::distributions::Uniform;
use rand::prelude::StdRng;
use rand::Rng;
use rand_distr::Distribution;
use rand_distr::StandardNormal;
use crate::error::{TsdbError, TsdbResult};
use crate::generators::create_rng;

/// Algorithm used to draw sample values.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum RandAlgo {
    /// Uniformly distributed over the range.
    #[default]
    Rand,
    /// Normally distributed around the middle of the range.
    Norm,
    /// A bounded random walk, so neighbouring samples stay close.
    Deriv,
}

pub(crate) fn validate_range(range: &Range<f64>) -> TsdbResult<()> {
    if !range.start.is_finite() || !range.end.is_finite() || range.start >= range.end {
        let msg = format!("invalid value range {:?}", range);
        return Err(TsdbError::Construction(msg));
    }
    Ok(())
}

pub struct UniformGenerator {
    rng: StdRng,
    uniform: Uniform<f64>
}

impl UniformGenerator {
    pub fn new(seed: Option<u64>, range: &Range<f64>) -> TsdbResult<Self> {
        validate_range(range)?;
        let rng = create_rng(seed)?;
        let uniform = Uniform::new(range.start, range.end);
        Ok(Self {
            rng,
            uniform,
        })
    }
}

impl Iterator for UniformGenerator {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.uniform.sample(&mut self.rng))
    }
}

pub struct StdNormalGenerator {
    rng: StdRng,
    range: Range<f64>,
}

impl StdNormalGenerator {
    pub fn new(seed: Option<u64>, range: &Range<f64>) -> TsdbResult<Self> {
        validate_range(range)?;
        let rng = create_rng(seed)?;
        Ok(Self {
            rng,
            range: range.clone(),
        })
    }
}

impl Iterator for StdNormalGenerator {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        let mid = (self.range.start + self.range.end) / 2.0;
        // six standard deviations span the range; redraw the rare tails
        let sigma = (self.range.end - self.range.start) / 6.0;
        loop {
            let m = self.rng.sample::<f64, _>(StandardNormal);
            let v = mid + m * sigma;
            if self.range.contains(&v) {
                return Some(v);
            }
        }
    }
}

pub struct DerivativeGenerator {
    last: f64,
    rng: StdRng,
    range: Range<f64>,
    uniform: Uniform<f64>,
}

impl DerivativeGenerator {
    pub fn new(seed: Option<u64>, range: &Range<f64>) -> TsdbResult<Self> {
        validate_range(range)?;
        let mut rng = create_rng(seed)?;
        let uniform = Uniform::new(range.start, range.end);
        let last = uniform.sample(&mut rng);
        Ok(Self {
            last,
            rng,
            range: range.clone(),
            uniform,
        })
    }
}

impl Iterator for DerivativeGenerator {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        let width = self.range.end - self.range.start;
        let step = (self.rng.gen::<f64>() - 0.5) * width * 0.1;
        let mut v = self.last + step;
        // reflect off the bounds
        if v < self.range.start {
            v = self.range.start + (self.range.start - v);
        } else if v >= self.range.end {
            v = self.range.end - (v - self.range.end);
        }
        if !self.range.contains(&v) {
            v = self.uniform.sample(&mut self.rng);
        }
        self.last = v;
        Some(v)
    }
}

/// Returns an endless source of values drawn with the given algorithm.
pub fn value_generator(
    typ: RandAlgo,
    seed: Option<u64>,
    range: &Range<f64>,
) -> TsdbResult<Box<dyn Iterator<Item = f64>>> {
    Ok(match typ {
        RandAlgo::Rand => Box::new(UniformGenerator::new(seed, range)?),
        RandAlgo::Norm => Box::new(StdNormalGenerator::new(seed, range)?),
        RandAlgo::Deriv => Box::new(DerivativeGenerator::new(seed, range)?),
    })
}

#[cfg(test)]
mod tests {
    use std::ops::Range;
    use test_case::test_case;
    use super::*;

    fn check_range(iter: impl Iterator<Item=f64>, r: &Range<f64>) {
        let values = iter.take(1000).collect::<Vec<f64>>();
        for v in values {
            assert!(v >= r.start && v < r.end, "value {} not in range {:?}", v, r);
        }
    }

    #[test_case(RandAlgo::Rand ; "uniform")]
    #[test_case(RandAlgo::Norm ; "normal")]
    #[test_case(RandAlgo::Deriv ; "derivative")]
    fn test_values_stay_in_range(typ: RandAlgo) {
        let r = 1.0..99.0;
        let iter = value_generator(typ, None, &r).unwrap();
        check_range(iter, &r);
    }

    #[test_case(RandAlgo::Rand ; "uniform")]
    #[test_case(RandAlgo::Norm ; "normal")]
    #[test_case(RandAlgo::Deriv ; "derivative")]
    fn test_seeded_is_reproducible(typ: RandAlgo) {
        let r = 0.0..1.0;
        let a: Vec<f64> = value_generator(typ, Some(42), &r).unwrap().take(50).collect();
        let b: Vec<f64> = value_generator(typ, Some(42), &r).unwrap().take(50).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_range() {
        let err = UniformGenerator::new(None, &(1.0..1.0)).err().unwrap();
        assert!(matches!(err, TsdbError::Construction(_)));
        assert!(StdNormalGenerator::new(None, &(2.0..1.0)).is_err());
        assert!(DerivativeGenerator::new(None, &(0.0..f64::INFINITY)).is_err());
    }
}
