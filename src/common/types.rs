use std::cmp::Ordering;
use std::fmt::Display;
use serde::{Deserialize, Serialize};

pub type Timestamp = i64;

/// A single timestamp/value pair.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: Timestamp,
    #[serde(with = "sample_value")]
    pub value: f64,
}

/// Serde representation of sample values. Finite values are plain numbers. JSON has no
/// non-finite numbers, so infinities are written as `"+Inf"`/`"-Inf"`, the canonical NaN as
/// `"NaN"` and any other NaN as its bit pattern (`"0x7ff0000000000002"` for a staleness marker).
mod sample_value {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    const POS_INF: &str = "+Inf";
    const NEG_INF: &str = "-Inf";
    const NAN: &str = "NaN";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        let v = *value;
        if v.is_finite() {
            serializer.serialize_f64(v)
        } else if v.is_nan() {
            if v.to_bits() == f64::NAN.to_bits() {
                serializer.serialize_str(NAN)
            } else {
                serializer.serialize_str(&format!("{:#018x}", v.to_bits()))
            }
        } else if v > 0.0 {
            serializer.serialize_str(POS_INF)
        } else {
            serializer.serialize_str(NEG_INF)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(s) => match s.as_str() {
                POS_INF => Ok(f64::INFINITY),
                NEG_INF => Ok(f64::NEG_INFINITY),
                NAN => Ok(f64::NAN),
                _ => s
                    .strip_prefix("0x")
                    .and_then(|hex| u64::from_str_radix(hex, 16).ok())
                    .map(f64::from_bits)
                    .filter(|v| v.is_nan())
                    .ok_or_else(|| D::Error::custom(format!("invalid sample value {:?}", s))),
            },
        }
    }
}

impl Sample {
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Sample { timestamp, value }
    }
}

impl Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.value, self.timestamp)
    }
}

/// Samples order by timestamp only. Values do not take part in ordering.
impl PartialOrd for Sample {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.timestamp.cmp(&other.timestamp))
    }
}

impl From<(Timestamp, f64)> for Sample {
    fn from((timestamp, value): (Timestamp, f64)) -> Self {
        Sample { timestamp, value }
    }
}

pub trait SampleLike {
    fn timestamp(&self) -> Timestamp;
    fn value(&self) -> f64;
}

impl SampleLike for Sample {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
    fn value(&self) -> f64 {
        self.value
    }
}

/// Returns true if timestamps never decrease. Equal timestamps are allowed.
pub fn is_time_ordered<S: SampleLike>(samples: &[S]) -> bool {
    samples
        .windows(2)
        .all(|w| w[0].timestamp() <= w[1].timestamp())
}
