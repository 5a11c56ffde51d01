use std::collections::BTreeMap;
use std::fmt::Display;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;
use crate::error::{TsdbError, TsdbResult};

const SEPS: u8 = b'\xff';

/// Label is a key/value pair of strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Label {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A set of labels with unique names. Labels are always kept sorted by name, so equality,
/// hashing, formatting and serialization do not depend on construction order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Label>", into = "Vec<Label>")]
pub struct Labels(Vec<Label>);

impl Labels {
    /// Builds a label set from arbitrary labels. Fails if a name occurs more than once.
    pub fn new(labels: Vec<Label>) -> TsdbResult<Self> {
        let mut labels = labels;
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(w) = labels.windows(2).find(|w| w[0].name == w[1].name) {
            let msg = format!("duplicate label name \"{}\"", w[0].name);
            return Err(TsdbError::InvalidLabels(msg));
        }
        Ok(Labels(labels))
    }

    /// Builds a label set from a name -> value mapping.
    pub fn from_map<I, K, V>(map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        // a later value for the same name replaces an earlier one, as with a map
        let map: BTreeMap<String, String> = map
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Labels(map.into_iter().map(|(name, value)| Label { name, value }).collect())
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::from_map(pairs.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// returns the value for the label with the given name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .binary_search_by(|l| l.name.as_str().cmp(name))
            .ok()
            .map(|idx| self.0[idx].value.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Label] {
        &self.0
    }

    /// Returns a stable hash of the canonical name/value sequence.
    pub fn hash_value(&self) -> u64 {
        let mut hasher = Xxh3::new();
        for label in &self.0 {
            hasher.update(label.name.as_bytes());
            hasher.update(&[SEPS]);
            hasher.update(label.value.as_bytes());
            hasher.update(&[SEPS]);
        }
        hasher.digest()
    }

    /// Checks the set is usable as a series identity: non-empty, with no empty names.
    pub fn validate(&self) -> TsdbResult<()> {
        if self.is_empty() {
            return Err(TsdbError::InvalidLabels("empty label set".to_string()));
        }
        if self.0.iter().any(|l| l.name.is_empty()) {
            let msg = format!("empty label name in {}", self);
            return Err(TsdbError::InvalidLabels(msg));
        }
        Ok(())
    }
}

impl Display for Labels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:?}", label.name, label.value)?;
        }
        write!(f, "}}")
    }
}

impl TryFrom<Vec<Label>> for Labels {
    type Error = TsdbError;

    fn try_from(value: Vec<Label>) -> Result<Self, Self::Error> {
        Labels::new(value)
    }
}

impl From<Labels> for Vec<Label> {
    fn from(value: Labels) -> Self {
        value.0
    }
}

impl<'a> IntoIterator for &'a Labels {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
