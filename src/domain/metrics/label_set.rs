//! Canonical label identity for a time series.

use std::collections::BTreeMap;
use std::fmt;

/// Label assignment for one series.
///
/// Backed by a `BTreeMap`, so keys are always held in lexicographic order: two label
/// sets built from the same pairs in any order compare, hash and render identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a label set from `(name, value)` pairs. A repeated name keeps the last value.
    pub fn from_pairs<K, V>(pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self(
            pairs
                .iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
                .collect(),
        )
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label names in canonical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical series key: `name=value` pairs sorted by name, comma separated.
    ///
    /// `\`, `,` and `=` inside values are backslash-escaped so distinct label sets never
    /// collide on the same key.
    pub fn series_key(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, escape_key_value(v)))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Copy of this label set with one extra label, used for `le` and `quantile`.
    pub fn with(&self, name: &str, value: impl Into<String>) -> Self {
        let mut labels = self.clone();
        labels.insert(name, value);
        labels
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.series_key())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn escape_key_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ',' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
