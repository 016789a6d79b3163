//! Observed min/max bounds for every range filter.

use super::key::FilterKey;
use crate::Result;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Bounds used for a range key the screener has not reported.
pub const DEFAULT_BOUNDS: Bounds = Bounds {
    low: 1.0,
    high: 100.0,
};

/// The `[low, high]` extent of a metric across the screenable universe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Bounds {
    pub low: f64,
    pub high: f64,
}

impl Bounds {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Widen to include `value`.
    pub fn include(&mut self, value: f64) {
        self.low = self.low.min(value);
        self.high = self.high.max(value);
    }
}

impl Default for Bounds {
    fn default() -> Self {
        DEFAULT_BOUNDS
    }
}

impl From<[f64; 2]> for Bounds {
    fn from([low, high]: [f64; 2]) -> Self {
        Self { low, high }
    }
}

impl From<Bounds> for [f64; 2] {
    fn from(bounds: Bounds) -> Self {
        [bounds.low, bounds.high]
    }
}

/// Current bounds per range filter, fetched once per screener session.
///
/// Only range keys are stored; anything else is ignored on insert and load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScreenerRanges {
    bounds: BTreeMap<FilterKey, Bounds>,
}

impl ScreenerRanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds for `key`, or [`DEFAULT_BOUNDS`] when none are known.
    pub fn get(&self, key: FilterKey) -> Bounds {
        self.bounds.get(&key).copied().unwrap_or_default()
    }

    /// Whether bounds were reported for `key`.
    pub fn contains(&self, key: FilterKey) -> bool {
        self.bounds.contains_key(&key)
    }

    /// Set the bounds for a range key. Non-range keys are ignored.
    pub fn insert(&mut self, key: FilterKey, bounds: Bounds) {
        if key.is_range() {
            self.bounds.insert(key, bounds);
        } else {
            tracing::warn!("Ignoring bounds for non-range filter {}", key);
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: FilterKey, low: f64, high: f64) -> Self {
        self.insert(key, Bounds::new(low, high));
        self
    }

    /// Widen the bounds of `key` to cover an observed data point.
    ///
    /// The first observation for a key sets both bounds to that value.
    pub fn observe(&mut self, key: FilterKey, value: f64) {
        if !key.is_range() || !value.is_finite() {
            return;
        }
        self.bounds
            .entry(key)
            .and_modify(|b| b.include(value))
            .or_insert_with(|| Bounds::new(value, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, Bounds)> + '_ {
        self.bounds.iter().map(|(k, b)| (*k, *b))
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Load ranges from a JSON file shaped like `{"priceRange": [1, 500]}`.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl<'de> Deserialize<'de> for ScreenerRanges {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, Bounds>::deserialize(deserializer)?;
        let mut ranges = ScreenerRanges::new();
        for (name, bounds) in raw {
            match name.parse::<FilterKey>() {
                Ok(key) => ranges.insert(key, bounds),
                Err(e) => tracing::warn!("Ignoring screener range: {}", e),
            }
        }
        Ok(ranges)
    }
}

impl FromIterator<(FilterKey, Bounds)> for ScreenerRanges {
    fn from_iter<I: IntoIterator<Item = (FilterKey, Bounds)>>(iter: I) -> Self {
        let mut ranges = ScreenerRanges::new();
        for (key, bounds) in iter {
            ranges.insert(key, bounds);
        }
        ranges
    }
}
