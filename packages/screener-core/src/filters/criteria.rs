//! Criteria leaves of a filter group.

use super::key::FilterKey;
use super::value::{FilterValue, RangeValue};
use crate::{Error, Result};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A set of filter values combined into one leaf.
///
/// Keys this build does not recognise, and known keys whose value has the
/// wrong shape, are kept verbatim in `unrecognized` and written back out
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    values: BTreeMap<FilterKey, FilterValue>,
    unrecognized: BTreeMap<String, Value>,
}

impl FilterCriteria {
    /// Create an empty criteria leaf.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a filter. The value must be the shape the key carries.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: FilterKey, value: FilterValue) -> Result<Option<FilterValue>> {
        if !value.fits(key) {
            return Err(Error::InvalidFilterValue {
                key: key.as_str().to_string(),
                reason: format!("a {:?} value cannot be stored here", value.kind()),
            });
        }
        self.unrecognized.remove(key.as_str());
        Ok(self.values.insert(key, value))
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: FilterKey, value: FilterValue) -> Result<Self> {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Set a concrete `[min, max]` range filter.
    pub fn with_range(self, key: FilterKey, min: f64, max: f64) -> Result<Self> {
        self.with(key, FilterValue::Range(RangeValue::new(min, max)))
    }

    pub fn get(&self, key: FilterKey) -> Option<&FilterValue> {
        self.values.get(&key)
    }

    /// The range stored under `key`, if it is a range filter.
    pub fn range(&self, key: FilterKey) -> Option<&RangeValue> {
        match self.values.get(&key) {
            Some(FilterValue::Range(range)) => Some(range),
            _ => None,
        }
    }

    pub fn remove(&mut self, key: FilterKey) -> Option<FilterValue> {
        self.unrecognized.remove(key.as_str());
        self.values.remove(&key)
    }

    pub fn contains(&self, key: FilterKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Iterate recognised filters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, &FilterValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Raw entries kept from the payload: unknown keys, and known keys whose
    /// value could not be read.
    pub fn unrecognized(&self) -> &BTreeMap<String, Value> {
        &self.unrecognized
    }

    /// Number of filters set, recognised or not.
    pub fn len(&self) -> usize {
        self.values.len() + self.unrecognized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy this leaf with every range value rewritten by `f`.
    ///
    /// All other values, and unrecognised keys, are copied as-is.
    pub fn map_ranges<F>(&self, mut f: F) -> FilterCriteria
    where
        F: FnMut(FilterKey, &RangeValue) -> RangeValue,
    {
        let values = self
            .values
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    FilterValue::Range(range) => FilterValue::Range(f(*key, range)),
                    other => other.clone(),
                };
                (*key, value)
            })
            .collect();

        FilterCriteria {
            values,
            unrecognized: self.unrecognized.clone(),
        }
    }

    /// Number of filters in this leaf that restrict the screen.
    pub fn active_count(&self) -> usize {
        let known = self.values.values().filter(|v| v.is_active()).count();
        let unknown = self
            .unrecognized
            .values()
            .filter(|v| raw_value_is_active(v))
            .count();
        known + unknown
    }
}

/// Activity rules applied to a value this build cannot type.
fn raw_value_is_active(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) if map.contains_key("include") || map.contains_key("exclude") => {
            let non_empty = |name: &str| {
                map.get(name)
                    .and_then(Value::as_array)
                    .map(|a| !a.is_empty())
                    .unwrap_or(false)
            };
            non_empty("include") || non_empty("exclude")
        }
        _ => true,
    }
}

impl Serialize for FilterCriteria {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in &self.values {
            map.serialize_entry(key.as_str(), value)?;
        }
        for (key, value) in &self.unrecognized {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterCriteria {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        Ok(FilterCriteria::from(raw))
    }
}

impl From<Map<String, Value>> for FilterCriteria {
    fn from(raw: Map<String, Value>) -> Self {
        let mut criteria = FilterCriteria::new();
        for (name, value) in raw {
            let Ok(key) = name.parse::<FilterKey>() else {
                tracing::trace!("Keeping unrecognized filter key: {}", name);
                criteria.unrecognized.insert(name, value);
                continue;
            };
            match FilterValue::from_json(key, value.clone()) {
                Ok(Some(parsed)) => {
                    criteria.values.insert(key, parsed);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Keeping malformed filter value as-is: {}", e);
                    criteria.unrecognized.insert(name, value);
                }
            }
        }
        criteria
    }
}
