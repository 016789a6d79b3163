//! Tagged filter values.

use super::key::{FilterKey, FilterKind};
use crate::{Error, Result};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Low-side "unbounded" marker written by older saved screens.
pub const LEGACY_UNBOUNDED_MIN: f64 = -9_007_199_254_740_991.0;

/// High-side "unbounded" marker written by older saved screens.
pub const LEGACY_UNBOUNDED_MAX: f64 = f64::MAX;

/// A `[min, max]` selection on a numeric metric.
///
/// `None` on either side means the side is unbounded. On the wire this is
/// `[min, max]` with `null` for an unbounded side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[Option<f64>; 2]", into = "[Option<f64>; 2]")]
pub struct RangeValue {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RangeValue {
    /// A range with both bounds set.
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// A range with neither bound set.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// True when both sides are set.
    pub fn is_bounded(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }
}

impl From<[Option<f64>; 2]> for RangeValue {
    fn from([min, max]: [Option<f64>; 2]) -> Self {
        Self {
            min: min.filter(|v| *v > LEGACY_UNBOUNDED_MIN),
            max: max.filter(|v| *v < LEGACY_UNBOUNDED_MAX),
        }
    }
}

impl From<RangeValue> for [Option<f64>; 2] {
    fn from(range: RangeValue) -> Self {
        [range.min, range.max]
    }
}

/// Include/exclude lists over a categorical dimension (sector, industry, country).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InclusionExclusion {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl InclusionExclusion {
    pub fn including<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: values.into_iter().map(Into::into).collect(),
            exclude: Vec::new(),
        }
    }

    pub fn excluding<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: Vec::new(),
            exclude: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// Which side of a moving average price must sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaDirection {
    Above,
    Below,
}

/// Price relative to a moving average.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovingAverageFilter {
    pub period: u32,
    pub direction: MaDirection,
}

/// Distance from a moving average measured in ADR% multiples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdrFromMovingAverage {
    pub period: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_multiple: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_multiple: Option<f64>,
}

/// Relative volatility metric parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RvmFilter {
    pub lookback: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// List-shaped filters the range adapters never touch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StructuredFilter {
    MovingAverages(Vec<MovingAverageFilter>),
    AdrFromMovingAverage(Vec<AdrFromMovingAverage>),
    RelativeVolatility(Vec<RvmFilter>),
}

impl StructuredFilter {
    pub fn len(&self) -> usize {
        match self {
            StructuredFilter::MovingAverages(v) => v.len(),
            StructuredFilter::AdrFromMovingAverage(v) => v.len(),
            StructuredFilter::RelativeVolatility(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The value of one filter in a criteria leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Range(RangeValue),
    InclusionExclusion(InclusionExclusion),
    Flag,
    Structured(StructuredFilter),
}

impl FilterValue {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterValue::Range(_) => FilterKind::Range,
            FilterValue::InclusionExclusion(_) => FilterKind::InclusionExclusion,
            FilterValue::Flag => FilterKind::Flag,
            FilterValue::Structured(_) => FilterKind::Structured,
        }
    }

    /// Whether this value is the right shape to sit under `key`.
    pub fn fits(&self, key: FilterKey) -> bool {
        match (key, self) {
            (FilterKey::MovingAvgFilters, FilterValue::Structured(s)) => {
                matches!(s, StructuredFilter::MovingAverages(_))
            }
            (FilterKey::AdrPercentFromMovingAvg, FilterValue::Structured(s)) => {
                matches!(s, StructuredFilter::AdrFromMovingAverage(_))
            }
            (FilterKey::RvmFilters, FilterValue::Structured(s)) => {
                matches!(s, StructuredFilter::RelativeVolatility(_))
            }
            _ => key.kind() == self.kind(),
        }
    }

    /// Whether the value restricts the screen at all.
    pub fn is_active(&self) -> bool {
        match self {
            FilterValue::Range(_) | FilterValue::Flag => true,
            FilterValue::InclusionExclusion(v) => !v.is_empty(),
            FilterValue::Structured(v) => !v.is_empty(),
        }
    }

    /// Parse a raw JSON value according to the shape `key` carries.
    ///
    /// `null` and `false` mean the filter is absent and yield `Ok(None)`.
    pub fn from_json(key: FilterKey, value: Value) -> Result<Option<FilterValue>> {
        if value.is_null() {
            return Ok(None);
        }

        let invalid = |e: serde_json::Error| Error::InvalidFilterValue {
            key: key.as_str().to_string(),
            reason: e.to_string(),
        };

        let parsed = match key.kind() {
            FilterKind::Range => {
                FilterValue::Range(serde_json::from_value(value).map_err(invalid)?)
            }
            FilterKind::InclusionExclusion => {
                FilterValue::InclusionExclusion(serde_json::from_value(value).map_err(invalid)?)
            }
            FilterKind::Flag => match value {
                Value::Bool(true) => FilterValue::Flag,
                Value::Bool(false) => return Ok(None),
                other => {
                    return Err(Error::InvalidFilterValue {
                        key: key.as_str().to_string(),
                        reason: format!("expected boolean flag, found {}", other),
                    })
                }
            },
            FilterKind::Structured => {
                let structured = match key {
                    FilterKey::MovingAvgFilters => StructuredFilter::MovingAverages(
                        serde_json::from_value(value).map_err(invalid)?,
                    ),
                    FilterKey::AdrPercentFromMovingAvg => StructuredFilter::AdrFromMovingAverage(
                        serde_json::from_value(value).map_err(invalid)?,
                    ),
                    _ => StructuredFilter::RelativeVolatility(
                        serde_json::from_value(value).map_err(invalid)?,
                    ),
                };
                FilterValue::Structured(structured)
            }
        };

        Ok(Some(parsed))
    }
}

impl Serialize for FilterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FilterValue::Range(range) => range.serialize(serializer),
            FilterValue::InclusionExclusion(value) => value.serialize(serializer),
            FilterValue::Flag => serializer.serialize_bool(true),
            FilterValue::Structured(value) => value.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_range_wire_form() {
        let range = RangeValue {
            min: Some(5.0),
            max: None,
        };
        assert_eq!(serde_json::to_value(range).unwrap(), json!([5.0, null]));

        let parsed: RangeValue = serde_json::from_value(json!([1, 100])).unwrap();
        assert_eq!(parsed, RangeValue::new(1.0, 100.0));
    }

    #[test]
    fn test_legacy_sentinels_read_as_unbounded() {
        let parsed: RangeValue =
            serde_json::from_value(json!([-9007199254740991i64, 1.7976931348623157e308])).unwrap();
        assert_eq!(parsed, RangeValue::unbounded());
    }

    #[test]
    fn test_flag_parsing() {
        assert_eq!(
            FilterValue::from_json(FilterKey::EtfOnly, json!(true)).unwrap(),
            Some(FilterValue::Flag)
        );
        assert_eq!(
            FilterValue::from_json(FilterKey::EtfOnly, json!(false)).unwrap(),
            None
        );
        assert!(FilterValue::from_json(FilterKey::EtfOnly, json!("yes")).is_err());
    }

    #[test]
    fn test_null_is_absent() {
        for key in FilterKey::ALL {
            assert_eq!(FilterValue::from_json(key, Value::Null).unwrap(), None);
        }
    }

    #[test]
    fn test_wrong_shape_for_range_key() {
        let err = FilterValue::from_json(FilterKey::PriceRange, json!({"include": []})).unwrap_err();
        match err {
            Error::InvalidFilterValue { key, .. } => assert_eq!(key, "priceRange"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_structured_parsing_follows_key() {
        let value = FilterValue::from_json(
            FilterKey::MovingAvgFilters,
            json!([{"period": 50, "direction": "above"}]),
        )
        .unwrap()
        .unwrap();
        assert!(value.fits(FilterKey::MovingAvgFilters));
        assert!(!value.fits(FilterKey::RvmFilters));
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!([{"period": 50, "direction": "above"}])
        );
    }

    #[test]
    fn test_inclusion_defaults_missing_lists() {
        let value = FilterValue::from_json(FilterKey::Sector, json!({"include": ["Technology"]}))
            .unwrap()
            .unwrap();
        assert_eq!(
            value,
            FilterValue::InclusionExclusion(InclusionExclusion::including(["Technology"]))
        );
    }
}
