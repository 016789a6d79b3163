//! Range normalization applied around persistence.
//!
//! A saved screen should keep meaning "no restriction" on a side the user
//! left at the data's current extreme, even after the extremes move. Before
//! saving, bounds that sit on the current [`ScreenerRanges`] become
//! unbounded (`None`); after loading, unbounded sides are filled back in from
//! whatever the ranges are at that time, because slider controls need finite
//! numbers.

use super::criteria::FilterCriteria;
use super::group::FilterGroup;
use super::key::FilterKey;
use super::ranges::ScreenerRanges;
use super::value::RangeValue;

/// How many units in the last place a selection may sit from a range bound
/// and still be treated as that bound.
pub const BOUND_TOLERANCE_ULPS: f64 = 4.0;

fn same_bound(value: f64, bound: f64) -> bool {
    value == bound
        || (value - bound).abs()
            <= BOUND_TOLERANCE_ULPS * f64::EPSILON * value.abs().max(bound.abs())
}

fn range_for_save(key: FilterKey, range: &RangeValue, ranges: &ScreenerRanges) -> RangeValue {
    let bounds = ranges.get(key);
    RangeValue {
        min: range.min.filter(|v| !same_bound(*v, bounds.low)),
        max: range.max.filter(|v| !same_bound(*v, bounds.high)),
    }
}

fn range_for_load(key: FilterKey, range: &RangeValue, ranges: &ScreenerRanges) -> RangeValue {
    let bounds = ranges.get(key);
    RangeValue {
        min: Some(range.min.unwrap_or(bounds.low)),
        max: Some(range.max.unwrap_or(bounds.high)),
    }
}

/// Normalize one criteria leaf for persistence.
pub fn adjust_criteria_for_save(criteria: &FilterCriteria, ranges: &ScreenerRanges) -> FilterCriteria {
    criteria.map_ranges(|key, range| range_for_save(key, range, ranges))
}

/// Restore one criteria leaf for editing.
pub fn adjust_criteria_for_load(criteria: &FilterCriteria, ranges: &ScreenerRanges) -> FilterCriteria {
    criteria.map_ranges(|key, range| range_for_load(key, range, ranges))
}

/// Copy `group` with every full-range bound replaced by an unbounded side.
pub fn adjust_filter_group_for_save(group: &FilterGroup, ranges: &ScreenerRanges) -> FilterGroup {
    tracing::trace!(leaves = group.leaf_count(), "Adjusting filter group for save");
    group.map_criteria(&mut |criteria: &FilterCriteria| adjust_criteria_for_save(criteria, ranges))
}

/// Copy `group` with every unbounded side replaced by the current bound.
pub fn adjust_filter_group_for_load(group: &FilterGroup, ranges: &ScreenerRanges) -> FilterGroup {
    tracing::trace!(leaves = group.leaf_count(), "Adjusting filter group for load");
    group.map_criteria(&mut |criteria: &FilterCriteria| adjust_criteria_for_load(criteria, ranges))
}
