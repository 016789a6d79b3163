//! Screener filter model.
//!
//! A screen is a [`FilterGroup`]: an AND/OR tree whose leaves are
//! [`FilterCriteria`] maps from [`FilterKey`] to a typed [`FilterValue`].
//!
//! - **Ranges**: [`ScreenerRanges`] holds the current data-driven bounds
//! - **Normalization**: save/load adapters that keep full-range selections
//!   meaning "unbounded" as the data's extremes drift
//! - **Counting**: [`count_active_filters`] for the editor badge

mod active;
mod criteria;
mod group;
mod key;
mod normalize;
mod ranges;
mod value;

pub use active::count_active_filters;
pub use criteria::FilterCriteria;
pub use group::{FilterGroup, FilterNode, Operator};
pub use key::{FilterKey, FilterKind, UnknownFilterKey};
pub use normalize::{
    adjust_criteria_for_load, adjust_criteria_for_save, adjust_filter_group_for_load,
    adjust_filter_group_for_save, BOUND_TOLERANCE_ULPS,
};
pub use ranges::{Bounds, ScreenerRanges, DEFAULT_BOUNDS};
pub use value::{
    AdrFromMovingAverage, FilterValue, InclusionExclusion, MaDirection, MovingAverageFilter,
    RangeValue, RvmFilter, StructuredFilter, LEGACY_UNBOUNDED_MAX, LEGACY_UNBOUNDED_MIN,
};
