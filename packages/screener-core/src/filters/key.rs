//! Closed set of screener filter identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shape of the value a filter key carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// `[min, max]` bounds on a numeric metric
    Range,
    /// `{ include, exclude }` lists over a categorical dimension
    InclusionExclusion,
    /// Present means active, absent means inactive
    Flag,
    /// Lists of small parameter objects, opaque to range normalization
    Structured,
}

/// Every filter the screener understands.
///
/// Declaration order is the order criteria are serialized in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterKey {
    #[serde(rename = "priceRange")]
    PriceRange,
    #[serde(rename = "volumeRange")]
    VolumeRange,
    #[serde(rename = "avgVolumeRange")]
    AvgVolumeRange,
    #[serde(rename = "relativeVolumeRange")]
    RelativeVolumeRange,
    #[serde(rename = "dollarVolumeRange")]
    DollarVolumeRange,
    #[serde(rename = "marketCapRange")]
    MarketCapRange,
    #[serde(rename = "adrPercentRange")]
    AdrPercentRange,
    #[serde(rename = "percentFromHigh52Range")]
    PercentFromHigh52Range,
    #[serde(rename = "percentFromLow52Range")]
    PercentFromLow52Range,
    #[serde(rename = "percentChange1DRange")]
    PercentChange1DRange,
    #[serde(rename = "percentChange1WRange")]
    PercentChange1WRange,
    #[serde(rename = "percentChange1MRange")]
    PercentChange1MRange,
    #[serde(rename = "percentChange3MRange")]
    PercentChange3MRange,
    #[serde(rename = "percentChange6MRange")]
    PercentChange6MRange,
    #[serde(rename = "percentChange1YRange")]
    PercentChange1YRange,
    #[serde(rename = "percentChangeYtdRange")]
    PercentChangeYtdRange,
    #[serde(rename = "rsRankRange")]
    RsRankRange,
    #[serde(rename = "sector")]
    Sector,
    #[serde(rename = "industry")]
    Industry,
    #[serde(rename = "country")]
    Country,
    #[serde(rename = "etfOnly")]
    EtfOnly,
    #[serde(rename = "excludeEtfs")]
    ExcludeEtfs,
    #[serde(rename = "earningsThisWeek")]
    EarningsThisWeek,
    #[serde(rename = "newHigh52Week")]
    NewHigh52Week,
    #[serde(rename = "movingAvgFilters")]
    MovingAvgFilters,
    #[serde(rename = "adrPercentFromMovingAvg")]
    AdrPercentFromMovingAvg,
    #[serde(rename = "rvmFilters")]
    RvmFilters,
}

impl FilterKey {
    /// All keys, in declaration order.
    pub const ALL: [FilterKey; 27] = [
        FilterKey::PriceRange,
        FilterKey::VolumeRange,
        FilterKey::AvgVolumeRange,
        FilterKey::RelativeVolumeRange,
        FilterKey::DollarVolumeRange,
        FilterKey::MarketCapRange,
        FilterKey::AdrPercentRange,
        FilterKey::PercentFromHigh52Range,
        FilterKey::PercentFromLow52Range,
        FilterKey::PercentChange1DRange,
        FilterKey::PercentChange1WRange,
        FilterKey::PercentChange1MRange,
        FilterKey::PercentChange3MRange,
        FilterKey::PercentChange6MRange,
        FilterKey::PercentChange1YRange,
        FilterKey::PercentChangeYtdRange,
        FilterKey::RsRankRange,
        FilterKey::Sector,
        FilterKey::Industry,
        FilterKey::Country,
        FilterKey::EtfOnly,
        FilterKey::ExcludeEtfs,
        FilterKey::EarningsThisWeek,
        FilterKey::NewHigh52Week,
        FilterKey::MovingAvgFilters,
        FilterKey::AdrPercentFromMovingAvg,
        FilterKey::RvmFilters,
    ];

    /// Wire name used in saved payloads and API requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::PriceRange => "priceRange",
            FilterKey::VolumeRange => "volumeRange",
            FilterKey::AvgVolumeRange => "avgVolumeRange",
            FilterKey::RelativeVolumeRange => "relativeVolumeRange",
            FilterKey::DollarVolumeRange => "dollarVolumeRange",
            FilterKey::MarketCapRange => "marketCapRange",
            FilterKey::AdrPercentRange => "adrPercentRange",
            FilterKey::PercentFromHigh52Range => "percentFromHigh52Range",
            FilterKey::PercentFromLow52Range => "percentFromLow52Range",
            FilterKey::PercentChange1DRange => "percentChange1DRange",
            FilterKey::PercentChange1WRange => "percentChange1WRange",
            FilterKey::PercentChange1MRange => "percentChange1MRange",
            FilterKey::PercentChange3MRange => "percentChange3MRange",
            FilterKey::PercentChange6MRange => "percentChange6MRange",
            FilterKey::PercentChange1YRange => "percentChange1YRange",
            FilterKey::PercentChangeYtdRange => "percentChangeYtdRange",
            FilterKey::RsRankRange => "rsRankRange",
            FilterKey::Sector => "sector",
            FilterKey::Industry => "industry",
            FilterKey::Country => "country",
            FilterKey::EtfOnly => "etfOnly",
            FilterKey::ExcludeEtfs => "excludeEtfs",
            FilterKey::EarningsThisWeek => "earningsThisWeek",
            FilterKey::NewHigh52Week => "newHigh52Week",
            FilterKey::MovingAvgFilters => "movingAvgFilters",
            FilterKey::AdrPercentFromMovingAvg => "adrPercentFromMovingAvg",
            FilterKey::RvmFilters => "rvmFilters",
        }
    }

    /// The value shape this key carries.
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterKey::PriceRange
            | FilterKey::VolumeRange
            | FilterKey::AvgVolumeRange
            | FilterKey::RelativeVolumeRange
            | FilterKey::DollarVolumeRange
            | FilterKey::MarketCapRange
            | FilterKey::AdrPercentRange
            | FilterKey::PercentFromHigh52Range
            | FilterKey::PercentFromLow52Range
            | FilterKey::PercentChange1DRange
            | FilterKey::PercentChange1WRange
            | FilterKey::PercentChange1MRange
            | FilterKey::PercentChange3MRange
            | FilterKey::PercentChange6MRange
            | FilterKey::PercentChange1YRange
            | FilterKey::PercentChangeYtdRange
            | FilterKey::RsRankRange => FilterKind::Range,
            FilterKey::Sector | FilterKey::Industry | FilterKey::Country => {
                FilterKind::InclusionExclusion
            }
            FilterKey::EtfOnly
            | FilterKey::ExcludeEtfs
            | FilterKey::EarningsThisWeek
            | FilterKey::NewHigh52Week => FilterKind::Flag,
            FilterKey::MovingAvgFilters
            | FilterKey::AdrPercentFromMovingAvg
            | FilterKey::RvmFilters => FilterKind::Structured,
        }
    }

    /// Whether the key carries a `[min, max]` range.
    pub fn is_range(&self) -> bool {
        self.kind() == FilterKind::Range
    }

    /// Iterate the range-valued keys.
    pub fn range_keys() -> impl Iterator<Item = FilterKey> {
        Self::ALL.into_iter().filter(|k| k.is_range())
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known filter key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter key: {0}")]
pub struct UnknownFilterKey(pub String);

impl FromStr for FilterKey {
    type Err = UnknownFilterKey;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownFilterKey(s.to_string()))
    }
}
