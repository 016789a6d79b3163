//! Screener Core - saved screens for the stock/ETF screener.
//!
//! This crate provides the filter model behind the screener's filter builder:
//!
//! - **Filter groups**: AND/OR trees of typed filter criteria
//! - **Range normalization**: save/load adapters that keep "full range"
//!   selections unbounded as the data's min/max drift
//! - **Active-filter counting**: badge count for the editor
//! - **Library**: JSON-file store of saved screens with owner, permission and tags
//!
//! # Example
//!
//! ```rust,no_run
//! use screener_core::filters::{FilterCriteria, FilterGroup, FilterKey, ScreenerRanges};
//! use screener_core::library::FilterLibrary;
//! use screener_core::FilterGroupDto;
//!
//! let ranges = ScreenerRanges::new().with(FilterKey::PriceRange, 1.0, 500.0);
//! let criteria = FilterCriteria::new()
//!     .with_range(FilterKey::PriceRange, 1.0, 500.0)
//!     .unwrap();
//! let screen = FilterGroupDto::new("Everything", FilterGroup::and().with_criteria(criteria));
//!
//! // Uses ~/.traderslab/screener/filter_groups.json unless overridden
//! let mut library = FilterLibrary::new();
//! let stored = library.create("alice", &screen, &ranges).unwrap();
//! library.save().unwrap();
//! println!("Saved {} with {} active filters", stored.filter_group_name, stored.active_filter_count());
//! ```

pub mod config;
pub mod filters;
pub mod library;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use types::{ApiResponse, FilterGroupDto, Permission};

// Re-export main functionality
pub use filters::{
    adjust_filter_group_for_load, adjust_filter_group_for_save, count_active_filters,
    FilterCriteria, FilterGroup, FilterKey, FilterNode, FilterValue, Operator, RangeValue,
    ScreenerRanges,
};
pub use library::FilterLibrary;

/// Error types for screener-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid value for filter {key}: {reason}")]
    InvalidFilterValue { key: String, reason: String },

    #[error("Invalid filter group: {0}")]
    InvalidFilterGroup(String),

    #[error("Filter group not found: {0}")]
    FilterGroupNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for screener-core operations.
pub type Result<T> = std::result::Result<T, Error>;
