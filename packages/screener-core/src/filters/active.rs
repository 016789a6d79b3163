//! Active-filter counting for the editor badge.

use super::criteria::FilterCriteria;
use super::group::FilterGroup;

/// Count the filters that restrict the screen, across every leaf in the tree.
///
/// See [`FilterCriteria::active_count`] for what counts within a leaf.
pub fn count_active_filters(group: &FilterGroup) -> usize {
    let mut total = 0;
    group.visit_criteria(&mut |criteria: &FilterCriteria| total += criteria.active_count());
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group(value: serde_json::Value) -> FilterGroup {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_group() {
        assert_eq!(count_active_filters(&FilterGroup::and()), 0);
    }

    #[test]
    fn test_empty_inclusion_does_not_count() {
        let g = group(json!({
            "operator": "AND",
            "filters": [{"sector": {"include": [], "exclude": []}, "priceRange": [10, 50]}],
        }));
        assert_eq!(count_active_filters(&g), 1);
    }

    #[test]
    fn test_empty_list_does_not_count() {
        let g = group(json!({"operator": "AND", "filters": [{"movingAvgFilters": []}]}));
        assert_eq!(count_active_filters(&g), 0);
    }

    #[test]
    fn test_counts_across_nested_groups() {
        let g = group(json!({
            "operator": "AND",
            "filters": [
                {"priceRange": [5, 20], "etfOnly": true},
                {
                    "operator": "OR",
                    "filters": [
                        {"country": {"include": ["US"], "exclude": ["CN"]}},
                        {"operator": "AND", "filters": [
                            {"rvmFilters": [{"lookback": 15, "max": 20}]},
                            {"industry": {"include": [], "exclude": []}},
                        ]},
                    ],
                },
            ],
        }));
        // priceRange, etfOnly, country (once), rvmFilters
        assert_eq!(count_active_filters(&g), 4);
    }
}
