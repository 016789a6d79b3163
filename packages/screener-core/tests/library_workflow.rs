//! End-to-end: build a screen, save it to a library file, reopen it after
//! the screener's ranges have moved, and edit it as a second user.

use screener_core::filters::{Bounds, FilterKey, RangeValue};
use screener_core::{
    Error, FilterGroup, FilterGroupDto, FilterLibrary, Permission, ScreenerRanges,
};
use serde_json::json;
use tempfile::tempdir;

fn breakout_screen() -> FilterGroup {
    serde_json::from_value(json!({
        "operator": "AND",
        "filters": [
            {"priceRange": [1, 500], "volumeRange": [100, 2000], "etfOnly": true},
            {
                "operator": "OR",
                "name": "trend",
                "filters": [
                    {"movingAvgFilters": [{"period": 50, "direction": "above"}]},
                    {"rsRankRange": [80, 100]},
                ],
            },
        ],
    }))
    .unwrap()
}

#[test]
fn test_saved_screen_follows_range_drift() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("filter_groups.json");

    let monday = ScreenerRanges::new()
        .with(FilterKey::PriceRange, 1.0, 500.0)
        .with(FilterKey::VolumeRange, 0.0, 5_000_000.0);

    let id = {
        let mut library = FilterLibrary::with_path(path.clone());
        let dto = FilterGroupDto::new("Breakouts", breakout_screen())
            .with_permission(Permission::Shared)
            .with_tags(["Momentum"]);
        let stored = library.create("alice", &dto, &monday).unwrap();
        library.save().unwrap();
        stored.filter_group_id.unwrap()
    };

    let friday = ScreenerRanges::new()
        .with(FilterKey::PriceRange, 0.5, 750.0)
        .with(FilterKey::VolumeRange, 0.0, 9_000_000.0);

    let library = FilterLibrary::open(path).unwrap();
    let loaded = library.load_for_editing("bob", &id, &friday).unwrap();

    let top = loaded.filter_group.filters[0].clone();
    let leaf = match top {
        screener_core::FilterNode::Criteria(criteria) => criteria,
        screener_core::FilterNode::Group(_) => panic!("expected criteria"),
    };
    assert_eq!(
        leaf.range(FilterKey::PriceRange),
        Some(&RangeValue::new(0.5, 750.0))
    );
    assert_eq!(
        leaf.range(FilterKey::VolumeRange),
        Some(&RangeValue::new(100.0, 2000.0))
    );

    // rsRankRange has no reported bounds, so [1, 100] applies on both sides
    assert_eq!(friday.get(FilterKey::RsRankRange), Bounds::new(1.0, 100.0));
    let saved = library.get(&id).unwrap();
    assert_eq!(
        serde_json::to_value(&saved.filter_group).unwrap()["filters"][1]["filters"][1],
        json!({"rsRankRange": [80.0, null]})
    );

    assert_eq!(loaded.active_filter_count(), 5);
    assert_eq!(library.by_tag("momentum").len(), 1);
}

#[test]
fn test_other_users_cannot_modify_shared_screen() {
    let ranges = ScreenerRanges::new();
    let mut library = FilterLibrary::in_memory();
    let stored = library
        .create(
            "alice",
            &FilterGroupDto::new("Breakouts", breakout_screen()).with_permission(Permission::Shared),
            &ranges,
        )
        .unwrap();
    let id = stored.filter_group_id.clone().unwrap();

    let mut edited = library.load_for_editing("bob", &id, &ranges).unwrap();
    edited.filter_group_name = "Hijacked".to_string();

    assert!(matches!(
        library.update("bob", &edited, &ranges),
        Err(Error::PermissionDenied(_))
    ));
    assert!(matches!(
        library.delete("bob", &id),
        Err(Error::PermissionDenied(_))
    ));
    assert_eq!(library.get(&id).unwrap().filter_group_name, "Breakouts");
}
