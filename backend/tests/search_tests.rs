//! Search pipeline tests
//!
//! Properties of the in-memory search pass:
//! - Results are sorted by ascending distance
//! - Every result satisfies the distance, price and rating bounds
//! - Accommodation filters require exact leaf equality

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::hours::{OpenWindow, OpenWindows};
use shared::models::{AccommodationFilter, Accommodations, Address, PetFriendly};
use shared::search::{run_pipeline, SearchCandidate, SearchCriteria};

fn address() -> Address {
    Address {
        street: "100 Main St".to_string(),
        city: "Asheville".to_string(),
        state: "NC".to_string(),
        zip_code: "28801".to_string(),
    }
}

fn candidate(name: &str, distance_miles: f64, price: i16, rating: Decimal) -> SearchCandidate {
    SearchCandidate {
        id: Uuid::new_v4(),
        name: name.to_string(),
        address: address(),
        price,
        rating,
        review_count: 3,
        accommodations: Accommodations::default(),
        distance_miles,
        general_windows: OpenWindows::default(),
        kid_friendly_windows: OpenWindows::default(),
    }
}

// ============================================================================
// Property Test Strategies
// ============================================================================

fn candidate_strategy() -> impl Strategy<Value = SearchCandidate> {
    (0.0f64..60.0, 0i16..=4, 0i64..=50, any::<bool>()).prop_map(
        |(distance, price, tenths, water)| {
            let mut c = candidate("Brewery", distance, price, Decimal::new(tenths, 1));
            c.accommodations.pet_friendly.water_stations = water;
            c
        },
    )
}

fn criteria_strategy() -> impl Strategy<Value = SearchCriteria> {
    (
        1.0f64..50.0,
        prop::option::of(0i16..=4),
        prop::option::of((0i64..=50).prop_map(|t| Decimal::new(t, 1))),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(max_distance_miles, max_price, min_rating, water)| {
            let mut accommodations = AccommodationFilter::default();
            accommodations.pet_friendly.water_stations = water;
            SearchCriteria {
                max_distance_miles,
                max_price,
                min_rating,
                accommodations,
                ..SearchCriteria::default()
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn results_are_sorted_by_distance(
        candidates in prop::collection::vec(candidate_strategy(), 0..40),
    ) {
        let criteria = SearchCriteria {
            max_distance_miles: 100.0,
            ..SearchCriteria::default()
        };
        let results = run_pipeline(candidates, &criteria, 0);
        for pair in results.windows(2) {
            prop_assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn results_respect_every_bound(
        candidates in prop::collection::vec(candidate_strategy(), 0..40),
        criteria in criteria_strategy(),
    ) {
        let expected = candidates
            .iter()
            .filter(|c| c.distance_miles <= criteria.max_distance_miles)
            .filter(|c| criteria.max_price.map_or(true, |max| c.price <= max))
            .filter(|c| criteria.min_rating.map_or(true, |min| c.rating >= min))
            .filter(|c| {
                criteria
                    .accommodations
                    .pet_friendly
                    .water_stations
                    .map_or(true, |w| c.accommodations.pet_friendly.water_stations == w)
            })
            .count();

        let results = run_pipeline(candidates, &criteria, 0);
        prop_assert_eq!(results.len(), expected);

        for r in &results {
            prop_assert!(r.distance <= criteria.max_distance_miles);
            if let Some(max) = criteria.max_price {
                prop_assert!(r.price <= max);
            }
            if let Some(min) = criteria.min_rating {
                prop_assert!(r.rating >= min);
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn accommodation_leaf_false_is_a_real_constraint() {
    let mut with_water = candidate("Water Bowl Brewing", 1.0, 2, Decimal::from(4));
    with_water.accommodations.pet_friendly = PetFriendly {
        water_stations: true,
        ..PetFriendly::default()
    };
    let without = candidate("Dry Dock Brewing", 2.0, 2, Decimal::from(4));

    let mut criteria = SearchCriteria::default();
    criteria.accommodations.pet_friendly.water_stations = Some(false);

    let results = run_pipeline(vec![with_water, without], &criteria, 0);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Dry Dock Brewing");
}

#[test]
fn open_flags_are_computed_for_every_result() {
    let mut open = candidate("Night Owl", 3.0, 1, Decimal::from(4));
    open.general_windows = OpenWindows::new(vec![OpenWindow { open: 0, close: 1000 }]);
    open.kid_friendly_windows = OpenWindows::new(vec![OpenWindow { open: 0, close: 100 }]);

    let results = run_pipeline(vec![open], &SearchCriteria::default(), 500);
    assert!(results[0].open_now);
    assert!(!results[0].kid_friendly_now);
    assert!(results[0].image_url.is_none());
}

#[test]
fn fuzzy_stage_keeps_distance_order() {
    let criteria = SearchCriteria {
        name_query: Some("brewing".to_string()),
        ..SearchCriteria::default()
    };
    let results = run_pipeline(
        vec![
            candidate("Wicked Weed Brewing", 5.0, 2, Decimal::from(4)),
            candidate("Burial Beer", 0.5, 2, Decimal::from(4)),
            candidate("Highland Brewing", 1.5, 2, Decimal::from(4)),
        ],
        &criteria,
        0,
    );
    let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Highland Brewing", "Wicked Weed Brewing"]);
}
