//! Location search pipeline
//!
//! The database narrows candidates by distance; everything here runs on that
//! candidate set, in order: attribute bounds, accommodations, open now, kid
//! friendly now, name match. Results come back sorted by distance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fuzzy::{name_matches, DEFAULT_MATCH_THRESHOLD};
use crate::hours::OpenWindows;
use crate::models::{AccommodationFilter, Accommodations, Address};

/// Miles in one meter
pub const MILES_PER_METER: f64 = 0.000621371;

/// Radius used when a search does not give one
pub const DEFAULT_MAX_DISTANCE_MILES: f64 = 25.0;

pub fn meters_to_miles(meters: f64) -> f64 {
    meters * MILES_PER_METER
}

pub fn miles_to_meters(miles: f64) -> f64 {
    miles / MILES_PER_METER
}

/// Filters applied to a search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub max_distance_miles: f64,
    pub max_price: Option<i16>,
    pub min_rating: Option<Decimal>,
    pub accommodations: AccommodationFilter,
    pub open_now: bool,
    pub kid_friendly_now: bool,
    pub name_query: Option<String>,
    pub fuzzy_threshold: u8,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            max_distance_miles: DEFAULT_MAX_DISTANCE_MILES,
            max_price: None,
            min_rating: None,
            accommodations: AccommodationFilter::default(),
            open_now: false,
            kid_friendly_now: false,
            name_query: None,
            fuzzy_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl SearchCriteria {
    /// Trimmed name query, `None` when blank
    pub fn name_query(&self) -> Option<&str> {
        self.name_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// A location inside the search radius, with its distance and windows
#[derive(Debug, Clone)]
pub struct SearchCandidate {
    pub id: Uuid,
    pub name: String,
    pub address: Address,
    pub price: i16,
    pub rating: Decimal,
    pub review_count: i64,
    pub accommodations: Accommodations,
    pub distance_miles: f64,
    pub general_windows: OpenWindows,
    pub kid_friendly_windows: OpenWindows,
}

/// One search hit as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSummary {
    pub id: Uuid,
    pub name: String,
    pub address: Address,
    pub price: i16,
    pub accommodations: Accommodations,
    /// Miles from the search origin
    pub distance: f64,
    pub review_count: i64,
    pub rating: Decimal,
    pub open_now: bool,
    pub kid_friendly_now: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub count: usize,
    pub results: Vec<LocationSummary>,
}

impl SearchResults {
    pub fn new(results: Vec<LocationSummary>) -> Self {
        Self {
            count: results.len(),
            results,
        }
    }
}

impl SearchCandidate {
    fn within_bounds(&self, criteria: &SearchCriteria) -> bool {
        self.distance_miles <= criteria.max_distance_miles
            && criteria.max_price.map_or(true, |max| self.price <= max)
            && criteria.min_rating.map_or(true, |min| self.rating >= min)
    }

    fn into_summary(self, week_seconds: i64) -> LocationSummary {
        LocationSummary {
            open_now: self.general_windows.is_open_at(week_seconds),
            kid_friendly_now: self.kid_friendly_windows.is_open_at(week_seconds),
            id: self.id,
            name: self.name,
            address: self.address,
            price: self.price,
            accommodations: self.accommodations,
            distance: self.distance_miles,
            review_count: self.review_count,
            rating: self.rating,
            image_url: None,
        }
    }
}

/// Filter, project and rank candidates against `criteria` at the given
/// week-relative second. Image URLs are left empty for the caller to sign.
pub fn run_pipeline(
    candidates: Vec<SearchCandidate>,
    criteria: &SearchCriteria,
    week_seconds: i64,
) -> Vec<LocationSummary> {
    let query = criteria.name_query();

    let mut results: Vec<LocationSummary> = candidates
        .into_iter()
        .filter(|c| c.within_bounds(criteria))
        .filter(|c| criteria.accommodations.matches(&c.accommodations))
        .filter(|c| !criteria.open_now || c.general_windows.is_open_at(week_seconds))
        .filter(|c| {
            !criteria.kid_friendly_now || c.kid_friendly_windows.is_open_at(week_seconds)
        })
        .filter(|c| query.map_or(true, |q| name_matches(q, &c.name, criteria.fuzzy_threshold)))
        .map(|c| c.into_summary(week_seconds))
        .collect();

    results.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hours::OpenWindow;

    fn candidate(name: &str, distance_miles: f64) -> SearchCandidate {
        SearchCandidate {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: Address {
                street: "1 Brew Way".to_string(),
                city: "Portland".to_string(),
                state: "OR".to_string(),
                zip_code: "97201".to_string(),
            },
            price: 2,
            rating: Decimal::from(4),
            review_count: 10,
            accommodations: Accommodations::default(),
            distance_miles,
            general_windows: OpenWindows::default(),
            kid_friendly_windows: OpenWindows::default(),
        }
    }

    #[test]
    fn sorts_by_distance() {
        let results = run_pipeline(
            vec![
                candidate("Far", 9.0),
                candidate("Near", 0.5),
                candidate("Middle", 3.2),
            ],
            &SearchCriteria::default(),
            0,
        );
        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Near", "Middle", "Far"]);
    }

    #[test]
    fn applies_distance_price_and_rating_bounds() {
        let mut pricey = candidate("Pricey", 1.0);
        pricey.price = 4;
        let mut poor = candidate("Poor", 1.0);
        poor.rating = Decimal::new(25, 1);
        let distant = candidate("Distant", 30.0);
        let good = candidate("Good", 2.0);

        let criteria = SearchCriteria {
            max_price: Some(3),
            min_rating: Some(Decimal::from(3)),
            ..SearchCriteria::default()
        };
        let results = run_pipeline(vec![pricey, poor, distant, good], &criteria, 0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Good");
    }

    #[test]
    fn open_now_uses_general_windows() {
        let mut open = candidate("Open", 1.0);
        open.general_windows = OpenWindows::new(vec![OpenWindow { open: 100, close: 200 }]);
        let mut kids_only = candidate("Kids Only", 2.0);
        kids_only.kid_friendly_windows =
            OpenWindows::new(vec![OpenWindow { open: 100, close: 200 }]);

        let criteria = SearchCriteria {
            open_now: true,
            ..SearchCriteria::default()
        };
        let results = run_pipeline(vec![open.clone(), kids_only.clone()], &criteria, 150);
        assert_eq!(results.len(), 1);
        assert!(results[0].open_now);
        assert!(!results[0].kid_friendly_now);

        let criteria = SearchCriteria {
            kid_friendly_now: true,
            ..SearchCriteria::default()
        };
        let results = run_pipeline(vec![open, kids_only], &criteria, 150);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Kids Only");
    }

    #[test]
    fn name_query_is_fuzzy() {
        let criteria = SearchCriteria {
            name_query: Some("deschutes".to_string()),
            ..SearchCriteria::default()
        };
        let results = run_pipeline(
            vec![
                candidate("Deschutes Brewery", 4.0),
                candidate("Ecliptic Brewing", 1.0),
            ],
            &criteria,
            0,
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Deschutes Brewery");
    }

    #[test]
    fn blank_name_query_is_ignored() {
        let criteria = SearchCriteria {
            name_query: Some("   ".to_string()),
            ..SearchCriteria::default()
        };
        let results = run_pipeline(vec![candidate("Anything", 1.0)], &criteria, 0);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn no_candidates_is_empty_not_error() {
        let results = SearchResults::new(run_pipeline(vec![], &SearchCriteria::default(), 0));
        assert_eq!(results.count, 0);
        assert!(results.results.is_empty());
    }

    #[test]
    fn distance_conversion() {
        let miles = meters_to_miles(1609.344);
        assert!((miles - 1.0).abs() < 1e-4);
        assert!((meters_to_miles(miles_to_meters(25.0)) - 25.0).abs() < 1e-9);
    }
}
