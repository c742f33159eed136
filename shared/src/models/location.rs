//! Brewery location models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::GeoPoint;

use super::WeeklyHours;

/// A US street address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl Address {
    /// Single-line form sent to the geocoder
    pub fn one_line(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.street, self.city, self.state, self.zip_code
        )
    }
}

/// A brewery listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub address: Address,
    pub coordinates: GeoPoint,
    pub phone_number: String,
    pub email: Option<String>,
    pub website: Option<String>,
    /// 0-4, rendered as `$`..`$$$$`
    pub price: i16,
    pub rating: Decimal,
    pub review_count: i64,
    pub accommodations: Accommodations,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dollar-sign label for a price tier; tier 0 has no label
pub fn price_label(price: i16) -> String {
    "$".repeat(price.clamp(0, 4) as usize)
}

/// Input for creating a location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocationInput {
    pub name: String,
    pub address: Address,
    pub phone_number: String,
    pub email: Option<String>,
    pub website: Option<String>,
    pub price: i16,
    #[serde(default)]
    pub accommodations: Accommodations,
    #[serde(default)]
    pub business_hours: WeeklyHours,
    #[serde(default)]
    pub kid_friendly_hours: WeeklyHours,
    /// IANA name; looked up from the coordinates when absent
    pub timezone: Option<String>,
}

/// Input for updating a location. Absent fields are left unchanged; a
/// supplied schedule replaces the old one entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLocationInput {
    pub name: Option<String>,
    pub address: Option<Address>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub price: Option<i16>,
    pub accommodations: Option<Accommodations>,
    pub business_hours: Option<WeeklyHours>,
    pub kid_friendly_hours: Option<WeeklyHours>,
}

// ============================================================================
// Accommodations
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PetFriendly {
    pub water_stations: bool,
    pub indoor_spaces: bool,
    pub outdoor_spaces: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FriendlyKidAges {
    pub toddlers: bool,
    pub young_kids: bool,
    pub teens: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KidFoodDrinks {
    pub kid_friendly_food: bool,
    pub kid_friendly_drinks: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Games {
    pub indoor: bool,
    pub outdoor: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChildAccommodations {
    pub games: Games,
    pub seating: bool,
    pub stroller_space: bool,
}

/// Amenities offered by a location; every flag defaults to `false`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Accommodations {
    pub pet_friendly: PetFriendly,
    pub friendly_kid_ages: FriendlyKidAges,
    pub kid_food_drinks: KidFoodDrinks,
    pub changing_stations: bool,
    pub child_accommodations: ChildAccommodations,
}

// ============================================================================
// Accommodation filter
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PetFriendlyFilter {
    pub water_stations: Option<bool>,
    pub indoor_spaces: Option<bool>,
    pub outdoor_spaces: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FriendlyKidAgesFilter {
    pub toddlers: Option<bool>,
    pub young_kids: Option<bool>,
    pub teens: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KidFoodDrinksFilter {
    pub kid_friendly_food: Option<bool>,
    pub kid_friendly_drinks: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GamesFilter {
    pub indoor: Option<bool>,
    pub outdoor: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChildAccommodationsFilter {
    pub games: GamesFilter,
    pub seating: Option<bool>,
    pub stroller_space: Option<bool>,
}

/// Accommodation constraints for a search.
///
/// Mirrors [`Accommodations`] with optional leaves. Each supplied leaf must
/// equal the location's flag; unset leaves are ignored.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AccommodationFilter {
    pub pet_friendly: PetFriendlyFilter,
    pub friendly_kid_ages: FriendlyKidAgesFilter,
    pub kid_food_drinks: KidFoodDrinksFilter,
    pub changing_stations: Option<bool>,
    pub child_accommodations: ChildAccommodationsFilter,
}

fn leaf_matches(wanted: Option<bool>, actual: bool) -> bool {
    wanted.map_or(true, |w| w == actual)
}

fn insert_path(node: &mut Map<String, Value>, path: &[&str], key: &str, value: bool) {
    match path.split_first() {
        None => {
            node.insert(key.to_string(), Value::Bool(value));
        }
        Some((head, rest)) => {
            let child = node
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = child {
                insert_path(map, rest, key, value);
            }
        }
    }
}

impl AccommodationFilter {
    /// Every leaf as (parent path, key, wanted)
    fn leaves(&self) -> [(&'static [&'static str], &'static str, Option<bool>); 13] {
        let pet = &self.pet_friendly;
        let ages = &self.friendly_kid_ages;
        let food = &self.kid_food_drinks;
        let child = &self.child_accommodations;
        [
            (&["pet_friendly"], "water_stations", pet.water_stations),
            (&["pet_friendly"], "indoor_spaces", pet.indoor_spaces),
            (&["pet_friendly"], "outdoor_spaces", pet.outdoor_spaces),
            (&["friendly_kid_ages"], "toddlers", ages.toddlers),
            (&["friendly_kid_ages"], "young_kids", ages.young_kids),
            (&["friendly_kid_ages"], "teens", ages.teens),
            (&["kid_food_drinks"], "kid_friendly_food", food.kid_friendly_food),
            (&["kid_food_drinks"], "kid_friendly_drinks", food.kid_friendly_drinks),
            (&[], "changing_stations", self.changing_stations),
            (&["child_accommodations", "games"], "indoor", child.games.indoor),
            (&["child_accommodations", "games"], "outdoor", child.games.outdoor),
            (&["child_accommodations"], "seating", child.seating),
            (&["child_accommodations"], "stroller_space", child.stroller_space),
        ]
    }

    /// Whether no leaf is constrained
    pub fn is_empty(&self) -> bool {
        self.leaves().iter().all(|(_, _, wanted)| wanted.is_none())
    }

    /// Whether `accommodations` satisfies every supplied leaf
    pub fn matches(&self, accommodations: &Accommodations) -> bool {
        let pet = &accommodations.pet_friendly;
        let ages = &accommodations.friendly_kid_ages;
        let food = &accommodations.kid_food_drinks;
        let child = &accommodations.child_accommodations;

        let f = self;
        leaf_matches(f.pet_friendly.water_stations, pet.water_stations)
            && leaf_matches(f.pet_friendly.indoor_spaces, pet.indoor_spaces)
            && leaf_matches(f.pet_friendly.outdoor_spaces, pet.outdoor_spaces)
            && leaf_matches(f.friendly_kid_ages.toddlers, ages.toddlers)
            && leaf_matches(f.friendly_kid_ages.young_kids, ages.young_kids)
            && leaf_matches(f.friendly_kid_ages.teens, ages.teens)
            && leaf_matches(f.kid_food_drinks.kid_friendly_food, food.kid_friendly_food)
            && leaf_matches(f.kid_food_drinks.kid_friendly_drinks, food.kid_friendly_drinks)
            && leaf_matches(f.changing_stations, accommodations.changing_stations)
            && leaf_matches(f.child_accommodations.games.indoor, child.games.indoor)
            && leaf_matches(f.child_accommodations.games.outdoor, child.games.outdoor)
            && leaf_matches(f.child_accommodations.seating, child.seating)
            && leaf_matches(f.child_accommodations.stroller_space, child.stroller_space)
    }

    /// JSON document for a JSONB `@>` containment prefilter
    pub fn to_containment_json(&self) -> Value {
        let mut root = Map::new();
        for (path, key, wanted) in self.leaves() {
            if let Some(wanted) = wanted {
                insert_path(&mut root, path, key, wanted);
            }
        }
        Value::Object(root)
    }
}
