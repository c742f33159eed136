//! Geo search engine
//!
//! PostGIS narrows the candidate set by radius, price, rating, amenities and
//! open windows. The shared pipeline then makes the authoritative pass
//! (including the fuzzy name match) and ranks by distance.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::task::JoinSet;
use uuid::Uuid;

use super::hours::BusinessHoursStore;
use crate::config::SearchConfig;
use crate::error::{AppError, AppResult};
use crate::external::{GeocodingClient, ImageFolder, ImageSigner};
use shared::hours::week_seconds_at;
use shared::models::{Accommodations, Address, AccommodationFilter, ScheduleKind};
use shared::search::{
    miles_to_meters, run_pipeline, SearchCandidate, SearchCriteria, SearchResults, MILES_PER_METER,
};
use shared::types::GeoPoint;
use shared::validation::{validate_price_tier, validate_zip_code};

/// Query string of `GET /locations/search`.
///
/// `accommodations` carries an [`AccommodationFilter`] as JSON, since nested
/// filters do not survive form encoding.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub zip_code: Option<String>,
    /// Miles
    pub max_distance: Option<f64>,
    pub max_price: Option<i16>,
    pub min_rating: Option<Decimal>,
    pub accommodations: Option<String>,
    #[serde(default)]
    pub open_now: bool,
    #[serde(default)]
    pub kid_friendly_now: bool,
    pub name: Option<String>,
}

/// Where distances are measured from
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    Point(GeoPoint),
    ZipCode(String),
}

impl SearchParams {
    /// Coordinates win over a zip code; neither is an error
    pub fn origin(&self) -> AppResult<Origin> {
        match (self.lat, self.long, self.zip_code.as_deref().map(str::trim)) {
            (Some(lat), Some(long), _) => {
                let point = GeoPoint::new(lat, long);
                if !point.is_valid() {
                    return Err(AppError::validation("lat", "Coordinates are out of range"));
                }
                Ok(Origin::Point(point))
            }
            (_, _, Some(zip)) if !zip.is_empty() => {
                validate_zip_code(zip).map_err(|m| AppError::validation("zip_code", m))?;
                Ok(Origin::ZipCode(zip.to_string()))
            }
            _ => Err(AppError::MissingLocation),
        }
    }

    pub fn criteria(&self, config: &SearchConfig) -> AppResult<SearchCriteria> {
        let max_distance_miles = self.max_distance.unwrap_or(config.default_radius_miles);
        if !max_distance_miles.is_finite() || max_distance_miles <= 0.0 {
            return Err(AppError::validation(
                "max_distance",
                "Distance must be a positive number of miles",
            ));
        }

        if let Some(price) = self.max_price {
            validate_price_tier(price).map_err(|m| AppError::validation("max_price", m))?;
        }
        if let Some(rating) = self.min_rating {
            if rating < Decimal::ZERO || rating > Decimal::from(5) {
                return Err(AppError::validation("min_rating", "Rating must be between 0 and 5"));
            }
        }

        let accommodations = match self.accommodations.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => serde_json::from_str::<AccommodationFilter>(raw)
                .map_err(|e| {
                    AppError::validation("accommodations", format!("Invalid filter: {}", e))
                })?,
            _ => AccommodationFilter::default(),
        };

        Ok(SearchCriteria {
            max_distance_miles,
            max_price: self.max_price,
            min_rating: self.min_rating,
            accommodations,
            open_now: self.open_now,
            kid_friendly_now: self.kid_friendly_now,
            name_query: self.name.clone(),
            fuzzy_threshold: config.fuzzy_threshold,
        })
    }
}

/// A zip code that geocodes to nothing leaves the search without an origin
fn zip_lookup_error(err: AppError) -> AppError {
    match err {
        AppError::UnresolvableAddress(_) => AppError::MissingLocation,
        other => other,
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CandidateRow {
    id: Uuid,
    name: String,
    street: String,
    city: String,
    state: String,
    zip_code: String,
    price: i16,
    rating: Decimal,
    review_count: i64,
    accommodations: Json<Accommodations>,
    distance_miles: f64,
}

#[derive(Clone)]
pub struct GeoSearchEngine {
    db: PgPool,
    hours: BusinessHoursStore,
}

impl GeoSearchEngine {
    pub fn new(db: PgPool) -> Self {
        let hours = BusinessHoursStore::new(db.clone());
        Self { db, hours }
    }

    pub async fn search(
        &self,
        geocoder: &GeocodingClient,
        images: &ImageSigner,
        origin: Origin,
        criteria: SearchCriteria,
    ) -> AppResult<SearchResults> {
        let point = match origin {
            Origin::Point(point) => point,
            Origin::ZipCode(zip) => geocoder
                .geocode_zip(&zip)
                .await
                .map_err(zip_lookup_error)?,
        };
        let week_seconds = week_seconds_at(Utc::now());

        let rows = self.prefilter(point, &criteria, week_seconds).await?;
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut windows = self.hours.windows_for(&ids).await?;

        let candidates: Vec<SearchCandidate> = rows
            .into_iter()
            .map(|row| {
                let w = windows.remove(&row.id).unwrap_or_default();
                SearchCandidate {
                    id: row.id,
                    name: row.name,
                    address: Address {
                        street: row.street,
                        city: row.city,
                        state: row.state,
                        zip_code: row.zip_code,
                    },
                    price: row.price,
                    rating: row.rating,
                    review_count: row.review_count,
                    accommodations: row.accommodations.0,
                    distance_miles: row.distance_miles,
                    general_windows: w.general,
                    kid_friendly_windows: w.kid_friendly,
                }
            })
            .collect();

        let prefiltered = candidates.len();
        let mut results = run_pipeline(candidates, &criteria, week_seconds);
        tracing::debug!(
            prefiltered,
            matched = results.len(),
            radius_miles = criteria.max_distance_miles,
            name_query = criteria.name_query().unwrap_or(""),
            "Search pipeline finished"
        );

        let mut signing = JoinSet::new();
        for (index, summary) in results.iter().enumerate() {
            let images = images.clone();
            let id = summary.id;
            signing.spawn(async move {
                (index, images.download_url_or_none(ImageFolder::Locations, id).await)
            });
        }
        while let Some(joined) = signing.join_next().await {
            match joined {
                Ok((index, url)) => results[index].image_url = url,
                Err(e) => tracing::warn!("Image signing task failed: {}", e),
            }
        }

        Ok(SearchResults::new(results))
    }

    async fn prefilter(
        &self,
        origin: GeoPoint,
        criteria: &SearchCriteria,
        week_seconds: i64,
    ) -> AppResult<Vec<CandidateRow>> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT l.id, l.name, l.street, l.city, l.state, l.zip_code,
                   l.price, l.rating, l.review_count, l.accommodations,
                   ST_Distance(l.geog, o.geog) * $3 AS distance_miles
            FROM locations l,
                 (SELECT ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography AS geog) o
            WHERE ST_DWithin(l.geog, o.geog, $4)
              AND ($5::SMALLINT IS NULL OR l.price <= $5)
              AND ($6::NUMERIC IS NULL OR l.rating >= $6)
              AND l.accommodations @> $7
              AND (NOT $8 OR EXISTS (
                    SELECT 1 FROM location_hours h
                    WHERE h.location_id = l.id AND h.kind = $10
                      AND h.open_seconds <= $12 AND h.close_seconds >= $12))
              AND (NOT $9 OR EXISTS (
                    SELECT 1 FROM location_hours h
                    WHERE h.location_id = l.id AND h.kind = $11
                      AND h.open_seconds <= $12 AND h.close_seconds >= $12))
            ORDER BY distance_miles
            "#,
        )
        .bind(origin.longitude)
        .bind(origin.latitude)
        .bind(MILES_PER_METER)
        .bind(miles_to_meters(criteria.max_distance_miles))
        .bind(criteria.max_price)
        .bind(criteria.min_rating)
        .bind(Json(criteria.accommodations.to_containment_json()))
        .bind(criteria.open_now)
        .bind(criteria.kid_friendly_now)
        .bind(ScheduleKind::General.as_str())
        .bind(ScheduleKind::KidFriendly.as_str())
        .bind(week_seconds)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}
