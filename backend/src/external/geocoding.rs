//! Geocoding client
//!
//! Resolves street addresses and zip codes to coordinates through the
//! MapQuest geocoding API. Only the first-ranked match is used.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use shared::types::GeoPoint;

use super::with_timeout;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Match granularities too coarse to place a brewery
const COARSE_QUALITIES: [&str; 3] = ["COUNTRY", "STATE", "COUNTY"];

/// MapQuest geocoding client
#[derive(Clone)]
pub struct GeocodingClient {
    client: Client,
    api_key: String,
    base_url: String,
    country: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct MapQuestResponse {
    #[serde(default)]
    results: Vec<MapQuestResult>,
}

#[derive(Debug, Deserialize)]
struct MapQuestResult {
    #[serde(default)]
    locations: Vec<MapQuestLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapQuestLocation {
    lat_lng: MapQuestLatLng,
    #[serde(default)]
    geocode_quality: String,
}

#[derive(Debug, Deserialize)]
struct MapQuestLatLng {
    lat: f64,
    lng: f64,
}

impl GeocodingClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.geocoding.api_key.clone(),
            base_url: config.geocoding.base_url.clone(),
            country: config.geocoding.country.clone(),
            timeout: config.external.timeout(),
        }
    }

    /// Coordinates of a free-text address
    pub async fn geocode(&self, address: &str) -> AppResult<GeoPoint> {
        with_timeout("geocoding", self.timeout, self.lookup(address)).await
    }

    /// Coordinates of a zip code, biased to the configured country
    pub async fn geocode_zip(&self, zip_code: &str) -> AppResult<GeoPoint> {
        let query = format!("{} {}", zip_code, self.country);
        self.geocode(&query).await
    }

    async fn lookup(&self, address: &str) -> AppResult<GeoPoint> {
        let url = format!("{}/address", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("location", address),
                ("maxResults", "1"),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Geocoding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Geocoding API error: {} - {}",
                status, body
            )));
        }

        let data: MapQuestResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse geocoding response: {}", e))
        })?;

        first_match(data).ok_or_else(|| AppError::UnresolvableAddress(address.to_string()))
    }
}

fn first_match(data: MapQuestResponse) -> Option<GeoPoint> {
    let location = data.results.into_iter().next()?.locations.into_iter().next()?;
    if COARSE_QUALITIES.contains(&location.geocode_quality.as_str()) {
        return None;
    }

    let point = GeoPoint::new(location.lat_lng.lat, location.lat_lng.lng);
    point.is_valid().then_some(point)
}
