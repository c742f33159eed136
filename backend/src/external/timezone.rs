//! Timezone lookup by position through TimeZoneDB

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use shared::hours::parse_timezone;
use shared::types::GeoPoint;

use super::with_timeout;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// TimeZoneDB client
#[derive(Clone)]
pub struct TimezoneClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeZoneDbResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    zone_name: String,
}

impl TimezoneClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.timezone.api_key.clone(),
            base_url: config.timezone.base_url.clone(),
            timeout: config.external.timeout(),
        }
    }

    /// IANA timezone for a location.
    ///
    /// A timezone supplied by the caller is used as-is once it checks out
    /// against the IANA database; otherwise the coordinates are looked up.
    pub async fn resolve(&self, supplied: Option<&str>, point: GeoPoint) -> AppResult<String> {
        if let Some(name) = supplied.map(str::trim).filter(|s| !s.is_empty()) {
            return Ok(parse_timezone(name)?.name().to_string());
        }

        let zone = with_timeout("timezone lookup", self.timeout, self.lookup(point)).await?;
        Ok(parse_timezone(&zone)?.name().to_string())
    }

    async fn lookup(&self, point: GeoPoint) -> AppResult<String> {
        let url = format!("{}/get-time-zone", self.base_url);
        let lat = point.latitude.to_string();
        let lng = point.longitude.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("format", "json"),
                ("by", "position"),
                ("lat", lat.as_str()),
                ("lng", lng.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Timezone request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Timezone API error: {} - {}",
                status, body
            )));
        }

        let data: TimeZoneDbResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse timezone response: {}", e))
        })?;

        zone_name(data)
    }
}

fn zone_name(data: TimeZoneDbResponse) -> AppResult<String> {
    if data.status != "OK" || data.zone_name.is_empty() {
        return Err(AppError::InvalidSchedule(format!(
            "No timezone found for location: {}",
            data.message
        )));
    }
    Ok(data.zone_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> AppResult<String> {
        zone_name(serde_json::from_value(json).unwrap())
    }

    #[test]
    fn ok_response_yields_zone() {
        let zone = parse(serde_json::json!({
            "status": "OK",
            "message": "",
            "zoneName": "America/New_York",
            "gmtOffset": -14400
        }))
        .unwrap();
        assert_eq!(zone, "America/New_York");
    }

    #[test]
    fn failed_lookup_is_invalid_schedule() {
        let result = parse(serde_json::json!({
            "status": "FAILED",
            "message": "Record not found."
        }));
        assert!(matches!(result, Err(AppError::InvalidSchedule(_))));
    }
}
