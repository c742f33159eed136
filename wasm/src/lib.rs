//! WebAssembly helpers for the brewery directory
//!
//! Lets the browser check and preview business hours before submitting a
//! location:
//! - Hour string validation and display normalization
//! - Encoding to week-relative UTC windows
//! - "Open at" checks against encoded windows
//! - Price labels and fuzzy name scores

use chrono::{DateTime, TimeZone, Utc};
use wasm_bindgen::prelude::*;

use shared::fuzzy::partial_token_set_ratio;
use shared::hours::{
    display_hours, encode_at, parse_timezone, week_seconds_at, weekday_from_index, DayHours,
    OpenWindows,
};
use shared::models::{price_label, Schedule, WeeklyHours};

#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str(concat!(
        "brewery-wasm ",
        env!("CARGO_PKG_VERSION")
    )));
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

fn instant_from_millis(epoch_ms: f64) -> Result<DateTime<Utc>, JsValue> {
    Utc.timestamp_millis_opt(epoch_ms as i64)
        .single()
        .ok_or_else(|| js_error("Timestamp is out of range"))
}

/// Whether a day string such as `"9:00AM - 5:00PM"` is well formed
#[wasm_bindgen]
pub fn validate_day_hours(raw: &str) -> bool {
    raw.parse::<DayHours>().is_ok()
}

/// Display form of a day string (`":00"` dropped)
#[wasm_bindgen]
pub fn format_day_hours(raw: &str) -> String {
    display_hours(raw)
}

/// Encode one day (0 = Sunday) against the week containing `reference_ms`.
/// Returns the windows as JSON.
#[wasm_bindgen]
pub fn encode_day_hours(
    raw: &str,
    timezone: &str,
    weekday: u8,
    reference_ms: f64,
) -> Result<String, JsValue> {
    let tz = parse_timezone(timezone).map_err(js_error)?;
    let weekday = weekday_from_index(weekday).map_err(js_error)?;
    let encoded =
        encode_at(raw, tz, weekday, instant_from_millis(reference_ms)?).map_err(js_error)?;

    serde_json::to_string(&encoded.windows()).map_err(js_error)
}

/// Encode a whole week of hours (`WeeklyHours` JSON). Returns the windows as
/// JSON; the first bad day fails the whole schedule.
#[wasm_bindgen]
pub fn encode_weekly_hours(
    hours_json: &str,
    timezone: &str,
    reference_ms: f64,
) -> Result<String, JsValue> {
    let hours: WeeklyHours = serde_json::from_str(hours_json)
        .map_err(|e| js_error(format!("Invalid hours JSON: {}", e)))?;
    let schedule =
        Schedule::build(timezone, hours, instant_from_millis(reference_ms)?).map_err(js_error)?;

    serde_json::to_string(&schedule.windows).map_err(js_error)
}

/// Week-relative UTC second of an instant
#[wasm_bindgen]
pub fn week_seconds_at_millis(epoch_ms: f64) -> Result<f64, JsValue> {
    Ok(week_seconds_at(instant_from_millis(epoch_ms)?) as f64)
}

/// Whether encoded windows (JSON) contain the given week second
#[wasm_bindgen]
pub fn is_open_at(windows_json: &str, week_seconds: f64) -> Result<bool, JsValue> {
    let windows: OpenWindows = serde_json::from_str(windows_json)
        .map_err(|e| js_error(format!("Invalid windows JSON: {}", e)))?;
    Ok(windows.is_open_at(week_seconds as i64))
}

/// `$`..`$$$$` for tiers 1-4
#[wasm_bindgen]
pub fn price_tier_label(price: i16) -> String {
    price_label(price)
}

/// Fuzzy similarity (0-100) between a search query and a location name
#[wasm_bindgen]
pub fn fuzzy_name_score(query: &str, name: &str) -> u8 {
    partial_token_set_ratio(query, name)
}
