//! Location HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::services::LocationService;
use crate::AppState;
use shared::models::{CreateLocationInput, UpdateLocationInput};

#[derive(Serialize)]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub expires_in: u64,
}

/// Location detail (public)
pub async fn get_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = LocationService::new(state.db.clone());

    match service.get_detail(&state.images, location_id).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a location owned by the caller
pub async fn create_location(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateLocationInput>,
) -> impl IntoResponse {
    let service = LocationService::new(state.db.clone());

    match service
        .create(&state.geocoder, &state.timezones, user.user_id, input)
        .await
    {
        Ok(location) => (StatusCode::CREATED, Json(location)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_location(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(location_id): Path<Uuid>,
    Json(input): Json<UpdateLocationInput>,
) -> impl IntoResponse {
    let service = LocationService::new(state.db.clone());

    match service
        .update(&state.geocoder, &state.timezones, user.user_id, location_id, input)
        .await
    {
        Ok(location) => (StatusCode::OK, Json(location)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_location(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(location_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = LocationService::new(state.db.clone());

    match service.delete(user.user_id, location_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Locations owned by the caller
pub async fn list_my_locations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> impl IntoResponse {
    let service = LocationService::new(state.db.clone());

    match service.list_mine(user.user_id).await {
        Ok(locations) => (
            StatusCode::OK,
            Json(serde_json::json!({ "locations": locations })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Presigned PUT URL for the location photo
pub async fn image_upload_url(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(location_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = LocationService::new(state.db.clone());

    match service
        .image_upload_url(&state.images, user.user_id, location_id)
        .await
    {
        Ok(upload_url) => (
            StatusCode::OK,
            Json(UploadUrlResponse {
                upload_url,
                expires_in: state.config.storage.url_expiry_secs,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
