//! Account handlers for the signed-in user

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::middleware::CurrentUser;
use crate::services::UserService;
use crate::AppState;
use shared::models::{ChangeEmailInput, ChangePasswordInput, ChangePhoneInput, UpdateProfileInput};

/// Profile of the caller
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> impl IntoResponse {
    let service = UserService::new(state.db.clone());

    match service.get_profile(&state.images, user.user_id).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<UpdateProfileInput>,
) -> impl IntoResponse {
    let service = UserService::new(state.db.clone());

    match service.update_profile(user.user_id, input).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<ChangePasswordInput>,
) -> impl IntoResponse {
    let service = UserService::new(state.db.clone());

    match service.change_password(user.user_id, input).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn change_email(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<ChangeEmailInput>,
) -> impl IntoResponse {
    let service = UserService::new(state.db.clone());

    match service.change_email(user.user_id, input).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn change_phone(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<ChangePhoneInput>,
) -> impl IntoResponse {
    let service = UserService::new(state.db.clone());

    match service.change_phone(user.user_id, input).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(e) => e.into_response(),
    }
}
