//! Review HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::services::ReviewService;
use crate::AppState;
use shared::models::{CreateReviewInput, UpdateReviewInput};
use shared::types::Pagination;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<PageQuery> for Pagination {
    fn from(query: PageQuery) -> Self {
        let defaults = Pagination::default();
        Pagination {
            page: query.page.unwrap_or(defaults.page),
            per_page: query.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Reviews of a location, newest first (public)
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let service = ReviewService::new(state.db.clone());

    match service.list_for_location(location_id, query.into()).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(location_id): Path<Uuid>,
    Json(input): Json<CreateReviewInput>,
) -> impl IntoResponse {
    let service = ReviewService::new(state.db.clone());

    match service.create(user.user_id, location_id, input).await {
        Ok(review) => (StatusCode::CREATED, Json(review)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(review_id): Path<Uuid>,
    Json(input): Json<UpdateReviewInput>,
) -> impl IntoResponse {
    let service = ReviewService::new(state.db.clone());

    match service.update(user.user_id, review_id, input).await {
        Ok(review) => (StatusCode::OK, Json(review)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(review_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ReviewService::new(state.db.clone());

    match service.delete(user.user_id, review_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
