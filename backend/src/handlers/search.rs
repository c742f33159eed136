//! Location search handler

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::services::search::SearchParams;
use crate::services::GeoSearchEngine;
use crate::AppState;
use shared::search::SearchResults;

/// Nearby locations matching the query filters (public)
pub async fn search_locations(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchResults>> {
    let origin = params.origin()?;
    let criteria = params.criteria(&state.config.search)?;

    let engine = GeoSearchEngine::new(state.db.clone());
    let results = engine
        .search(&state.geocoder, &state.images, origin, criteria)
        .await?;

    Ok(Json(results))
}
