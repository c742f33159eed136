//! Route definitions for the brewery directory API

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - account
        .nest("/users", user_routes(state.clone()))
        // Mixed routes - locations and their reviews
        .nest("/locations", location_routes(state.clone()))
        // Protected routes - review edits
        .nest("/reviews", review_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route("/forgot-password", post(handlers::forgot_password))
        .route("/reset-password", post(handlers::reset_password))
}

/// Account routes (protected)
fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::get_me).put(handlers::update_me))
        .route("/me/password", put(handlers::change_password))
        .route("/me/email", put(handlers::change_email))
        .route("/me/phone", put(handlers::change_phone))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Location routes. Reads are public; writes need a signed-in user.
fn location_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/search", get(handlers::search_locations))
        .route("/:id", get(handlers::get_location))
        .route("/:id/reviews", get(handlers::list_reviews));

    let protected = Router::new()
        .route("/", post(handlers::create_location))
        .route("/mine", get(handlers::list_my_locations))
        .route(
            "/:id",
            put(handlers::update_location).delete(handlers::delete_location),
        )
        .route("/:id/image-upload-url", get(handlers::image_upload_url))
        .route("/:id/reviews", post(handlers::create_review))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

/// Review routes (protected, poster only)
fn review_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/:id",
            put(handlers::update_review).delete(handlers::delete_review),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
