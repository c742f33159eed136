//! Error handling for the brewery directory server
//!
//! Every failure leaves the server as
//! `{ "error": { "code", "message", "field"? } }` with a matching status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::hours::HoursError;
use shared::models::RatingError;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is signed in but does not own the resource
    #[error("Not the owner of {0}")]
    NotOwner(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Location errors
    #[error("Location not found: {0}")]
    LocationNotFound(Uuid),

    #[error("Address could not be resolved: {0}")]
    UnresolvableAddress(String),

    #[error("Search needs coordinates or a zip code")]
    MissingLocation,

    // External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("External service timed out: {0}")]
    ExternalTimeout(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[source] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_CREDENTIALS", "Invalid email or password"),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("TOKEN_EXPIRED", "Token has expired"),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_TOKEN", "Invalid token"),
            ),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", message.clone()),
            ),
            AppError::NotOwner(resource) => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "UNAUTHORIZED_OWNER",
                    format!("Only the owner can modify this {}", resource),
                ),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", message.clone()).with_field(field.clone()),
            ),
            AppError::ValidationError(message) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", message.clone()),
            ),
            AppError::InvalidSchedule(message) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("INVALID_SCHEDULE", message.clone()),
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "DUPLICATE_ENTRY",
                    format!("A record with this {} already exists", field),
                )
                .with_field(field.clone()),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::LocationNotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("LOCATION_NOT_FOUND", format!("Location {} not found", id)),
            ),
            AppError::UnresolvableAddress(address) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "UNRESOLVABLE_ADDRESS",
                    format!("Could not find coordinates for '{}'", address),
                ),
            ),
            AppError::MissingLocation => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "MISSING_LOCATION",
                    "Provide latitude and longitude or a zip code",
                ),
            ),
            AppError::ExternalService(message) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new(
                    "EXTERNAL_SERVICE_ERROR",
                    format!("External service error: {}", message),
                ),
            ),
            AppError::ExternalTimeout(service) => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorDetail::new(
                    "EXTERNAL_SERVICE_TIMEOUT",
                    format!("{} did not respond in time", service),
                ),
            ),
            AppError::StorageError(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new("STORAGE_ERROR", format!("Storage error: {}", message)),
            ),
            AppError::Configuration(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "CONFIGURATION_ERROR",
                    format!("Configuration error: {}", message),
                ),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            ),
            AppError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", message.clone()),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = db_err.constraint().unwrap_or("value").to_string();
                return AppError::DuplicateEntry(field);
            }
        }
        AppError::DatabaseError(err)
    }
}

impl From<HoursError> for AppError {
    fn from(err: HoursError) -> Self {
        AppError::InvalidSchedule(err.to_string())
    }
}

impl From<RatingError> for AppError {
    fn from(err: RatingError) -> Self {
        AppError::Internal(format!("Rating aggregate out of sync: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let first = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                (field.to_string(), message)
            });

        match first {
            Some((field, message)) => AppError::Validation { field, message },
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_mismatch_is_forbidden() {
        let (status, detail) = AppError::NotOwner("location".to_string()).status_and_detail();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(detail.code, "UNAUTHORIZED_OWNER");
    }

    #[test]
    fn missing_location_is_bad_request() {
        let (status, detail) = AppError::MissingLocation.status_and_detail();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail.code, "MISSING_LOCATION");
    }

    #[test]
    fn hours_errors_become_invalid_schedule() {
        let err: AppError = HoursError::InvalidWeekday(9).into();
        let (status, detail) = err.status_and_detail();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail.code, "INVALID_SCHEDULE");
        assert!(detail.message.contains('9'));
    }

    #[test]
    fn validation_carries_field() {
        let (_, detail) = AppError::validation("zip_code", "Zip code must be 5 digits")
            .status_and_detail();
        assert_eq!(detail.field.as_deref(), Some("zip_code"));
    }
}
