//! Review models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's review of a location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub location_id: Uuid,
    /// Location name at the time of posting
    pub location_name: String,
    pub poster_id: Uuid,
    pub poster_name: String,
    pub message: String,
    pub rating: Decimal,
    pub posted_at: DateTime<Utc>,
}

/// Input for posting a review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewInput {
    pub message: String,
    pub rating: Decimal,
}

/// Input for editing a review; absent fields are kept
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReviewInput {
    pub message: Option<String>,
    pub rating: Option<Decimal>,
}
