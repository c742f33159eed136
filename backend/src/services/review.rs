//! Review service
//!
//! Every review write and its rating aggregate update share one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::rating::RatingAggregator;
use crate::error::{AppError, AppResult};
use shared::models::{CreateReviewInput, Review, UpdateReviewInput};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::validate_review_rating;

const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Clone)]
pub struct ReviewService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    location_id: Uuid,
    location_name: String,
    poster_id: Uuid,
    poster_name: String,
    message: String,
    rating: Decimal,
    posted_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            location_id: row.location_id,
            location_name: row.location_name,
            poster_id: row.poster_id,
            poster_name: row.poster_name,
            message: row.message,
            rating: row.rating,
            posted_at: row.posted_at,
        }
    }
}

const REVIEW_COLUMNS: &str =
    "id, location_id, location_name, poster_id, poster_name, message, rating, posted_at";

impl ReviewService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Reviews of a location, newest first
    pub async fn list_for_location(
        &self,
        location_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Review>> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM locations WHERE id = $1)")
            .bind(location_id)
            .fetch_one(&self.db)
            .await?;
        if !exists {
            return Err(AppError::LocationNotFound(location_id));
        }

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE location_id = $1")
                .bind(location_id)
                .fetch_one(&self.db)
                .await?;

        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            r#"
            SELECT {}
            FROM reviews
            WHERE location_id = $1
            ORDER BY posted_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
            REVIEW_COLUMNS
        ))
        .bind(location_id)
        .bind(i64::from(pagination.limit()))
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Review::from).collect(),
            pagination: PaginationMeta::new(&pagination, total.max(0) as u64),
        })
    }

    /// Post a review. The location's name and the poster's name are
    /// snapshotted onto the review.
    pub async fn create(
        &self,
        poster_id: Uuid,
        location_id: Uuid,
        input: CreateReviewInput,
    ) -> AppResult<Review> {
        validate_message(&input.message)?;
        validate_review_rating(input.rating).map_err(|m| AppError::validation("rating", m))?;

        let draft = ReviewDraft {
            location_id,
            poster_id,
            message: input.message.trim().to_string(),
            rating: input.rating,
        };

        let mut tx = self.db.begin().await?;

        // Locks the location row before anything else touches it
        let aggregate =
            RatingAggregator::on_review_created(&mut *tx, location_id, draft.rating).await?;
        let row = Self::insert(&mut *tx, &draft).await?;

        tx.commit().await?;

        tracing::info!(
            review_id = %row.id,
            %location_id,
            rating = %row.rating,
            review_count = aggregate.count,
            "Review posted"
        );
        Ok(row.into())
    }

    /// Edit a review. The old review is deleted and its rating retracted,
    /// then the edited review is posted as a new one.
    pub async fn update(
        &self,
        poster_id: Uuid,
        review_id: Uuid,
        input: UpdateReviewInput,
    ) -> AppResult<Review> {
        if let Some(message) = &input.message {
            validate_message(message)?;
        }
        if let Some(rating) = input.rating {
            validate_review_rating(rating).map_err(|m| AppError::validation("rating", m))?;
        }

        let mut tx = self.db.begin().await?;

        let current = Self::fetch_for_poster(&mut tx, poster_id, review_id).await?;
        let draft = current.edited(input);

        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(&mut *tx)
            .await?;
        RatingAggregator::on_review_removed(&mut *tx, current.location_id, current.rating).await?;
        RatingAggregator::on_review_created(&mut *tx, draft.location_id, draft.rating).await?;
        let row = Self::insert(&mut *tx, &draft).await?;

        tx.commit().await?;

        tracing::info!(
            old_review_id = %review_id,
            review_id = %row.id,
            location_id = %row.location_id,
            "Review replaced"
        );
        Ok(row.into())
    }

    pub async fn delete(&self, poster_id: Uuid, review_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let current = Self::fetch_for_poster(&mut tx, poster_id, review_id).await?;
        RatingAggregator::on_review_removed(&mut *tx, current.location_id, current.rating).await?;

        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%review_id, location_id = %current.location_id, "Review deleted");
        Ok(())
    }

    async fn insert(conn: &mut PgConnection, draft: &ReviewDraft) -> AppResult<ReviewRow> {
        sqlx::query_as::<_, ReviewRow>(&format!(
            r#"
            INSERT INTO reviews (location_id, location_name, poster_id, poster_name, message, rating)
            SELECT l.id, l.name, u.id, u.first_name || ' ' || u.last_name, $3, $4
            FROM locations l, users u
            WHERE l.id = $1 AND u.id = $2
            RETURNING {}
            "#,
            REVIEW_COLUMNS
        ))
        .bind(draft.location_id)
        .bind(draft.poster_id)
        .bind(&draft.message)
        .bind(draft.rating)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    async fn fetch_for_poster(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        poster_id: Uuid,
        review_id: Uuid,
    ) -> AppResult<ReviewRow> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {} FROM reviews WHERE id = $1 FOR UPDATE",
            REVIEW_COLUMNS
        ))
        .bind(review_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Review".to_string()))?;

        if row.poster_id != poster_id {
            return Err(AppError::NotOwner("review".to_string()));
        }
        Ok(row)
    }
}

/// Content of a review about to be inserted; the id and posting time come
/// from the database
#[derive(Debug, Clone, PartialEq)]
struct ReviewDraft {
    location_id: Uuid,
    poster_id: Uuid,
    message: String,
    rating: Decimal,
}

impl ReviewRow {
    /// The review that replaces this one after an edit
    fn edited(&self, input: UpdateReviewInput) -> ReviewDraft {
        ReviewDraft {
            location_id: self.location_id,
            poster_id: self.poster_id,
            message: input
                .message
                .map(|m| m.trim().to_string())
                .unwrap_or_else(|| self.message.clone()),
            rating: input.rating.unwrap_or(self.rating),
        }
    }
}

fn validate_message(message: &str) -> AppResult<()> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::validation("message", "Review cannot be empty"));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::validation("message", "Review is too long"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_must_have_content() {
        assert!(validate_message("Great sours").is_ok());
        assert!(validate_message("  \n ").is_err());
        assert!(validate_message(&"a".repeat(MAX_MESSAGE_CHARS + 1)).is_err());
    }

    fn posted() -> ReviewRow {
        ReviewRow {
            id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            location_name: "Hop Yard".to_string(),
            poster_id: Uuid::new_v4(),
            poster_name: "Sam Brewer".to_string(),
            message: "Solid IPAs".to_string(),
            rating: Decimal::from(4),
            posted_at: Utc::now(),
        }
    }

    #[test]
    fn edit_keeps_author_and_location() {
        let current = posted();
        let draft = current.edited(UpdateReviewInput {
            message: Some("  Even better on cask  ".to_string()),
            rating: Some(Decimal::new(45, 1)),
        });

        assert_eq!(draft.location_id, current.location_id);
        assert_eq!(draft.poster_id, current.poster_id);
        assert_eq!(draft.message, "Even better on cask");
        assert_eq!(draft.rating, Decimal::new(45, 1));
    }

    #[test]
    fn absent_fields_carry_over() {
        let current = posted();
        let draft = current.edited(UpdateReviewInput::default());
        assert_eq!(draft.message, current.message);
        assert_eq!(draft.rating, current.rating);
    }

    /// Needs a PostGIS database in `DATABASE_URL`; skipped otherwise
    async fn test_pool() -> Option<PgPool> {
        let url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("DATABASE_URL not set, skipping review database test");
                return None;
            }
        };
        let pool = PgPool::connect(&url).await.ok()?;
        sqlx::migrate!("./migrations").run(&pool).await.ok()?;
        Some(pool)
    }

    async fn seed_location(pool: &PgPool) -> (Uuid, Uuid) {
        let user_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, phone_number, zip_code, birth_date)
            VALUES ($1, 'unused', 'Sam', 'Brewer', '555-123-4567', '28801', '1990-04-01')
            RETURNING id
            "#,
        )
        .bind(format!("{}@example.com", Uuid::new_v4()))
        .fetch_one(pool)
        .await
        .unwrap();

        let location_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO locations (owner_id, name, street, city, state, zip_code, geog,
                                   phone_number, price, timezone)
            VALUES ($1, 'Hop Yard', '1 Main St', 'Asheville', 'NC', '28801',
                    ST_SetSRID(ST_MakePoint(-82.55, 35.59), 4326)::geography,
                    '555-123-4567', 2, 'America/New_York')
            RETURNING id
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap();

        (user_id, location_id)
    }

    #[tokio::test]
    async fn edited_review_is_posted_as_a_new_row() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let (user_id, location_id) = seed_location(&pool).await;
        let service = ReviewService::new(pool.clone());

        let original = service
            .create(
                user_id,
                location_id,
                CreateReviewInput {
                    message: "Solid IPAs".to_string(),
                    rating: Decimal::from(2),
                },
            )
            .await
            .unwrap();

        let edited = service
            .update(
                user_id,
                original.id,
                UpdateReviewInput {
                    message: None,
                    rating: Some(Decimal::from(4)),
                },
            )
            .await
            .unwrap();

        assert_ne!(edited.id, original.id);
        assert_eq!(edited.message, "Solid IPAs");

        let old_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE id = $1")
            .bind(original.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(old_left, 0);

        let (rating, count): (Decimal, i64) =
            sqlx::query_as("SELECT rating, review_count FROM locations WHERE id = $1")
                .bind(location_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(rating, Decimal::from(4));
        assert_eq!(count, 1);
    }
}
