//! Rating aggregator
//!
//! Keeps `locations.rating` and `locations.review_count` equal to the mean and
//! number of live reviews. Each update locks the location row and must run in
//! the transaction that writes the review.

use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::RatingAggregate;

pub struct RatingAggregator;

impl RatingAggregator {
    pub async fn on_review_created(
        conn: &mut PgConnection,
        location_id: Uuid,
        rating: Decimal,
    ) -> AppResult<RatingAggregate> {
        let current = Self::lock(conn, location_id).await?;
        let next = current.record(rating);
        Self::store(conn, location_id, next).await?;
        Ok(next)
    }

    pub async fn on_review_removed(
        conn: &mut PgConnection,
        location_id: Uuid,
        rating: Decimal,
    ) -> AppResult<RatingAggregate> {
        let current = Self::lock(conn, location_id).await?;
        let next = current.retract(rating)?;
        Self::store(conn, location_id, next).await?;
        Ok(next)
    }

    async fn lock(conn: &mut PgConnection, location_id: Uuid) -> AppResult<RatingAggregate> {
        let row = sqlx::query_as::<_, (Decimal, i64)>(
            "SELECT rating, review_count FROM locations WHERE id = $1 FOR UPDATE",
        )
        .bind(location_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::LocationNotFound(location_id))?;

        Ok(RatingAggregate::new(row.0, row.1))
    }

    async fn store(
        conn: &mut PgConnection,
        location_id: Uuid,
        aggregate: RatingAggregate,
    ) -> AppResult<()> {
        sqlx::query("UPDATE locations SET rating = $2, review_count = $3 WHERE id = $1")
            .bind(location_id)
            .bind(aggregate.average)
            .bind(aggregate.count)
            .execute(&mut *conn)
            .await?;

        tracing::debug!(
            %location_id,
            average = %aggregate.average,
            count = aggregate.count,
            "Rating aggregate updated"
        );
        Ok(())
    }
}
