//! Running rating aggregate for a location

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest possible average
pub const MAX_RATING: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Decimal places kept on the stored average
const AVERAGE_SCALE: u32 = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    #[error("cannot remove a rating from a location with no reviews")]
    NoReviews,
}

/// Mean rating and live review count of one location.
///
/// Updated incrementally; never recomputed from the full review set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub average: Decimal,
    pub count: i64,
}

impl Default for RatingAggregate {
    fn default() -> Self {
        Self {
            average: Decimal::ZERO,
            count: 0,
        }
    }
}

impl RatingAggregate {
    pub fn new(average: Decimal, count: i64) -> Self {
        Self { average, count }
    }

    /// Fold a new review into the mean
    pub fn record(&self, rating: Decimal) -> Self {
        let count = self.count + 1;
        let total = self.average * Decimal::from(self.count) + rating;
        Self {
            average: normalize(total / Decimal::from(count)),
            count,
        }
    }

    /// Take a removed review back out of the mean.
    ///
    /// The last removal resets the average to zero.
    pub fn retract(&self, rating: Decimal) -> Result<Self, RatingError> {
        if self.count <= 0 {
            return Err(RatingError::NoReviews);
        }

        let count = self.count - 1;
        if count == 0 {
            return Ok(Self::default());
        }

        let total = self.average * Decimal::from(self.count) - rating;
        Ok(Self {
            average: normalize(total / Decimal::from(count)),
            count,
        })
    }

    /// An edited review: retract the old rating, record the new one
    pub fn replace(&self, old: Decimal, new: Decimal) -> Result<Self, RatingError> {
        Ok(self.retract(old)?.record(new))
    }
}

fn normalize(average: Decimal) -> Decimal {
    average
        .round_dp(AVERAGE_SCALE)
        .clamp(Decimal::ZERO, MAX_RATING)
        .normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn record_then_retract() {
        let agg = RatingAggregate::default().record(d(4)).record(d(2));
        assert_eq!(agg, RatingAggregate::new(d(3), 2));

        let agg = agg.retract(d(2)).unwrap();
        assert_eq!(agg, RatingAggregate::new(d(4), 1));
    }

    #[test]
    fn last_removal_resets_to_zero() {
        let agg = RatingAggregate::default().record(Decimal::new(45, 1));
        let agg = agg.retract(Decimal::new(45, 1)).unwrap();
        assert_eq!(agg, RatingAggregate::default());
    }

    #[test]
    fn retract_from_empty_is_an_error() {
        assert_eq!(
            RatingAggregate::default().retract(d(3)),
            Err(RatingError::NoReviews)
        );
    }

    #[test]
    fn replace_is_retract_then_record() {
        let agg = RatingAggregate::default().record(d(5)).record(d(1));
        let edited = agg.replace(d(1), d(3)).unwrap();
        assert_eq!(edited, RatingAggregate::new(d(4), 2));
    }

    #[test]
    fn average_is_clamped() {
        // A drifted stored average cannot escape the rating scale
        let agg = RatingAggregate::new(Decimal::new(50001, 4), 2);
        let agg = agg.record(d(5));
        assert!(agg.average <= MAX_RATING);

        let low = RatingAggregate::new(Decimal::ZERO, 3).retract(d(5)).unwrap();
        assert_eq!(low.average, Decimal::ZERO);
    }

    #[test]
    fn repeating_thirds_are_rounded() {
        let agg = RatingAggregate::default()
            .record(d(1))
            .record(d(1))
            .record(d(2));
        assert_eq!(agg.average, Decimal::new(13333333333, 10));
    }
}
