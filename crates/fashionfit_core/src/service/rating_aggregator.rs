//! Product rating summaries.
//!
//! # Invariants
//! - Read-only; never mutates the review space.
//! - Averages are rounded to two decimals, half away from zero, computed in
//!   integer arithmetic from the rating sum so results are exact.
//! - A product without reviews summarizes to `{count: 0, average: 0}`.

use crate::model::review::RatingSummary;
use crate::repo::error::RepoResult;
use crate::repo::review_repo::{ReviewRepository, SqliteReviewRepository};
use crate::service::error::StoreResult;
use rusqlite::Connection;

pub type SqliteRatingAggregator<'conn> = RatingAggregator<SqliteReviewRepository<'conn>>;

/// Computes count and mean rating per product.
#[derive(Clone)]
pub struct RatingAggregator<R: ReviewRepository> {
    reviews: R,
}

impl<'conn> SqliteRatingAggregator<'conn> {
    pub fn open(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self::new(SqliteReviewRepository::try_new(conn)?))
    }
}

impl<R: ReviewRepository> RatingAggregator<R> {
    pub fn new(reviews: R) -> Self {
        Self { reviews }
    }

    pub fn summarize(&self, product_id: &str) -> StoreResult<RatingSummary> {
        let Some(group) = self.reviews.aggregate_ratings(product_id)? else {
            return Ok(RatingSummary::empty());
        };

        Ok(RatingSummary {
            count: group.review_count,
            average: rounded_mean(group.rating_sum, group.review_count),
        })
    }
}

/// Mean of `count` ratings summing to `sum`, rounded to hundredths with
/// ties away from zero. Returns 0 for an empty set.
pub fn rounded_mean(sum: u64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let hundredths = (u128::from(sum) * 200 + u128::from(count)) / (u128::from(count) * 2);
    hundredths as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::rounded_mean;

    #[test]
    fn exact_means_are_unchanged() {
        assert_eq!(rounded_mean(12, 3), 4.0);
        assert_eq!(rounded_mean(3, 2), 1.5);
        assert_eq!(rounded_mean(5, 1), 5.0);
    }

    #[test]
    fn repeating_means_round_to_hundredths() {
        assert_eq!(rounded_mean(4, 3), 1.33);
        assert_eq!(rounded_mean(5, 3), 1.67);
        assert_eq!(rounded_mean(20, 7), 2.86);
    }

    #[test]
    fn ties_round_away_from_zero() {
        // 1.125 -> 1.13
        assert_eq!(rounded_mean(9, 8), 1.13);
        // 4.005 would drift below the tie in floating point
        assert_eq!(rounded_mean(801, 200), 4.01);
    }

    #[test]
    fn empty_set_is_zero() {
        assert_eq!(rounded_mean(0, 0), 0.0);
    }
}
