//! Review and rating model.
//!
//! # Invariants
//! - A `Rating` always holds a value in `1..=5`.
//! - `Review` is immutable after creation; the only lifecycle step is delete.

use crate::clock::Timestamp;
use crate::model::ids::{ProductId, ReviewId, UserId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Rating value outside the accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingOutOfRange(pub i64);

impl Display for RatingOutOfRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rating must be between {MIN_RATING} and {MAX_RATING}, got {}",
            self.0
        )
    }
}

impl Error for RatingOutOfRange {}

/// Star rating in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> Result<Self, RatingOutOfRange> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            // Range check above keeps the cast lossless.
            Ok(Self(value as u8))
        } else {
            Err(RatingOutOfRange(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i64 {
    fn from(value: Rating) -> Self {
        i64::from(value.0)
    }
}

/// Review fields as named by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewField {
    ProductId,
    UserId,
    Rating,
    ReviewText,
}

impl ReviewField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProductId => "ProductId",
            Self::UserId => "UserId",
            Self::Rating => "Rating",
            Self::ReviewText => "ReviewText",
        }
    }
}

/// Persisted review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Review {
    pub review_id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: Rating,
    #[serde(alias = "Review")]
    pub review_text: String,
    pub created_time: Timestamp,
}

/// Review submission body; absent fields stay `None`.
///
/// `ReviewText` may be empty, but must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReviewSubmission {
    pub product_id: Option<ProductId>,
    pub user_id: Option<UserId>,
    pub rating: Option<i64>,
    #[serde(alias = "Review")]
    pub review_text: Option<String>,
}

impl ReviewSubmission {
    pub fn new(
        product_id: impl Into<ProductId>,
        user_id: impl Into<UserId>,
        rating: i64,
        review_text: impl Into<String>,
    ) -> Self {
        Self {
            product_id: Some(product_id.into()),
            user_id: Some(user_id.into()),
            rating: Some(rating),
            review_text: Some(review_text.into()),
        }
    }

    /// Required fields that are absent (or blank identifiers), in order.
    pub fn missing_fields(&self) -> Vec<ReviewField> {
        let mut missing = Vec::new();
        if is_blank(self.product_id.as_deref()) {
            missing.push(ReviewField::ProductId);
        }
        if is_blank(self.user_id.as_deref()) {
            missing.push(ReviewField::UserId);
        }
        if self.rating.is_none() {
            missing.push(ReviewField::Rating);
        }
        if self.review_text.is_none() {
            missing.push(ReviewField::ReviewText);
        }
        missing
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |text| text.trim().is_empty())
}

/// Count and mean rating for one product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    #[serde(rename = "totalReviews")]
    pub count: u64,
    /// Mean rating rounded to two decimals, half away from zero.
    #[serde(rename = "averageRating")]
    pub average: f64,
}

impl RatingSummary {
    pub fn empty() -> Self {
        Self {
            count: 0,
            average: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Rating, RatingOutOfRange, RatingSummary, Review, ReviewField, ReviewSubmission};
    use serde_json::json;

    #[test]
    fn rating_accepts_one_through_five_only() {
        for value in 1..=5 {
            assert_eq!(i64::from(Rating::new(value).unwrap()), value);
        }
        assert_eq!(Rating::new(0), Err(RatingOutOfRange(0)));
        assert_eq!(Rating::new(6), Err(RatingOutOfRange(6)));
        assert_eq!(Rating::new(-3), Err(RatingOutOfRange(-3)));
    }

    #[test]
    fn submission_accepts_review_key_alias() {
        let submission: ReviewSubmission = serde_json::from_value(json!({
            "ProductId": "P01",
            "UserId": "001",
            "Rating": 4,
            "Review": "fits well",
        }))
        .unwrap();
        assert!(submission.missing_fields().is_empty());
        assert_eq!(submission.review_text.as_deref(), Some("fits well"));
    }

    #[test]
    fn submission_lists_every_missing_field() {
        let submission = ReviewSubmission {
            user_id: Some("  ".to_string()),
            ..ReviewSubmission::default()
        };
        assert_eq!(
            submission.missing_fields(),
            vec![
                ReviewField::ProductId,
                ReviewField::UserId,
                ReviewField::Rating,
                ReviewField::ReviewText,
            ]
        );
    }

    #[test]
    fn review_rejects_out_of_range_rating_when_deserialized() {
        let result = serde_json::from_value::<Review>(json!({
            "ReviewId": "001",
            "ProductId": "P01",
            "UserId": "001",
            "Rating": 9,
            "ReviewText": "",
            "CreatedTime": "2024-05-01T10:00:00.000000+07:00",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn summary_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(RatingSummary::empty()).unwrap();
        assert_eq!(value, json!({"totalReviews": 0, "averageRating": 0.0}));
    }
}
