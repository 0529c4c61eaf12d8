//! Review lifecycle use-cases.
//!
//! # Responsibility
//! - Validate and persist review submissions.
//! - List reviews by product or user and delete them by id.
//!
//! # Invariants
//! - Validation order is fixed: missing fields, rating range, user reference,
//!   product reference. Nothing is allocated or written before all pass.
//! - Delete is not idempotent: a second delete reports `NotFound`.

use crate::clock::Clock;
use crate::model::ids::IdSpace;
use crate::model::review::{Rating, Review, ReviewField, ReviewSubmission};
use crate::repo::counter_repo::{CounterRepository, SqliteCounterRepository};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::product_repo::{ProductRepository, SqliteProductRepository};
use crate::repo::review_repo::{ReviewListQuery, ReviewRepository, SqliteReviewRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::service::error::{
    EntityKind, ReferenceError, StoreError, StoreResult, ValidationError,
};
use crate::service::id_allocator::IdentifierAllocator;
use crate::service::validators::ReferentialValidator;
use log::{info, warn};
use rusqlite::Connection;
use std::sync::Arc;

/// Review store over SQLite repositories sharing one connection.
pub type SqliteReviewStore<'conn> = ReviewStore<
    SqliteReviewRepository<'conn>,
    SqliteUserRepository<'conn>,
    SqliteProductRepository<'conn>,
    SqliteCounterRepository<'conn>,
>;

/// Owns the create/list/delete lifecycle of reviews.
pub struct ReviewStore<R, U, P, C>
where
    R: ReviewRepository,
    U: UserRepository,
    P: ProductRepository,
    C: CounterRepository,
{
    reviews: R,
    references: ReferentialValidator<U, P>,
    allocator: IdentifierAllocator<C>,
    clock: Arc<dyn Clock>,
}

impl<'conn> SqliteReviewStore<'conn> {
    /// Builds a store whose repositories all use `conn`.
    pub fn open(conn: &'conn Connection, clock: Arc<dyn Clock>) -> RepoResult<Self> {
        Ok(Self::new(
            SqliteReviewRepository::try_new(conn)?,
            ReferentialValidator::new(
                SqliteUserRepository::try_new(conn)?,
                SqliteProductRepository::try_new(conn)?,
            ),
            IdentifierAllocator::new(SqliteCounterRepository::try_new(conn)?),
            clock,
        ))
    }
}

impl<R, U, P, C> ReviewStore<R, U, P, C>
where
    R: ReviewRepository,
    U: UserRepository,
    P: ProductRepository,
    C: CounterRepository,
{
    pub fn new(
        reviews: R,
        references: ReferentialValidator<U, P>,
        allocator: IdentifierAllocator<C>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reviews,
            references,
            allocator,
            clock,
        }
    }

    /// Validates and stores one review.
    ///
    /// # Errors
    /// - `Validation(MissingFields)` naming every absent field.
    /// - `Validation(RatingOutOfRange)` for ratings outside `1..=5`.
    /// - `Reference(UnknownUser)` / `Reference(UnknownProduct)`.
    /// - `StorageUnavailable` when storage stays locked past the timeout.
    pub fn submit(&self, submission: &ReviewSubmission) -> StoreResult<Review> {
        match self.try_submit(submission) {
            Ok(review) => {
                info!(
                    "event=review_submit module=review_store status=ok review_id={} product_id={} user_id={} rating={}",
                    review.review_id,
                    review.product_id,
                    review.user_id,
                    review.rating.value()
                );
                Ok(review)
            }
            Err(err) => {
                warn!(
                    "event=review_submit module=review_store status=error error_code={} error={}",
                    err.kind(),
                    err
                );
                Err(err)
            }
        }
    }

    fn try_submit(&self, submission: &ReviewSubmission) -> StoreResult<Review> {
        let missing = submission.missing_fields();
        if !missing.is_empty() {
            return Err(missing_fields_error(&missing));
        }
        let (Some(product_id), Some(user_id), Some(rating), Some(review_text)) = (
            submission.product_id.as_deref(),
            submission.user_id.as_deref(),
            submission.rating,
            submission.review_text.as_deref(),
        ) else {
            return Err(missing_fields_error(&missing));
        };

        let rating =
            Rating::new(rating).map_err(|err| ValidationError::RatingOutOfRange(err.0))?;
        self.references.require_user(user_id)?;
        self.references.require_product(product_id)?;

        self.allocator.next_with(IdSpace::Reviews, |review_id| {
            let review = Review {
                review_id,
                product_id: product_id.to_string(),
                user_id: user_id.to_string(),
                rating,
                review_text: review_text.to_string(),
                created_time: self.clock.now(),
            };

            match self.reviews.insert_review(&review) {
                Ok(()) => Ok(review),
                // A referenced record vanished between the check and the insert.
                Err(RepoError::ForeignKeyViolation) => {
                    self.references.require_user(user_id)?;
                    Err(ReferenceError::UnknownProduct(product_id.to_string()).into())
                }
                Err(err) => Err(err.into()),
            }
        })
    }

    /// Lists reviews of one product; empty when there are none.
    pub fn list_by_product(&self, product_id: &str) -> StoreResult<Vec<Review>> {
        Ok(self
            .reviews
            .list_reviews(&ReviewListQuery::by_product(product_id))?)
    }

    /// Lists reviews written by one user.
    ///
    /// # Errors
    /// - `Reference(UnknownUser)` when the user does not exist.
    pub fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<Review>> {
        self.references.require_user(user_id)?;
        Ok(self
            .reviews
            .list_reviews(&ReviewListQuery::by_user(user_id))?)
    }

    /// Deletes one review.
    ///
    /// # Errors
    /// - `NotFound` when no review has `review_id`, including a repeat delete.
    pub fn delete(&self, review_id: &str) -> StoreResult<()> {
        let deleted = self.reviews.delete_review(review_id)?;
        if deleted == 0 {
            return Err(StoreError::not_found(EntityKind::Review, review_id));
        }

        info!("event=review_delete module=review_store status=ok review_id={review_id}");
        Ok(())
    }
}

fn missing_fields_error(missing: &[ReviewField]) -> StoreError {
    ValidationError::MissingFields(missing.iter().map(|field| field.as_str()).collect()).into()
}
