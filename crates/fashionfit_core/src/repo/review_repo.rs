//! Review repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/find/list/delete over the `reviews` collection.
//! - Provide the grouped rating aggregation used for product summaries.
//!
//! # Invariants
//! - `rating` is CHECK-constrained to `1..=5` at the storage layer.
//! - `product_id`/`user_id` are foreign keys with `ON DELETE CASCADE`.
//! - Lists are ordered by numeric review id, i.e. allocation order.

use crate::clock::format_timestamp;
use crate::model::ids::{ProductId, ReviewId, UserId};
use crate::model::review::{Rating, Review};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{ensure_connection_ready, parse_timestamp_column, RequiredTable};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const REVIEW_SELECT_SQL: &str = "SELECT
    review_id,
    product_id,
    user_id,
    rating,
    review_text,
    created_time
FROM reviews";

const REVIEW_TABLES: &[RequiredTable] = &[RequiredTable {
    name: "reviews",
    columns: &[
        "review_id",
        "product_id",
        "user_id",
        "rating",
        "review_text",
        "created_time",
    ],
}];

/// Filter options for listing reviews. Empty filter lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewListQuery {
    pub product_id: Option<ProductId>,
    pub user_id: Option<UserId>,
}

impl ReviewListQuery {
    pub fn by_product(product_id: impl Into<ProductId>) -> Self {
        Self {
            product_id: Some(product_id.into()),
            ..Self::default()
        }
    }

    pub fn by_user(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }
}

/// Grouped aggregation row for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingGroup {
    pub product_id: ProductId,
    pub review_count: u64,
    pub rating_sum: u64,
}

/// Repository interface for review records.
pub trait ReviewRepository {
    fn insert_review(&self, review: &Review) -> RepoResult<()>;
    fn find_review(&self, review_id: &str) -> RepoResult<Option<Review>>;
    fn list_reviews(&self, query: &ReviewListQuery) -> RepoResult<Vec<Review>>;
    /// Deletes one review; returns deleted row count.
    fn delete_review(&self, review_id: &str) -> RepoResult<usize>;
    /// Groups reviews of one product; `None` when it has no reviews.
    fn aggregate_ratings(&self, product_id: &str) -> RepoResult<Option<RatingGroup>>;
}

/// SQLite-backed review repository.
#[derive(Clone, Copy)]
pub struct SqliteReviewRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReviewRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REVIEW_TABLES)?;
        Ok(Self { conn })
    }
}

impl ReviewRepository for SqliteReviewRepository<'_> {
    fn insert_review(&self, review: &Review) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO reviews (
                review_id,
                product_id,
                user_id,
                rating,
                review_text,
                created_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                review.review_id.as_str(),
                review.product_id.as_str(),
                review.user_id.as_str(),
                i64::from(review.rating),
                review.review_text.as_str(),
                format_timestamp(&review.created_time),
            ],
        )?;
        Ok(())
    }

    fn find_review(&self, review_id: &str) -> RepoResult<Option<Review>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REVIEW_SELECT_SQL} WHERE review_id = ?1;"))?;
        let mut rows = stmt.query([review_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_review_row(row)?));
        }
        Ok(None)
    }

    fn list_reviews(&self, query: &ReviewListQuery) -> RepoResult<Vec<Review>> {
        let mut sql = format!("{REVIEW_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(product_id) = query.product_id.as_ref() {
            sql.push_str(" AND product_id = ?");
            bind_values.push(Value::Text(product_id.clone()));
        }

        if let Some(user_id) = query.user_id.as_ref() {
            sql.push_str(" AND user_id = ?");
            bind_values.push(Value::Text(user_id.clone()));
        }

        sql.push_str(" ORDER BY CAST(review_id AS INTEGER) ASC, review_id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut reviews = Vec::new();
        while let Some(row) = rows.next()? {
            reviews.push(parse_review_row(row)?);
        }

        Ok(reviews)
    }

    fn delete_review(&self, review_id: &str) -> RepoResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM reviews WHERE review_id = ?1;", [review_id])?;
        Ok(deleted)
    }

    fn aggregate_ratings(&self, product_id: &str) -> RepoResult<Option<RatingGroup>> {
        let group = self
            .conn
            .query_row(
                "SELECT product_id, COUNT(*), SUM(rating)
                 FROM reviews
                 WHERE product_id = ?1
                 GROUP BY product_id;",
                [product_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((product_id, count, sum)) = group else {
            return Ok(None);
        };
        let (Ok(review_count), Ok(rating_sum)) = (u64::try_from(count), u64::try_from(sum)) else {
            return Err(RepoError::InvalidData(format!(
                "negative rating aggregate count={count} sum={sum} for product `{product_id}`"
            )));
        };

        Ok(Some(RatingGroup {
            product_id,
            review_count,
            rating_sum,
        }))
    }
}

fn parse_review_row(row: &Row<'_>) -> RepoResult<Review> {
    let review_id: ReviewId = row.get("review_id")?;
    let rating_value: i64 = row.get("rating")?;
    let rating = Rating::new(rating_value).map_err(|err| {
        RepoError::InvalidData(format!("{err} in reviews.rating for `{review_id}`"))
    })?;

    Ok(Review {
        product_id: row.get("product_id")?,
        user_id: row.get("user_id")?,
        rating,
        review_text: row.get("review_text")?,
        created_time: parse_timestamp_column(row, "created_time")?,
        review_id,
    })
}
