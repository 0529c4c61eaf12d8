//! Core record store for FashionFit.
//!
//! Owns users, reviews and the catalog mirror together with the integrity
//! rules between them: sequential ids, reference checks, uniqueness, rating
//! aggregation and credential handling.

pub mod clock;
pub mod config;
pub mod credential;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{CivilClock, Clock, ManualClock, Timestamp};
pub use config::{ConfigError, CoreConfig};
pub use credential::{Argon2Hasher, CredentialHasher, HashError};
pub use db::{open_db, open_db_in_memory, open_db_with_timeout, DbError};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::ids::{IdSpace, ProductId, ReviewId, UserId};
pub use model::product::ProductRecord;
pub use model::review::{Rating, RatingSummary, Review, ReviewSubmission};
pub use model::user::{UniqueUserField, UserField, UserProfile, UserRegistration, UserUpdate};
pub use repo::error::{RepoError, RepoResult};
pub use service::catalog::{CatalogService, SqliteCatalogService};
pub use service::error::{EntityKind, ReferenceError, StoreError, StoreResult, ValidationError};
pub use service::id_allocator::IdentifierAllocator;
pub use service::rating_aggregator::{RatingAggregator, SqliteRatingAggregator};
pub use service::review_store::{ReviewStore, SqliteReviewStore};
pub use service::user_store::{SqliteUserStore, UserStore};
pub use service::validators::{ReferentialValidator, UniquenessGuard};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
