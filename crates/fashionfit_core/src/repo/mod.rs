//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define one data access contract per collection (users, reviews,
//!   products, id counters).
//! - Isolate SQLite query details from store/business orchestration.
//!
//! # Invariants
//! - Repositories refuse connections that are not fully migrated.
//! - Storage constraints (UNIQUE, CHECK, FOREIGN KEY) back every invariant
//!   the stores check up front; violations surface as typed `RepoError`s.
//! - Repositories never hold locks across calls; each call is one statement
//!   or one short transaction.

pub mod counter_repo;
pub mod error;
pub mod product_repo;
pub mod review_repo;
mod schema;
pub mod user_repo;
