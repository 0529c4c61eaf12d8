//! Domain model for users, reviews and catalog references.
//!
//! # Responsibility
//! - Define canonical record shapes and caller-facing projections.
//! - Define request inputs in the shape callers send them.
//!
//! # Invariants
//! - Sequential identifiers are zero-padded decimal strings.
//! - Credential hashes live only on `UserRecord` and are never serialized.

pub mod ids;
pub mod product;
pub mod review;
pub mod user;
