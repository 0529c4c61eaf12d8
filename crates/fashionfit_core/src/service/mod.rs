//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Translate repository failures into the `StoreError` taxonomy.

pub mod catalog;
pub mod error;
pub mod id_allocator;
pub mod rating_aggregator;
pub mod review_store;
pub mod user_store;
pub mod validators;
