//! Catalog product reference.
//!
//! The full product shape belongs to the external catalog; core mirrors only
//! what existence checks and review foreign keys need.

use crate::clock::Timestamp;
use crate::model::ids::ProductId;
use serde::{Deserialize, Serialize};

/// Local mirror of one catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductRecord {
    pub product_id: ProductId,
    pub name: String,
    pub created_time: Timestamp,
}
