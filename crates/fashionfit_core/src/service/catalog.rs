//! Catalog mirror maintenance.
//!
//! Products are owned by the external catalog. This service keeps the local
//! reference rows that review submission checks against.

use crate::clock::Clock;
use crate::model::product::ProductRecord;
use crate::repo::error::RepoResult;
use crate::repo::product_repo::{ProductRepository, SqliteProductRepository};
use crate::service::error::{EntityKind, StoreError, StoreResult, ValidationError};
use log::info;
use rusqlite::Connection;
use std::sync::Arc;

/// Catalog service over the SQLite product mirror.
pub type SqliteCatalogService<'conn> = CatalogService<SqliteProductRepository<'conn>>;

pub struct CatalogService<P: ProductRepository> {
    products: P,
    clock: Arc<dyn Clock>,
}

impl<'conn> SqliteCatalogService<'conn> {
    pub fn open(conn: &'conn Connection, clock: Arc<dyn Clock>) -> RepoResult<Self> {
        Ok(Self::new(SqliteProductRepository::try_new(conn)?, clock))
    }
}

impl<P: ProductRepository> CatalogService<P> {
    pub fn new(products: P, clock: Arc<dyn Clock>) -> Self {
        Self { products, clock }
    }

    /// Inserts or renames one product reference.
    ///
    /// # Errors
    /// - `Validation(MissingFields)` when id or name is blank.
    pub fn add_product(&self, product_id: &str, name: &str) -> StoreResult<ProductRecord> {
        let mut missing = Vec::new();
        if product_id.trim().is_empty() {
            missing.push("ProductId");
        }
        if name.trim().is_empty() {
            missing.push("Name");
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing).into());
        }

        let product = ProductRecord {
            product_id: product_id.to_string(),
            name: name.to_string(),
            created_time: self.clock.now(),
        };
        self.products.upsert_product(&product)?;

        info!("event=product_upsert module=catalog status=ok product_id={product_id}");
        Ok(product)
    }

    pub fn list_products(&self) -> StoreResult<Vec<ProductRecord>> {
        Ok(self.products.list_products()?)
    }

    /// Removes one product reference and, by cascade, its reviews.
    ///
    /// # Errors
    /// - `NotFound` when the product is not mirrored.
    pub fn remove_product(&self, product_id: &str) -> StoreResult<()> {
        if self.products.delete_product(product_id)? == 0 {
            return Err(StoreError::not_found(EntityKind::Product, product_id));
        }

        info!("event=product_delete module=catalog status=ok product_id={product_id}");
        Ok(())
    }
}
