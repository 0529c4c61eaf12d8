//! Catalog mirror repository.
//!
//! # Responsibility
//! - Answer product existence checks for review submission.
//! - Keep a minimal local copy of catalog products (id + name).
//!
//! # Invariants
//! - Upserting an existing product keeps its original `created_time`.
//! - Deleting a product cascades to its reviews.

use crate::clock::format_timestamp;
use crate::model::product::ProductRecord;
use crate::repo::error::RepoResult;
use crate::repo::schema::{ensure_connection_ready, parse_timestamp_column, RequiredTable};
use rusqlite::{params, Connection};

const PRODUCT_TABLES: &[RequiredTable] = &[RequiredTable {
    name: "products",
    columns: &["product_id", "name", "created_time"],
}];

/// Repository interface for catalog product references.
pub trait ProductRepository {
    fn product_exists(&self, product_id: &str) -> RepoResult<bool>;
    fn upsert_product(&self, product: &ProductRecord) -> RepoResult<()>;
    fn list_products(&self) -> RepoResult<Vec<ProductRecord>>;
    /// Deletes one product; returns deleted row count.
    fn delete_product(&self, product_id: &str) -> RepoResult<usize>;
}

/// SQLite-backed catalog mirror.
#[derive(Clone, Copy)]
pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, PRODUCT_TABLES)?;
        Ok(Self { conn })
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn product_exists(&self, product_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM products WHERE product_id = ?1);",
            [product_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn upsert_product(&self, product: &ProductRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO products (product_id, name, created_time)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (product_id) DO UPDATE SET name = excluded.name;",
            params![
                product.product_id.as_str(),
                product.name.as_str(),
                format_timestamp(&product.created_time),
            ],
        )?;
        Ok(())
    }

    fn list_products(&self) -> RepoResult<Vec<ProductRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT product_id, name, created_time
             FROM products
             ORDER BY product_id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut products = Vec::new();
        while let Some(row) = rows.next()? {
            products.push(ProductRecord {
                product_id: row.get("product_id")?,
                name: row.get("name")?,
                created_time: parse_timestamp_column(row, "created_time")?,
            });
        }
        Ok(products)
    }

    fn delete_product(&self, product_id: &str) -> RepoResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM products WHERE product_id = ?1;", [product_id])?;
        Ok(deleted)
    }
}
