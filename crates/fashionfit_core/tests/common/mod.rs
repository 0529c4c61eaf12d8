#![allow(dead_code)]

use chrono::{Duration, TimeZone};
use fashionfit_core::clock::civil_offset;
use fashionfit_core::{
    CredentialHasher, HashError, ManualClock, SqliteCatalogService, SqliteReviewStore,
    SqliteUserStore, UserRegistration,
};
use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const PLAIN_PREFIX: &str = "plain$";

/// Deterministic hasher that counts how often `verify` runs.
#[derive(Default)]
pub struct PlainHasher {
    verify_calls: AtomicUsize,
}

impl PlainHasher {
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl CredentialHasher for PlainHasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        Ok(format!("{PLAIN_PREFIX}{plaintext}"))
    }

    fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool, HashError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let stored = hashed
            .strip_prefix(PLAIN_PREFIX)
            .ok_or_else(|| HashError::MalformedHash(hashed.to_string()))?;
        Ok(stored == plaintext)
    }
}

/// Clock starting at 2024-05-01 10:00:00 +07:00.
pub fn fixed_clock() -> Arc<ManualClock> {
    let start = civil_offset()
        .with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
        .single()
        .unwrap();
    Arc::new(ManualClock::new(start))
}

pub fn tick(clock: &ManualClock) {
    clock.advance(Duration::seconds(1));
}

pub fn user_store<'conn>(
    conn: &'conn Connection,
    hasher: Arc<PlainHasher>,
    clock: Arc<ManualClock>,
) -> SqliteUserStore<'conn> {
    SqliteUserStore::open(conn, hasher, clock).unwrap()
}

pub fn review_store(conn: &Connection, clock: Arc<ManualClock>) -> SqliteReviewStore<'_> {
    SqliteReviewStore::open(conn, clock).unwrap()
}

pub fn seed_products(conn: &Connection, clock: Arc<ManualClock>, product_ids: &[&str]) {
    let catalog = SqliteCatalogService::open(conn, clock).unwrap();
    for product_id in product_ids {
        catalog
            .add_product(product_id, &format!("Product {product_id}"))
            .unwrap();
    }
}

/// Complete registration body for `username`, with a derived email.
pub fn registration(username: &str) -> UserRegistration {
    UserRegistration {
        username: Some(username.to_string()),
        password: Some(format!("{username}-secret")),
        email: Some(format!("{username}@example.com")),
        full_name: Some(format!("{username} Example")),
        address: Some("12 Sukhumvit Rd, Bangkok".to_string()),
        date_of_birth: Some("1995-02-14".to_string()),
        phone_number: Some("0812345678".to_string()),
    }
}
