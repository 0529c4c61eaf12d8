//! Referential and uniqueness checks run before inserts.
//!
//! # Invariants
//! - Lookups are never cached; referenced collections may change between
//!   calls.
//! - Uniqueness checks are advisory. The UNIQUE indexes on `users` are the
//!   backstop, and both paths report the same `Conflict` error.

use crate::model::user::UniqueUserField;
use crate::repo::product_repo::ProductRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::error::{ReferenceError, StoreError, StoreResult};

/// Collections that may be referenced by a dependent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSpace {
    Users,
    Products,
}

/// Existence checks for foreign-key-like references.
#[derive(Clone)]
pub struct ReferentialValidator<U: UserRepository, P: ProductRepository> {
    users: U,
    products: P,
}

impl<U: UserRepository, P: ProductRepository> ReferentialValidator<U, P> {
    pub fn new(users: U, products: P) -> Self {
        Self { users, products }
    }

    pub fn exists(&self, space: ReferenceSpace, id: &str) -> StoreResult<bool> {
        let exists = match space {
            ReferenceSpace::Users => self.users.user_exists(id)?,
            ReferenceSpace::Products => self.products.product_exists(id)?,
        };
        Ok(exists)
    }

    /// Fails with `Reference(UnknownUser)` unless the user exists.
    pub fn require_user(&self, user_id: &str) -> StoreResult<()> {
        if self.exists(ReferenceSpace::Users, user_id)? {
            Ok(())
        } else {
            Err(ReferenceError::UnknownUser(user_id.to_string()).into())
        }
    }

    /// Fails with `Reference(UnknownProduct)` unless the product exists.
    pub fn require_product(&self, product_id: &str) -> StoreResult<()> {
        if self.exists(ReferenceSpace::Products, product_id)? {
            Ok(())
        } else {
            Err(ReferenceError::UnknownProduct(product_id.to_string()).into())
        }
    }
}

/// Uniqueness checks over the user space.
#[derive(Clone)]
pub struct UniquenessGuard<U: UserRepository> {
    users: U,
}

impl<U: UserRepository> UniquenessGuard<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    /// Returns whether no user holds `value` in `field`.
    pub fn is_unique(&self, field: UniqueUserField, value: &str) -> StoreResult<bool> {
        Ok(self.users.find_user_id_by_field(field, value)?.is_none())
    }

    /// Like `is_unique`, but a match on `user_id` itself does not count.
    pub fn is_unique_except(
        &self,
        field: UniqueUserField,
        value: &str,
        user_id: &str,
    ) -> StoreResult<bool> {
        let holder = self.users.find_user_id_by_field(field, value)?;
        Ok(holder.map_or(true, |holder| holder == user_id))
    }

    /// Fails with `Conflict(field)` when `value` is taken by another user.
    pub fn ensure_unique(
        &self,
        field: UniqueUserField,
        value: &str,
        except_user_id: Option<&str>,
    ) -> StoreResult<()> {
        let unique = match except_user_id {
            Some(user_id) => self.is_unique_except(field, value, user_id)?,
            None => self.is_unique(field, value)?,
        };
        if unique {
            Ok(())
        } else {
            Err(StoreError::Conflict(field))
        }
    }
}
