//! Store-level error taxonomy.
//!
//! Every store operation returns either its payload or one of these kinds.
//! Only `StorageUnavailable` is eligible for caller-side retry.

use crate::credential::HashError;
use crate::model::user::{UniqueUserField, UserField};
use crate::repo::error::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Malformed or incomplete caller input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required fields absent (or blank), in reporting order.
    MissingFields(Vec<&'static str>),
    /// Rating outside `1..=5`.
    RatingOutOfRange(i64),
    /// Update named fields that do not exist on a user.
    UnknownFields(Vec<String>),
    /// Update supplied an empty value for a field.
    BlankField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields(fields) => write!(f, "missing fields: {}", fields.join(", ")),
            Self::RatingOutOfRange(value) => {
                write!(f, "rating must be between 1 and 5, got {value}")
            }
            Self::UnknownFields(fields) => write!(f, "unknown fields: {}", fields.join(", ")),
            Self::BlankField(field) => write!(f, "field `{field}` must not be blank"),
        }
    }
}

/// Dangling reference to another entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    UnknownUser(String),
    UnknownProduct(String),
}

impl ReferenceError {
    /// Name of the referencing field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::UnknownUser(_) => "UserId",
            Self::UnknownProduct(_) => "ProductId",
        }
    }
}

impl Display for ReferenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownUser(id) => write!(f, "unknown UserId `{id}`"),
            Self::UnknownProduct(id) => write!(f, "unknown ProductId `{id}`"),
        }
    }
}

/// Entity kinds reported by `StoreError::NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Review,
    Product,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Review => "review",
            Self::Product => "product",
        }
    }
}

/// Error returned by every store operation.
#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    Conflict(UniqueUserField),
    Reference(ReferenceError),
    NotFound { entity: EntityKind, id: String },
    ImmutableField(Vec<UserField>),
    /// Deliberately carries no detail about which credential was wrong.
    InvalidCredentials,
    /// Lock wait exceeded the storage timeout; a write may have applied.
    StorageUnavailable(RepoError),
    /// Non-transient persistence fault.
    Storage(RepoError),
    /// Hashing backend failure.
    Hashing(HashError),
}

impl StoreError {
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Stable snake_case code for request layers to map onto transport
    /// status codes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Reference(_) => "reference",
            Self::NotFound { .. } => "not_found",
            Self::ImmutableField(_) => "immutable_field",
            Self::InvalidCredentials => "invalid_credentials",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::Storage(_) => "storage",
            Self::Hashing(_) => "hashing",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::Conflict(field) => write!(f, "{field} already exists"),
            Self::Reference(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{} not found: {id}", entity.as_str()),
            Self::ImmutableField(fields) => {
                let names: Vec<&str> = fields.iter().map(|field| field.as_str()).collect();
                write!(f, "fields cannot be modified: {}", names.join(", "))
            }
            Self::InvalidCredentials => write!(f, "invalid username or password"),
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::Hashing(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) | Self::Storage(err) => Some(err),
            Self::Hashing(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ReferenceError> for StoreError {
    fn from(value: ReferenceError) -> Self {
        Self::Reference(value)
    }
}

impl From<HashError> for StoreError {
    fn from(value: HashError) -> Self {
        Self::Hashing(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        if value.is_transient() {
            return Self::StorageUnavailable(value);
        }
        if let RepoError::UniqueViolation { table, column } = &value {
            if table == "users" {
                if let Some(field) = UniqueUserField::from_column(column) {
                    return Self::Conflict(field);
                }
            }
        }
        Self::Storage(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreError, ValidationError};
    use crate::model::user::UniqueUserField;
    use crate::repo::error::RepoError;

    #[test]
    fn unique_violation_on_users_maps_to_conflict() {
        let err = StoreError::from(RepoError::UniqueViolation {
            table: "users".to_string(),
            column: "email".to_string(),
        });
        assert!(matches!(err, StoreError::Conflict(UniqueUserField::Email)));
        assert_eq!(err.kind(), "conflict");
    }

    #[test]
    fn other_unique_violations_stay_storage_errors() {
        let err = StoreError::from(RepoError::UniqueViolation {
            table: "reviews".to_string(),
            column: "review_id".to_string(),
        });
        assert!(matches!(err, StoreError::Storage(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn missing_fields_display_lists_names() {
        let err = StoreError::from(ValidationError::MissingFields(vec!["Email", "Address"]));
        assert_eq!(err.to_string(), "validation failed: missing fields: Email, Address");
    }
}
