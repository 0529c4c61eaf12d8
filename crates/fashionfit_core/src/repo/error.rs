//! Repository error shared by every collection.

use crate::db::DbError;
use rusqlite::ffi;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for record repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    UniqueViolation { table: String, column: String },
    /// A FOREIGN KEY constraint rejected the write.
    ForeignKeyViolation,
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl RepoError {
    /// Returns whether the storage was temporarily unavailable (lock wait
    /// exceeded the busy timeout). A write reported this way may or may not
    /// have been applied.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Db(err) => err.is_busy(),
            _ => false,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UniqueViolation { table, column } => {
                write!(f, "unique constraint violated on {table}.{column}")
            }
            Self::ForeignKeyViolation => write!(f, "foreign key constraint violated"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, message) = &value {
            match code.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    if let Some((table, column)) =
                        message.as_deref().and_then(parse_unique_violation)
                    {
                        return Self::UniqueViolation { table, column };
                    }
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Self::ForeignKeyViolation,
                _ => {}
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Extracts `(table, column)` from `UNIQUE constraint failed: users.email`.
fn parse_unique_violation(message: &str) -> Option<(String, String)> {
    let (_, target) = message.split_once("constraint failed: ")?;
    let first = target.split(", ").next()?;
    let (table, column) = first.split_once('.')?;
    Some((table.trim().to_string(), column.trim().to_string()))
}
