//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/find/update/delete over the `users` collection.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `username` and `email` are backed by UNIQUE indexes; a racing duplicate
//!   surfaces as `RepoError::UniqueViolation`.
//! - Updates can only touch columns named by `UserColumn`; `user_id` and
//!   `created_time` are not writable through this API.
//! - Read paths reject invalid persisted timestamps instead of masking them.

use crate::clock::{format_timestamp, Timestamp};
use crate::model::ids::UserId;
use crate::model::user::{UniqueUserField, UserRecord};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{ensure_connection_ready, parse_timestamp_column, RequiredTable};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    user_id,
    username,
    email,
    password_hash,
    full_name,
    address,
    date_of_birth,
    phone_number,
    created_time,
    updated_time
FROM users";

const USER_TABLES: &[RequiredTable] = &[RequiredTable {
    name: "users",
    columns: &[
        "user_id",
        "username",
        "email",
        "password_hash",
        "full_name",
        "address",
        "date_of_birth",
        "phone_number",
        "created_time",
        "updated_time",
    ],
}];

/// Mutable user columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserColumn {
    Username,
    Email,
    PasswordHash,
    FullName,
    Address,
    DateOfBirth,
    PhoneNumber,
}

impl UserColumn {
    fn column_name(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::PasswordHash => "password_hash",
            Self::FullName => "full_name",
            Self::Address => "address",
            Self::DateOfBirth => "date_of_birth",
            Self::PhoneNumber => "phone_number",
        }
    }
}

/// Repository interface for user records.
pub trait UserRepository {
    fn insert_user(&self, user: &UserRecord) -> RepoResult<()>;
    fn find_user_by_id(&self, user_id: &str) -> RepoResult<Option<UserRecord>>;
    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<UserRecord>>;
    fn user_exists(&self, user_id: &str) -> RepoResult<bool>;
    /// Returns the id of the user holding `value` in a unique field, if any.
    fn find_user_id_by_field(
        &self,
        field: UniqueUserField,
        value: &str,
    ) -> RepoResult<Option<UserId>>;
    /// Applies `changes` and stamps `updated_time`; returns matched row count.
    fn update_user(
        &self,
        user_id: &str,
        changes: &[(UserColumn, String)],
        updated_time: &Timestamp,
    ) -> RepoResult<usize>;
    /// Hard-deletes one user; returns deleted row count.
    fn delete_user(&self, user_id: &str) -> RepoResult<usize>;
    fn count_users(&self) -> RepoResult<u64>;
}

/// SQLite-backed user repository.
#[derive(Clone, Copy)]
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, USER_TABLES)?;
        Ok(Self { conn })
    }

    fn find_one(&self, column: &str, value: &str) -> RepoResult<Option<UserRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE {column} = ?1;"))?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn insert_user(&self, user: &UserRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO users (
                user_id,
                username,
                email,
                password_hash,
                full_name,
                address,
                date_of_birth,
                phone_number,
                created_time,
                updated_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                user.user_id.as_str(),
                user.username.as_str(),
                user.email.as_str(),
                user.password_hash.as_str(),
                user.full_name.as_str(),
                user.address.as_str(),
                user.date_of_birth.as_str(),
                user.phone_number.as_str(),
                format_timestamp(&user.created_time),
                format_timestamp(&user.updated_time),
            ],
        )?;
        Ok(())
    }

    fn find_user_by_id(&self, user_id: &str) -> RepoResult<Option<UserRecord>> {
        self.find_one("user_id", user_id)
    }

    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<UserRecord>> {
        self.find_one("username", username)
    }

    fn user_exists(&self, user_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ?1);",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn find_user_id_by_field(
        &self,
        field: UniqueUserField,
        value: &str,
    ) -> RepoResult<Option<UserId>> {
        let user_id = self
            .conn
            .query_row(
                &format!("SELECT user_id FROM users WHERE {} = ?1;", field.column()),
                [value],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user_id)
    }

    fn update_user(
        &self,
        user_id: &str,
        changes: &[(UserColumn, String)],
        updated_time: &Timestamp,
    ) -> RepoResult<usize> {
        let mut assignments = Vec::with_capacity(changes.len() + 1);
        let mut bind_values: Vec<Value> = Vec::with_capacity(changes.len() + 2);

        for (column, value) in changes {
            assignments.push(format!("{} = ?", column.column_name()));
            bind_values.push(Value::Text(value.clone()));
        }
        assignments.push("updated_time = ?".to_string());
        bind_values.push(Value::Text(format_timestamp(updated_time)));
        bind_values.push(Value::Text(user_id.to_string()));

        let sql = format!(
            "UPDATE users SET {} WHERE user_id = ?;",
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(changed)
    }

    fn delete_user(&self, user_id: &str) -> RepoResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM users WHERE user_id = ?1;", [user_id])?;
        Ok(deleted)
    }

    fn count_users(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative user count `{count}`")))
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<UserRecord> {
    Ok(UserRecord {
        user_id: row.get("user_id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        full_name: row.get("full_name")?,
        address: row.get("address")?,
        date_of_birth: row.get("date_of_birth")?,
        phone_number: row.get("phone_number")?,
        created_time: parse_timestamp_column(row, "created_time")?,
        updated_time: parse_timestamp_column(row, "updated_time")?,
    })
}
