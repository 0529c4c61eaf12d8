//! User account model.
//!
//! # Responsibility
//! - Define the persisted user record and its public projection.
//! - Define registration and update inputs as they arrive from callers.
//!
//! # Invariants
//! - `UserRecord` is the only shape that carries `password_hash`; it is never
//!   serialized and its `Debug` output redacts the hash.
//! - `UserId`, `CreatedTime` and `UpdatedTime` cannot be set through
//!   `UserUpdate` without being reported as protected.

use crate::clock::Timestamp;
use crate::model::ids::UserId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};

/// Every externally named user field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UserField {
    UserId,
    Username,
    Password,
    Email,
    FullName,
    Address,
    DateOfBirth,
    PhoneNumber,
    CreatedTime,
    UpdatedTime,
}

impl UserField {
    /// Fields a registration must carry, in reporting order.
    pub const REQUIRED_FOR_REGISTRATION: [UserField; 7] = [
        UserField::Username,
        UserField::Password,
        UserField::Email,
        UserField::FullName,
        UserField::Address,
        UserField::DateOfBirth,
        UserField::PhoneNumber,
    ];

    /// Fields no caller may write.
    pub const PROTECTED: [UserField; 3] = [
        UserField::UserId,
        UserField::CreatedTime,
        UserField::UpdatedTime,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserId => "UserId",
            Self::Username => "Username",
            Self::Password => "Password",
            Self::Email => "Email",
            Self::FullName => "FullName",
            Self::Address => "Address",
            Self::DateOfBirth => "DateOfBirth",
            Self::PhoneNumber => "PhoneNumber",
            Self::CreatedTime => "CreatedTime",
            Self::UpdatedTime => "UpdatedTime",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "UserId" => Some(Self::UserId),
            "Username" => Some(Self::Username),
            "Password" => Some(Self::Password),
            "Email" => Some(Self::Email),
            "FullName" => Some(Self::FullName),
            "Address" => Some(Self::Address),
            "DateOfBirth" => Some(Self::DateOfBirth),
            "PhoneNumber" => Some(Self::PhoneNumber),
            "CreatedTime" => Some(Self::CreatedTime),
            "UpdatedTime" => Some(Self::UpdatedTime),
            _ => None,
        }
    }

    pub fn is_protected(self) -> bool {
        Self::PROTECTED.contains(&self)
    }
}

impl Display for UserField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User fields that must be unique across the user space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueUserField {
    Username,
    Email,
}

impl UniqueUserField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Username => "Username",
            Self::Email => "Email",
        }
    }

    /// Storage column backing this field.
    pub fn column(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        match column {
            "username" => Some(Self::Username),
            "email" => Some(Self::Email),
            _ => None,
        }
    }
}

impl Display for UniqueUserField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted user row, including the credential hash.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub address: String,
    pub date_of_birth: String,
    pub phone_number: String,
    pub created_time: Timestamp,
    pub updated_time: Timestamp,
}

impl UserRecord {
    /// Returns the caller-visible projection (everything but the hash).
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            address: self.address.clone(),
            date_of_birth: self.date_of_birth.clone(),
            phone_number: self.phone_number.clone(),
            created_time: self.created_time,
            updated_time: self.updated_time,
        }
    }
}

impl Debug for UserRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("full_name", &self.full_name)
            .field("address", &self.address)
            .field("date_of_birth", &self.date_of_birth)
            .field("phone_number", &self.phone_number)
            .field("created_time", &self.created_time)
            .field("updated_time", &self.updated_time)
            .finish()
    }
}

/// User profile as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub address: String,
    pub date_of_birth: String,
    pub phone_number: String,
    pub created_time: Timestamp,
    pub updated_time: Timestamp,
}

/// Registration request body. Absent fields stay `None` so the store can
/// report all of them at once.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserRegistration {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub phone_number: Option<String>,
}

impl UserRegistration {
    pub fn value(&self, field: UserField) -> Option<&str> {
        let value = match field {
            UserField::Username => self.username.as_deref(),
            UserField::Password => self.password.as_deref(),
            UserField::Email => self.email.as_deref(),
            UserField::FullName => self.full_name.as_deref(),
            UserField::Address => self.address.as_deref(),
            UserField::DateOfBirth => self.date_of_birth.as_deref(),
            UserField::PhoneNumber => self.phone_number.as_deref(),
            UserField::UserId | UserField::CreatedTime | UserField::UpdatedTime => None,
        };
        value.filter(|text| !text.trim().is_empty())
    }

    /// Required fields that are absent or blank, in reporting order.
    pub fn missing_fields(&self) -> Vec<UserField> {
        UserField::REQUIRED_FOR_REGISTRATION
            .into_iter()
            .filter(|field| self.value(*field).is_none())
            .collect()
    }
}

impl Debug for UserRegistration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRegistration")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("address", &self.address)
            .field("date_of_birth", &self.date_of_birth)
            .field("phone_number", &self.phone_number)
            .finish()
    }
}

/// Partial update request.
///
/// Known field names are kept even when protected, so the store can reject
/// them by name; unrecognized names are collected separately.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct UserUpdate {
    fields: BTreeMap<UserField, String>,
    unknown_fields: Vec<String>,
}

impl UserUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one field, replacing any earlier value.
    pub fn set(mut self, field: UserField, value: impl Into<String>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.unknown_fields.is_empty()
    }

    pub fn get(&self, field: UserField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Iterates over recognized fields in stable order.
    pub fn fields(&self) -> impl Iterator<Item = (UserField, &str)> {
        self.fields.iter().map(|(field, value)| (*field, value.as_str()))
    }

    /// Protected fields present in this update, in stable order.
    pub fn protected_fields(&self) -> Vec<UserField> {
        self.fields
            .keys()
            .copied()
            .filter(|field| field.is_protected())
            .collect()
    }

    pub fn unknown_fields(&self) -> &[String] {
        &self.unknown_fields
    }
}

impl From<Map<String, Value>> for UserUpdate {
    fn from(body: Map<String, Value>) -> Self {
        let mut update = Self::default();
        for (name, value) in body {
            let Some(field) = UserField::parse(&name) else {
                update.unknown_fields.push(name);
                continue;
            };
            let text = match value {
                Value::String(text) => text,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            update.fields.insert(field, text);
        }
        update
    }
}

impl Debug for UserUpdate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut fields = f.debug_map();
        for (field, value) in &self.fields {
            if *field == UserField::Password {
                fields.entry(&field.as_str(), &"<redacted>");
            } else {
                fields.entry(&field.as_str(), value);
            }
        }
        fields.finish()?;
        if !self.unknown_fields.is_empty() {
            write!(f, " unknown={:?}", self.unknown_fields)?;
        }
        Ok(())
    }
}
