//! User account use-cases.
//!
//! # Responsibility
//! - Register, authenticate, update, delete and read user accounts.
//! - Route every password through the injected `CredentialHasher`.
//!
//! # Invariants
//! - Returned users are always `UserProfile` projections (no hash).
//! - Authentication failures are indistinguishable to the caller, including
//!   in the work performed: a missing user still pays for one verify call.
//! - Protected fields are rejected by name before anything is read or
//!   written; unknown fields are rejected rather than silently dropped.
//! - `UpdatedTime` is refreshed on every successful update.
//! - Logs carry ids and error codes only, never passwords, hashes or emails.

use crate::clock::Clock;
use crate::credential::CredentialHasher;
use crate::model::ids::{IdSpace, UserId};
use crate::model::user::{UniqueUserField, UserField, UserProfile, UserRecord, UserRegistration, UserUpdate};
use crate::repo::counter_repo::{CounterRepository, SqliteCounterRepository};
use crate::repo::error::RepoResult;
use crate::repo::user_repo::{SqliteUserRepository, UserColumn, UserRepository};
use crate::service::error::{EntityKind, StoreError, StoreResult, ValidationError};
use crate::service::id_allocator::IdentifierAllocator;
use crate::service::validators::UniquenessGuard;
use log::{error, info, warn};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::sync::Arc;

const TIMING_DUMMY_PASSWORD: &str = "fashionfit-timing-dummy";

/// User store over SQLite repositories sharing one connection.
pub type SqliteUserStore<'conn> =
    UserStore<SqliteUserRepository<'conn>, SqliteCounterRepository<'conn>>;

/// Owns the lifecycle of user accounts.
pub struct UserStore<U, C>
where
    U: UserRepository + Clone,
    C: CounterRepository,
{
    users: U,
    uniqueness: UniquenessGuard<U>,
    allocator: IdentifierAllocator<C>,
    hasher: Arc<dyn CredentialHasher>,
    clock: Arc<dyn Clock>,
    timing_dummy_hash: OnceCell<String>,
}

impl<'conn> SqliteUserStore<'conn> {
    /// Builds a store whose repositories all use `conn`.
    pub fn open(
        conn: &'conn Connection,
        hasher: Arc<dyn CredentialHasher>,
        clock: Arc<dyn Clock>,
    ) -> RepoResult<Self> {
        Ok(Self::new(
            SqliteUserRepository::try_new(conn)?,
            IdentifierAllocator::new(SqliteCounterRepository::try_new(conn)?),
            hasher,
            clock,
        ))
    }
}

impl<U, C> UserStore<U, C>
where
    U: UserRepository + Clone,
    C: CounterRepository,
{
    pub fn new(
        users: U,
        allocator: IdentifierAllocator<C>,
        hasher: Arc<dyn CredentialHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            uniqueness: UniquenessGuard::new(users.clone()),
            users,
            allocator,
            hasher,
            clock,
            timing_dummy_hash: OnceCell::new(),
        }
    }

    /// Registers a new user and returns its public profile.
    ///
    /// # Errors
    /// - `Validation(MissingFields)` naming every absent or blank field.
    /// - `Conflict(Username)` / `Conflict(Email)`; username is checked first.
    /// - `Hashing` when the hashing backend fails.
    /// - `StorageUnavailable` when storage stays locked past the timeout.
    pub fn register(&self, registration: &UserRegistration) -> StoreResult<UserProfile> {
        match self.try_register(registration) {
            Ok(profile) => {
                info!(
                    "event=user_register module=user_store status=ok user_id={}",
                    profile.user_id
                );
                Ok(profile)
            }
            Err(err) => {
                warn!(
                    "event=user_register module=user_store status=error error_code={} error={}",
                    err.kind(),
                    err
                );
                Err(err)
            }
        }
    }

    fn try_register(&self, registration: &UserRegistration) -> StoreResult<UserProfile> {
        let missing = registration.missing_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(
                missing.into_iter().map(UserField::as_str).collect(),
            )
            .into());
        }
        let required = |field: UserField| -> StoreResult<String> {
            registration
                .value(field)
                .map(str::to_string)
                .ok_or_else(|| ValidationError::MissingFields(vec![field.as_str()]).into())
        };

        let username = required(UserField::Username)?;
        let email = required(UserField::Email)?;
        self.uniqueness
            .ensure_unique(UniqueUserField::Username, &username, None)?;
        self.uniqueness
            .ensure_unique(UniqueUserField::Email, &email, None)?;

        let password_hash = self.hasher.hash(&required(UserField::Password)?)?;
        let full_name = required(UserField::FullName)?;
        let address = required(UserField::Address)?;
        let date_of_birth = required(UserField::DateOfBirth)?;
        let phone_number = required(UserField::PhoneNumber)?;

        // The id is only kept if the insert lands.
        self.allocator.next_with(IdSpace::Users, |user_id| {
            let now = self.clock.now();
            let record = UserRecord {
                user_id,
                username,
                email,
                password_hash,
                full_name,
                address,
                date_of_birth,
                phone_number,
                created_time: now,
                updated_time: now,
            };
            self.users.insert_user(&record)?;
            Ok(record.profile())
        })
    }

    /// Checks a username/password pair and returns the user id.
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown username or a wrong password,
    ///   with no way to tell the two apart.
    pub fn authenticate(&self, username: &str, password: &str) -> StoreResult<UserId> {
        let user = self.users.find_user_by_username(username)?;

        let Some(user) = user else {
            self.burn_verify(password);
            warn!("event=user_login module=user_store status=error error_code=invalid_credentials");
            return Err(StoreError::InvalidCredentials);
        };

        match self.hasher.verify(password, &user.password_hash) {
            Ok(true) => {
                info!(
                    "event=user_login module=user_store status=ok user_id={}",
                    user.user_id
                );
                Ok(user.user_id)
            }
            Ok(false) => {
                warn!("event=user_login module=user_store status=error error_code=invalid_credentials");
                Err(StoreError::InvalidCredentials)
            }
            Err(err) => {
                error!(
                    "event=user_login module=user_store status=error error_code=credential_verify_failed user_id={} error={}",
                    user.user_id, err
                );
                Err(StoreError::InvalidCredentials)
            }
        }
    }

    /// Applies a partial update and returns the refreshed profile.
    ///
    /// # Errors
    /// - `ImmutableField` naming every protected field in the update.
    /// - `Validation(UnknownFields)` / `Validation(BlankField)`.
    /// - `NotFound` when the user does not exist.
    /// - `Conflict` when a new username/email belongs to another user.
    pub fn update(&self, user_id: &str, update: &UserUpdate) -> StoreResult<UserProfile> {
        match self.try_update(user_id, update) {
            Ok(profile) => {
                info!("event=user_update module=user_store status=ok user_id={user_id}");
                Ok(profile)
            }
            Err(err) => {
                warn!(
                    "event=user_update module=user_store status=error user_id={} error_code={} error={}",
                    user_id,
                    err.kind(),
                    err
                );
                Err(err)
            }
        }
    }

    fn try_update(&self, user_id: &str, update: &UserUpdate) -> StoreResult<UserProfile> {
        let protected = update.protected_fields();
        if !protected.is_empty() {
            return Err(StoreError::ImmutableField(protected));
        }
        if !update.unknown_fields().is_empty() {
            return Err(ValidationError::UnknownFields(update.unknown_fields().to_vec()).into());
        }
        if let Some((field, _)) = update.fields().find(|(_, value)| value.trim().is_empty()) {
            return Err(ValidationError::BlankField(field.as_str()).into());
        }

        if !self.users.user_exists(user_id)? {
            return Err(StoreError::not_found(EntityKind::User, user_id));
        }

        let mut changes = Vec::new();
        for (field, value) in update.fields() {
            let column = match field {
                UserField::Username => {
                    self.uniqueness
                        .ensure_unique(UniqueUserField::Username, value, Some(user_id))?;
                    UserColumn::Username
                }
                UserField::Email => {
                    self.uniqueness
                        .ensure_unique(UniqueUserField::Email, value, Some(user_id))?;
                    UserColumn::Email
                }
                UserField::Password => {
                    changes.push((UserColumn::PasswordHash, self.hasher.hash(value)?));
                    continue;
                }
                UserField::FullName => UserColumn::FullName,
                UserField::Address => UserColumn::Address,
                UserField::DateOfBirth => UserColumn::DateOfBirth,
                UserField::PhoneNumber => UserColumn::PhoneNumber,
                UserField::UserId | UserField::CreatedTime | UserField::UpdatedTime => {
                    return Err(StoreError::ImmutableField(vec![field]));
                }
            };
            changes.push((column, value.to_string()));
        }

        let matched = self
            .users
            .update_user(user_id, &changes, &self.clock.now())?;
        if matched == 0 {
            return Err(StoreError::not_found(EntityKind::User, user_id));
        }

        self.get_profile(user_id)
    }

    /// Hard-deletes a user. Their reviews are removed by cascade.
    ///
    /// # Errors
    /// - `NotFound` when the user does not exist.
    pub fn delete(&self, user_id: &str) -> StoreResult<()> {
        let deleted = self.users.delete_user(user_id)?;
        if deleted == 0 {
            return Err(StoreError::not_found(EntityKind::User, user_id));
        }

        info!("event=user_delete module=user_store status=ok user_id={user_id}");
        Ok(())
    }

    /// Returns the public profile of one user.
    ///
    /// # Errors
    /// - `NotFound` when the user does not exist.
    pub fn get_profile(&self, user_id: &str) -> StoreResult<UserProfile> {
        self.users
            .find_user_by_id(user_id)?
            .map(|user| user.profile())
            .ok_or_else(|| StoreError::not_found(EntityKind::User, user_id))
    }

    fn burn_verify(&self, password: &str) {
        let dummy = self
            .timing_dummy_hash
            .get_or_try_init(|| self.hasher.hash(TIMING_DUMMY_PASSWORD));
        if let Ok(dummy) = dummy {
            let _ = self.hasher.verify(password, dummy);
        }
    }
}
