mod common;

use common::{fixed_clock, registration, tick, user_store, PlainHasher};
use fashionfit_core::clock::format_timestamp;
use fashionfit_core::db::open_db_in_memory;
use fashionfit_core::model::user::UserRecord;
use fashionfit_core::repo::counter_repo::SqliteCounterRepository;
use fashionfit_core::repo::user_repo::{SqliteUserRepository, UserColumn, UserRepository};
use fashionfit_core::{
    Argon2Hasher, EntityKind, IdentifierAllocator, RepoResult, SqliteUserStore, StoreError,
    Timestamp, UniqueUserField, UserField, UserId, UserRegistration, UserStore, UserUpdate,
    ValidationError,
};
use serde_json::json;
use std::sync::Arc;

#[test]
fn register_returns_profile_without_credentials() {
    let conn = open_db_in_memory().unwrap();
    let users = user_store(&conn, Arc::new(PlainHasher::default()), fixed_clock());

    let profile = users.register(&registration("mali")).unwrap();

    assert_eq!(profile.user_id, "001");
    assert_eq!(profile.username, "mali");
    assert_eq!(profile.created_time, profile.updated_time);
    assert_eq!(
        format_timestamp(&profile.created_time),
        "2024-05-01T10:00:00.000000+07:00"
    );
    let json = serde_json::to_value(&profile).unwrap();
    assert_eq!(json["UserId"], "001");
    assert!(json.get("Password").is_none());
    assert!(json.get("PasswordHash").is_none());
}

#[test]
fn stored_password_is_hashed() {
    let conn = open_db_in_memory().unwrap();
    let users = user_store(&conn, Arc::new(PlainHasher::default()), fixed_clock());
    users.register(&registration("mali")).unwrap();

    let stored = SqliteUserRepository::try_new(&conn)
        .unwrap()
        .find_user_by_username("mali")
        .unwrap()
        .unwrap();

    assert_ne!(stored.password_hash, "mali-secret");
    assert_eq!(stored.password_hash, "plain$mali-secret");
}

#[test]
fn register_reports_all_missing_and_blank_fields() {
    let conn = open_db_in_memory().unwrap();
    let users = user_store(&conn, Arc::new(PlainHasher::default()), fixed_clock());

    let err = users
        .register(&UserRegistration {
            username: Some("mali".to_string()),
            email: Some("   ".to_string()),
            ..UserRegistration::default()
        })
        .unwrap_err();

    match err {
        StoreError::Validation(ValidationError::MissingFields(fields)) => assert_eq!(
            fields,
            vec![
                "Password",
                "Email",
                "FullName",
                "Address",
                "DateOfBirth",
                "PhoneNumber"
            ]
        ),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn register_rejects_duplicate_username_before_email() {
    let conn = open_db_in_memory().unwrap();
    let users = user_store(&conn, Arc::new(PlainHasher::default()), fixed_clock());
    users.register(&registration("mali")).unwrap();

    let err = users.register(&registration("mali")).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(UniqueUserField::Username)));

    let mut same_email = registration("niran");
    same_email.email = Some("mali@example.com".to_string());
    let err = users.register(&same_email).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(UniqueUserField::Email)));

    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    assert_eq!(repo.count_users().unwrap(), 1);
    let next = users.register(&registration("niran")).unwrap();
    assert_eq!(next.user_id, "002");
}

#[test]
fn unique_index_backstops_a_lost_check() {
    let conn = open_db_in_memory().unwrap();
    let users = user_store(&conn, Arc::new(PlainHasher::default()), fixed_clock());
    let existing = users.register(&registration("mali")).unwrap();

    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let err = repo
        .insert_user(&UserRecord {
            user_id: "900".to_string(),
            username: "other".to_string(),
            email: "mali@example.com".to_string(),
            password_hash: "plain$x".to_string(),
            full_name: "Other".to_string(),
            address: "Bangkok".to_string(),
            date_of_birth: "2000-01-01".to_string(),
            phone_number: "0800000000".to_string(),
            created_time: existing.created_time,
            updated_time: existing.updated_time,
        })
        .unwrap_err();

    assert!(matches!(
        StoreError::from(err),
        StoreError::Conflict(UniqueUserField::Email)
    ));
}

/// User repository whose unique-field lookups never find a match, leaving the
/// unique indexes as the only line of defense.
#[derive(Clone, Copy)]
struct BlindLookupRepository<'conn>(SqliteUserRepository<'conn>);

impl UserRepository for BlindLookupRepository<'_> {
    fn insert_user(&self, user: &UserRecord) -> RepoResult<()> {
        self.0.insert_user(user)
    }

    fn find_user_by_id(&self, user_id: &str) -> RepoResult<Option<UserRecord>> {
        self.0.find_user_by_id(user_id)
    }

    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<UserRecord>> {
        self.0.find_user_by_username(username)
    }

    fn user_exists(&self, user_id: &str) -> RepoResult<bool> {
        self.0.user_exists(user_id)
    }

    fn find_user_id_by_field(
        &self,
        _field: UniqueUserField,
        _value: &str,
    ) -> RepoResult<Option<UserId>> {
        Ok(None)
    }

    fn update_user(
        &self,
        user_id: &str,
        changes: &[(UserColumn, String)],
        updated_time: &Timestamp,
    ) -> RepoResult<usize> {
        self.0.update_user(user_id, changes, updated_time)
    }

    fn delete_user(&self, user_id: &str) -> RepoResult<usize> {
        self.0.delete_user(user_id)
    }

    fn count_users(&self) -> RepoResult<u64> {
        self.0.count_users()
    }
}

#[test]
fn insert_rejected_by_unique_index_does_not_consume_an_id() {
    let conn = open_db_in_memory().unwrap();
    let users = UserStore::new(
        BlindLookupRepository(SqliteUserRepository::try_new(&conn).unwrap()),
        IdentifierAllocator::new(SqliteCounterRepository::try_new(&conn).unwrap()),
        Arc::new(PlainHasher::default()),
        fixed_clock(),
    );

    assert_eq!(users.register(&registration("mali")).unwrap().user_id, "001");
    assert!(matches!(
        users.register(&registration("mali")).unwrap_err(),
        StoreError::Conflict(UniqueUserField::Username)
    ));
    assert_eq!(users.register(&registration("niran")).unwrap().user_id, "002");
}

#[test]
fn authenticate_accepts_correct_password_only() {
    let conn = open_db_in_memory().unwrap();
    let users = user_store(&conn, Arc::new(PlainHasher::default()), fixed_clock());
    let profile = users.register(&registration("mali")).unwrap();

    assert_eq!(
        users.authenticate("mali", "mali-secret").unwrap(),
        profile.user_id
    );
    assert!(matches!(
        users.authenticate("mali", "wrong").unwrap_err(),
        StoreError::InvalidCredentials
    ));
}

#[test]
fn unknown_username_fails_like_a_wrong_password() {
    let conn = open_db_in_memory().unwrap();
    let hasher = Arc::new(PlainHasher::default());
    let users = user_store(&conn, hasher.clone(), fixed_clock());
    users.register(&registration("mali")).unwrap();

    let wrong_password = users.authenticate("mali", "wrong").unwrap_err();
    let calls_after_wrong_password = hasher.verify_calls();
    let unknown_user = users.authenticate("ghost", "wrong").unwrap_err();

    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    assert_eq!(wrong_password.kind(), unknown_user.kind());
    assert_eq!(hasher.verify_calls(), calls_after_wrong_password + 1);
}

#[test]
fn malformed_stored_hash_reads_as_invalid_credentials() {
    let conn = open_db_in_memory().unwrap();
    let users = user_store(&conn, Arc::new(PlainHasher::default()), fixed_clock());
    users.register(&registration("mali")).unwrap();
    conn.execute(
        "UPDATE users SET password_hash = 'garbage' WHERE username = 'mali';",
        [],
    )
    .unwrap();

    assert!(matches!(
        users.authenticate("mali", "mali-secret").unwrap_err(),
        StoreError::InvalidCredentials
    ));
}

#[test]
fn update_changes_fields_and_refreshes_updated_time() {
    let conn = open_db_in_memory().unwrap();
    let clock = fixed_clock();
    let users = user_store(&conn, Arc::new(PlainHasher::default()), clock.clone());
    let before = users.register(&registration("mali")).unwrap();
    tick(&clock);

    let after = users
        .update(
            &before.user_id,
            &UserUpdate::new()
                .set(UserField::Address, "99 Silom Rd")
                .set(UserField::Password, "new-secret"),
        )
        .unwrap();

    assert_eq!(after.address, "99 Silom Rd");
    assert_eq!(after.created_time, before.created_time);
    assert!(after.updated_time > before.updated_time);
    assert!(users.authenticate("mali", "new-secret").is_ok());
    assert!(users.authenticate("mali", "mali-secret").is_err());
}

#[test]
fn update_rejects_protected_fields_by_name() {
    let conn = open_db_in_memory().unwrap();
    let users = user_store(&conn, Arc::new(PlainHasher::default()), fixed_clock());
    let profile = users.register(&registration("mali")).unwrap();

    let update: UserUpdate = serde_json::from_value(json!({
        "UserId": "999",
        "CreatedTime": "2020-01-01T00:00:00+07:00",
        "FullName": "Changed",
    }))
    .unwrap();
    let err = users.update(&profile.user_id, &update).unwrap_err();

    match err {
        StoreError::ImmutableField(fields) => {
            assert_eq!(fields, vec![UserField::UserId, UserField::CreatedTime]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(users.get_profile("001").unwrap().full_name, "mali Example");
}

#[test]
fn update_rejects_unknown_and_blank_fields() {
    let conn = open_db_in_memory().unwrap();
    let users = user_store(&conn, Arc::new(PlainHasher::default()), fixed_clock());
    let profile = users.register(&registration("mali")).unwrap();

    let unknown: UserUpdate = serde_json::from_value(json!({"Nickname": "m"})).unwrap();
    assert!(matches!(
        users.update(&profile.user_id, &unknown).unwrap_err(),
        StoreError::Validation(ValidationError::UnknownFields(ref names)) if names == &["Nickname"]
    ));

    let blank = UserUpdate::new().set(UserField::PhoneNumber, " ");
    assert!(matches!(
        users.update(&profile.user_id, &blank).unwrap_err(),
        StoreError::Validation(ValidationError::BlankField("PhoneNumber"))
    ));
}

#[test]
fn update_enforces_uniqueness_against_other_users_only() {
    let conn = open_db_in_memory().unwrap();
    let users = user_store(&conn, Arc::new(PlainHasher::default()), fixed_clock());
    let mali = users.register(&registration("mali")).unwrap();
    users.register(&registration("niran")).unwrap();

    let own_email = UserUpdate::new().set(UserField::Email, "mali@example.com");
    assert!(users.update(&mali.user_id, &own_email).is_ok());

    let taken = UserUpdate::new().set(UserField::Username, "niran");
    assert!(matches!(
        users.update(&mali.user_id, &taken).unwrap_err(),
        StoreError::Conflict(UniqueUserField::Username)
    ));
}

#[test]
fn update_of_missing_user_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let users = user_store(&conn, Arc::new(PlainHasher::default()), fixed_clock());

    let err = users
        .update("404", &UserUpdate::new().set(UserField::FullName, "x"))
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::NotFound {
            entity: EntityKind::User,
            ..
        }
    ));
}

#[test]
fn delete_then_get_profile_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let users = user_store(&conn, Arc::new(PlainHasher::default()), fixed_clock());
    let profile = users.register(&registration("mali")).unwrap();

    users.delete(&profile.user_id).unwrap();

    assert!(matches!(
        users.get_profile(&profile.user_id).unwrap_err(),
        StoreError::NotFound { .. }
    ));
    assert!(matches!(
        users.delete(&profile.user_id).unwrap_err(),
        StoreError::NotFound { .. }
    ));
    assert!(matches!(
        users.authenticate("mali", "mali-secret").unwrap_err(),
        StoreError::InvalidCredentials
    ));
}

#[test]
fn argon2_hasher_round_trips_through_the_store() {
    let conn = open_db_in_memory().unwrap();
    let users =
        SqliteUserStore::open(&conn, Arc::new(Argon2Hasher::new()), fixed_clock()).unwrap();
    let profile = users.register(&registration("mali")).unwrap();

    assert_eq!(
        users.authenticate("mali", "mali-secret").unwrap(),
        profile.user_id
    );
    assert!(users.authenticate("mali", "nope").is_err());
    assert!(users.authenticate("ghost", "nope").is_err());
}
