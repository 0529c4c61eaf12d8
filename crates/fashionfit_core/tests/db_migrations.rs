use fashionfit_core::db::migrations::latest_version;
use fashionfit_core::db::{open_db, open_db_in_memory, DbError};
use fashionfit_core::repo::counter_repo::{CounterRepository, SqliteCounterRepository};
use fashionfit_core::repo::user_repo::SqliteUserRepository;
use fashionfit_core::{IdSpace, RepoError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "products");
    assert_table_exists(&conn, "users");
    assert_table_exists(&conn, "reviews");
    assert_table_exists(&conn, "id_counters");
}

#[test]
fn foreign_keys_are_enforced_on_opened_connections() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fashionfit.db");

    let conn_first = open_db(&path).unwrap();
    let counters = SqliteCounterRepository::try_new(&conn_first).unwrap();
    assert_eq!(counters.increment_and_get(IdSpace::Users).unwrap(), 1);
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let counters = SqliteCounterRepository::try_new(&conn_second).unwrap();
    assert_eq!(counters.current_value(IdSpace::Users).unwrap(), 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn counters_are_seeded_from_rows_written_before_they_existed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0001_init.sql"))
        .unwrap();
    conn.execute_batch(
        "INSERT INTO products (product_id, name, created_time)
         VALUES ('P01', 'Linen shirt', '2024-01-01T00:00:00.000000+07:00');
         INSERT INTO users (user_id, username, email, password_hash, full_name,
                            address, date_of_birth, phone_number,
                            created_time, updated_time)
         VALUES ('007', 'legacy', 'legacy@example.com', 'x', 'Legacy User',
                 'Bangkok', '1990-01-01', '0800000000',
                 '2024-01-01T00:00:00.000000+07:00',
                 '2024-01-01T00:00:00.000000+07:00');
         INSERT INTO reviews (review_id, product_id, user_id, rating,
                              review_text, created_time)
         VALUES ('012', 'P01', '007', 4, 'ok',
                 '2024-01-01T00:00:00.000000+07:00');
         PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    let counters = SqliteCounterRepository::try_new(&conn).unwrap();
    assert_eq!(counters.increment_and_get(IdSpace::Users).unwrap(), 8);
    assert_eq!(counters.increment_and_get(IdSpace::Reviews).unwrap(), 13);
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteUserRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
