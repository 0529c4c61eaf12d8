//! Durable per-space identifier counters.
//!
//! # Responsibility
//! - Provide the atomic increment-and-read primitive behind id allocation.
//!
//! # Invariants
//! - Each space owns exactly one counter row; values only grow.
//! - Increment and read happen inside one write-locked transaction, so two
//!   connections can never observe the same value.
//! - A failed increment leaves the counter unchanged.
//! - `allocate_with` keeps the increment and the caller's dependent write in
//!   one unit: if the write fails, the increment is rolled back with it.
//! - Inside a caller-owned transaction the unit is a savepoint, so the
//!   caller's commit or rollback stays authoritative.

use crate::model::ids::IdSpace;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{ensure_connection_ready, RequiredTable};
use log::warn;
use rusqlite::{Connection, OptionalExtension};

const COUNTER_TABLES: &[RequiredTable] = &[RequiredTable {
    name: "id_counters",
    columns: &["space", "value"],
}];

const ALLOCATION_SAVEPOINT: &str = "id_allocation";

/// Storage primitive for monotonically increasing counters.
pub trait CounterRepository {
    /// Atomically increments the counter for `space` and returns the new value.
    fn increment_and_get(&self, space: IdSpace) -> RepoResult<u64>;
    /// Increments the counter for `space` and runs `write` with the new value
    /// in the same unit of work. The increment is kept only if `write`
    /// succeeds.
    fn allocate_with<T, E, F>(&self, space: IdSpace, write: F) -> Result<T, E>
    where
        F: FnOnce(u64) -> Result<T, E>,
        E: From<RepoError>;
    /// Returns the last value handed out for `space` (0 when none).
    fn current_value(&self, space: IdSpace) -> RepoResult<u64>;
}

/// SQLite-backed counter repository.
#[derive(Clone, Copy)]
pub struct SqliteCounterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCounterRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, COUNTER_TABLES)?;
        Ok(Self { conn })
    }

    fn increment(&self, space: IdSpace) -> RepoResult<u64> {
        let value: i64 = self.conn.query_row(
            "INSERT INTO id_counters (space, value)
             VALUES (?1, 1)
             ON CONFLICT (space) DO UPDATE SET value = value + 1
             RETURNING value;",
            [space.as_str()],
            |row| row.get(0),
        )?;
        counter_value(space, value)
    }
}

impl CounterRepository for SqliteCounterRepository<'_> {
    fn increment_and_get(&self, space: IdSpace) -> RepoResult<u64> {
        self.allocate_with(space, Ok::<u64, RepoError>)
    }

    fn allocate_with<T, E, F>(&self, space: IdSpace, write: F) -> Result<T, E>
    where
        F: FnOnce(u64) -> Result<T, E>,
        E: From<RepoError>,
    {
        let scope = WriteScope::begin(self.conn)?;
        let value = self.increment(space)?;
        let output = write(value)?;
        scope.commit()?;
        Ok(output)
    }

    fn current_value(&self, space: IdSpace) -> RepoResult<u64> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT value FROM id_counters WHERE space = ?1;",
                [space.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        value.map_or(Ok(0), |value| counter_value(space, value))
    }
}

fn counter_value(space: IdSpace, value: i64) -> RepoResult<u64> {
    u64::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!(
            "negative counter value `{value}` in id_counters for `{space}`"
        ))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Transaction,
    Savepoint,
}

/// Write unit for one allocation. Rolls back on drop unless committed.
struct WriteScope<'conn> {
    conn: &'conn Connection,
    kind: ScopeKind,
    finished: bool,
}

impl<'conn> WriteScope<'conn> {
    fn begin(conn: &'conn Connection) -> RepoResult<Self> {
        let kind = if conn.is_autocommit() {
            // BEGIN IMMEDIATE takes the write lock up front (honoring the busy
            // timeout) instead of upgrading a read lock mid-statement.
            conn.execute_batch("BEGIN IMMEDIATE;")?;
            ScopeKind::Transaction
        } else {
            conn.execute_batch(&format!("SAVEPOINT {ALLOCATION_SAVEPOINT};"))?;
            ScopeKind::Savepoint
        };
        Ok(Self {
            conn,
            kind,
            finished: false,
        })
    }

    fn commit(mut self) -> RepoResult<()> {
        self.finished = true;
        let sql = match self.kind {
            ScopeKind::Transaction => "COMMIT;".to_string(),
            ScopeKind::Savepoint => format!("RELEASE {ALLOCATION_SAVEPOINT};"),
        };
        if let Err(err) = self.conn.execute_batch(&sql) {
            self.rollback();
            return Err(err.into());
        }
        Ok(())
    }

    fn rollback(&self) {
        let sql = match self.kind {
            ScopeKind::Transaction => "ROLLBACK;".to_string(),
            ScopeKind::Savepoint => {
                format!("ROLLBACK TO {ALLOCATION_SAVEPOINT}; RELEASE {ALLOCATION_SAVEPOINT};")
            }
        };
        if let Err(err) = self.conn.execute_batch(&sql) {
            // A failed COMMIT may already have ended the transaction.
            if !self.conn.is_autocommit() {
                warn!("event=id_rollback module=counter_repo status=error error={err}");
            }
        }
    }
}

impl Drop for WriteScope<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.finished = true;
            self.rollback();
        }
    }
}
