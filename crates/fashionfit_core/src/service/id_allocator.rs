//! Sequential identifier allocation.
//!
//! # Invariants
//! - Identifiers come from the durable per-space counter, never from
//!   scanning existing records.
//! - No two callers (threads or processes) receive the same identifier.
//! - A failed allocation reserves nothing. With `next_with`, neither does a
//!   failed write of the record the identifier was meant for.

use crate::model::ids::{format_sequential_id, IdSpace};
use crate::repo::counter_repo::CounterRepository;
use crate::service::error::StoreResult;
use log::{debug, warn};

/// Hands out zero-padded sequential identifiers per space.
#[derive(Clone)]
pub struct IdentifierAllocator<C: CounterRepository> {
    counters: C,
}

impl<C: CounterRepository> IdentifierAllocator<C> {
    pub fn new(counters: C) -> Self {
        Self { counters }
    }

    /// Returns the next identifier for `space`.
    ///
    /// # Errors
    /// - `StorageUnavailable` when the counter row stays locked past the
    ///   storage timeout.
    pub fn next(&self, space: IdSpace) -> StoreResult<String> {
        self.next_with(space, Ok)
    }

    /// Allocates the next identifier for `space` and hands it to `write` in
    /// the same storage unit. If `write` fails the identifier is released
    /// and the next caller receives it.
    ///
    /// # Errors
    /// - `StorageUnavailable` when the counter row stays locked past the
    ///   storage timeout.
    /// - Whatever `write` returns.
    pub fn next_with<T, F>(&self, space: IdSpace, write: F) -> StoreResult<T>
    where
        F: FnOnce(String) -> StoreResult<T>,
    {
        let mut allocated = None;
        let result = self.counters.allocate_with(space, |value| {
            let id = format_sequential_id(value);
            allocated = Some(id.clone());
            write(id)
        });

        match (&result, allocated) {
            (Ok(_), Some(id)) => {
                debug!("event=id_allocate module=id_allocator status=ok space={space} id={id}");
            }
            (Err(err), Some(id)) => {
                debug!(
                    "event=id_allocate module=id_allocator status=released space={space} id={id} error_code={}",
                    err.kind()
                );
            }
            (Err(err), None) => {
                warn!(
                    "event=id_allocate module=id_allocator status=error space={space} error={err}"
                );
            }
            (Ok(_), None) => {}
        }
        result
    }

    /// Returns the most recently allocated identifier, if any.
    pub fn last_allocated(&self, space: IdSpace) -> StoreResult<Option<String>> {
        let value = self.counters.current_value(space)?;
        Ok((value > 0).then(|| format_sequential_id(value)))
    }
}
