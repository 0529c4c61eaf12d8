//! Clock collaborator and timestamp format.
//!
//! # Responsibility
//! - Produce record timestamps in the single civil timezone (UTC+7).
//! - Own the persisted ISO-8601 text format.
//!
//! # Invariants
//! - Every stamped timestamp carries the `+07:00` offset.
//! - Timestamps are truncated to microseconds so they survive a
//!   format/parse round trip unchanged.

use chrono::{DateTime, Duration, FixedOffset, Offset, SecondsFormat, SubsecRound, Utc};
use std::sync::Mutex;

/// Timestamp attached to user and review records.
pub type Timestamp = DateTime<FixedOffset>;

/// Offset of the civil timezone (Asia/Bangkok has no DST).
pub const CIVIL_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// Source of "now" for record stamping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock pinned to the civil timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct CivilClock;

impl Clock for CivilClock {
    fn now(&self) -> Timestamp {
        Utc::now().with_timezone(&civil_offset()).trunc_subsecs(6)
    }
}

/// Manually driven clock for deterministic callers.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start.with_timezone(&civil_offset()).trunc_subsecs(6)),
        }
    }

    /// Moves the clock forward by `step`.
    pub fn advance(&self, step: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += step;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Returns the fixed civil offset.
pub fn civil_offset() -> FixedOffset {
    FixedOffset::east_opt(CIVIL_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Formats a timestamp the way it is persisted, e.g.
/// `2024-05-01T10:00:00.123456+07:00`.
pub fn format_timestamp(value: &Timestamp) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parses a persisted timestamp.
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(value).ok()
}
