//! Sequential identifier spaces and their string format.
//!
//! # Invariants
//! - Identifiers are zero-padded decimal strings, at least three digits wide.
//! - Values past 999 widen the string; they are never truncated.

use std::fmt::{Display, Formatter};

/// Identifier of one user record (`"001"`, `"002"`, ...).
pub type UserId = String;
/// Identifier of one review record.
pub type ReviewId = String;
/// Identifier of one catalog product. Assigned by the catalog, not by core.
pub type ProductId = String;

/// Minimum width of a formatted sequential identifier.
pub const SEQUENTIAL_ID_WIDTH: usize = 3;

/// Named space sharing one identifier sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdSpace {
    Users,
    Reviews,
}

impl IdSpace {
    pub const ALL: [IdSpace; 2] = [IdSpace::Users, IdSpace::Reviews];

    /// Stable key stored in the counter table.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Reviews => "reviews",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "users" => Some(Self::Users),
            "reviews" => Some(Self::Reviews),
            _ => None,
        }
    }
}

impl Display for IdSpace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats a counter value as a zero-padded identifier.
pub fn format_sequential_id(value: u64) -> String {
    format!("{value:0width$}", width = SEQUENTIAL_ID_WIDTH)
}

/// Parses a formatted identifier back to its counter value.
///
/// Returns `None` for empty input or anything that is not pure ASCII digits.
pub fn parse_sequential_id(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::{format_sequential_id, parse_sequential_id, IdSpace};

    #[test]
    fn formats_with_three_digit_padding() {
        assert_eq!(format_sequential_id(1), "001");
        assert_eq!(format_sequential_id(42), "042");
        assert_eq!(format_sequential_id(999), "999");
    }

    #[test]
    fn widens_past_three_digits_without_truncation() {
        assert_eq!(format_sequential_id(1000), "1000");
        assert_eq!(format_sequential_id(123_456), "123456");
    }

    #[test]
    fn parse_accepts_padded_digits_only() {
        assert_eq!(parse_sequential_id("007"), Some(7));
        assert_eq!(parse_sequential_id("1000"), Some(1000));
        assert_eq!(parse_sequential_id(""), None);
        assert_eq!(parse_sequential_id("-01"), None);
        assert_eq!(parse_sequential_id("0a1"), None);
    }

    #[test]
    fn space_keys_round_trip() {
        for space in IdSpace::ALL {
            assert_eq!(IdSpace::parse(space.as_str()), Some(space));
        }
        assert_eq!(IdSpace::parse("products"), None);
    }
}
