// crates/faultline-core/src/core/time.rs
// ============================================================================
// Module: Faultline Time Model
// Description: Canonical timestamp representations for investigation records.
// Purpose: Provide deterministic, replayable time values across Faultline records.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Faultline uses explicit time values embedded in records to keep replay
//! deterministic. The core engines never read wall-clock time directly; hosts
//! supply timestamps through the [`crate::interfaces::Clock`] interface.
//! Timeout, cooldown, and deadline math is millisecond arithmetic over these
//! values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp used in Faultline audit and state records.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - No validation is performed; monotonicity is a caller responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Timestamp {
    /// Unix epoch milliseconds.
    UnixMillis(i64),
    /// Monotonic logical time value.
    Logical(u64),
}

impl Timestamp {
    /// Returns the timestamp as unix milliseconds when available.
    #[must_use]
    pub const fn as_unix_millis(&self) -> Option<i64> {
        match self {
            Self::UnixMillis(value) => Some(*value),
            Self::Logical(_) => None,
        }
    }

    /// Returns the timestamp as logical time when available.
    #[must_use]
    pub const fn as_logical(&self) -> Option<u64> {
        match self {
            Self::UnixMillis(_) => None,
            Self::Logical(value) => Some(*value),
        }
    }

    /// Returns the elapsed milliseconds from `earlier` to this timestamp.
    ///
    /// Mixed representations are not comparable and yield `None`; negative
    /// spans saturate to zero because deadlines only look forward.
    #[must_use]
    pub const fn millis_since(&self, earlier: &Self) -> Option<u64> {
        match (self, earlier) {
            (Self::UnixMillis(now), Self::UnixMillis(then)) => {
                let span = now.saturating_sub(*then);
                if span < 0 { Some(0) } else { Some(span.unsigned_abs()) }
            }
            (Self::Logical(now), Self::Logical(then)) => Some(now.saturating_sub(*then)),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn elapsed_millis_within_one_kind() {
        let earlier = Timestamp::UnixMillis(1_000);
        let later = Timestamp::UnixMillis(4_500);
        assert_eq!(later.millis_since(&earlier), Some(3_500));
        assert_eq!(Timestamp::Logical(9).millis_since(&Timestamp::Logical(4)), Some(5));
    }

    #[test]
    fn negative_spans_saturate_to_zero() {
        let earlier = Timestamp::UnixMillis(5_000);
        let later = Timestamp::UnixMillis(1_000);
        assert_eq!(later.millis_since(&earlier), Some(0));
        assert_eq!(Timestamp::Logical(1).millis_since(&Timestamp::Logical(7)), Some(0));
    }

    #[test]
    fn mixed_kinds_are_not_comparable() {
        let wall = Timestamp::UnixMillis(1_000);
        let logical = Timestamp::Logical(1_000);
        assert_eq!(wall.millis_since(&logical), None);
        assert_eq!(logical.millis_since(&wall), None);
    }

    #[test]
    fn serialization_tags_the_kind() {
        let json = serde_json::to_string(&Timestamp::Logical(7)).unwrap();
        assert_eq!(json, r#"{"kind":"logical","value":7}"#);
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Timestamp::Logical(7));
    }
}
