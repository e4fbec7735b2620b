// crates/faultline-providers/src/clock.rs
// ============================================================================
// Module: System Clock
// Description: Wall-clock time source behind the core clock interface.
// Purpose: Supply unix-millisecond timestamps outside deterministic runs.
// Dependencies: faultline-core, time
// ============================================================================

//! ## Overview
//! The system clock is the only place wall-clock time enters an
//! investigation. Everything downstream receives injected timestamps, so
//! swapping this for a logical clock replays a run deterministically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use faultline_core::Clock;
use faultline_core::Timestamp;
use time::OffsetDateTime;

// ============================================================================
// SECTION: System Clock
// ============================================================================

/// Wall-clock time source reporting unix milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Timestamp::UnixMillis(i64::try_from(millis).unwrap_or(i64::MAX))
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
    fn reports_unix_millis() {
        let now = SystemClock.now();
        match now {
            Timestamp::UnixMillis(millis) => assert!(millis > 1_700_000_000_000),
            Timestamp::Logical(_) => panic!("system clock must report unix milliseconds"),
        }
    }

    #[test]
    fn is_monotonic_enough_for_spans() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second.millis_since(&first).is_some());
    }
}
