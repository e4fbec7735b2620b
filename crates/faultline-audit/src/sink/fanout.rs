// crates/faultline-audit/src/sink/fanout.rs
// ============================================================================
// Module: Fanout Audit Sink
// Description: Mirrors each audit record to several sinks.
// Purpose: Combine durable and live sinks behind one append call.
// Dependencies: faultline-core
// ============================================================================

//! ## Overview
//! The fanout sink appends each record to every inner sink in registration
//! order. The first failing sink aborts the append and its error propagates,
//! so the caller treats a partial fanout like any other append failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use faultline_core::AuditError;
use faultline_core::AuditRecord;
use faultline_core::AuditSink;

// ============================================================================
// SECTION: Fanout Sink
// ============================================================================

/// Audit sink that mirrors records to an ordered set of inner sinks.
#[derive(Default)]
pub struct FanoutSink {
    /// Inner sinks in registration order.
    sinks: Vec<Box<dyn AuditSink + Send + Sync>>,
}

impl FanoutSink {
    /// Creates an empty fanout.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sinks: Vec::new(),
        }
    }

    /// Adds a sink to the end of the fanout order.
    pub fn push(&mut self, sink: Box<dyn AuditSink + Send + Sync>) {
        self.sinks.push(sink);
    }

    /// Adds a sink and returns the fanout for chained construction.
    #[must_use]
    pub fn with(mut self, sink: Box<dyn AuditSink + Send + Sync>) -> Self {
        self.push(sink);
        self
    }

    /// Number of registered sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// True when no sinks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutSink").field("sinks", &self.sinks.len()).finish()
    }
}

impl AuditSink for FanoutSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        for sink in &self.sinks {
            sink.append(record)?;
        }
        Ok(())
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

    use std::sync::Arc;

    use faultline_core::AuditEvent;
    use faultline_core::DEFAULT_HASH_ALGORITHM;
    use faultline_core::InvestigationId;
    use faultline_core::Timestamp;

    use crate::MemorySink;

    use super::*;

    /// Sink that fails every append.
    struct FailingSink;

    impl AuditSink for FailingSink {
        fn append(&self, _record: &AuditRecord) -> Result<(), AuditError> {
            Err(AuditError::Append("disk full".to_string()))
        }
    }

    /// Sink that forwards to a shared memory sink.
    struct SharedSink(Arc<MemorySink>);

    impl AuditSink for SharedSink {
        fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
            self.0.append(record)
        }
    }

    fn record(seq: u64) -> AuditRecord {
        AuditRecord::build(
            seq,
            InvestigationId::new("inv-1"),
            Timestamp::Logical(seq),
            AuditEvent::Degraded {
                reason: "knowledge retriever unavailable".to_string(),
            },
            DEFAULT_HASH_ALGORITHM,
        )
        .unwrap()
    }

    #[test]
    fn mirrors_to_all_sinks() {
        let first = Arc::new(MemorySink::new());
        let second = Arc::new(MemorySink::new());
        let fanout = FanoutSink::new()
            .with(Box::new(SharedSink(Arc::clone(&first))))
            .with(Box::new(SharedSink(Arc::clone(&second))));
        fanout.append(&record(0)).unwrap();
        assert_eq!(first.len().unwrap(), 1);
        assert_eq!(second.len().unwrap(), 1);
    }

    #[test]
    fn first_failure_propagates() {
        let survivor = Arc::new(MemorySink::new());
        let fanout = FanoutSink::new()
            .with(Box::new(FailingSink))
            .with(Box::new(SharedSink(Arc::clone(&survivor))));
        let err = fanout.append(&record(0)).unwrap_err();
        assert!(matches!(err, AuditError::Append(_)));
        assert!(survivor.is_empty().unwrap());
    }
}
