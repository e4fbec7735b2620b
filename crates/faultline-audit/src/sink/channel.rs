// crates/faultline-audit/src/sink/channel.rs
// ============================================================================
// Module: Channel Audit Sink
// Description: Bounded live feed of audit records for observers.
// Purpose: Deliver records through a Tokio mpsc channel with backpressure.
// Dependencies: faultline-core, tokio
// ============================================================================

//! ## Overview
//! The channel sink sends every record into a bounded `tokio::sync::mpsc`
//! channel. A full channel blocks the append instead of dropping the record,
//! so a slow observer slows the investigation rather than losing trail
//! entries. A closed receiver makes the sink unavailable, which is fatal
//! upstream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use faultline_core::AuditError;
use faultline_core::AuditRecord;
use faultline_core::AuditSink;
use tokio::sync::mpsc::Receiver;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::channel;

// ============================================================================
// SECTION: Channel Sink
// ============================================================================

/// Bounded channel audit sink.
///
/// # Invariants
/// - Records are delivered in append order and never dropped.
#[derive(Debug)]
pub struct ChannelSink {
    /// Sender feeding the observer channel.
    sender: Sender<AuditRecord>,
}

impl ChannelSink {
    /// Creates a sink over an existing sender.
    #[must_use]
    pub const fn new(sender: Sender<AuditRecord>) -> Self {
        Self {
            sender,
        }
    }

    /// Creates a bounded sink and its observer receiver.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<AuditRecord>) {
        let (sender, receiver) = channel(capacity.max(1));
        (Self::new(sender), receiver)
    }
}

impl AuditSink for ChannelSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.sender
            .blocking_send(record.clone())
            .map_err(|_| AuditError::Unavailable("audit channel closed".to_string()))
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

    use faultline_core::AuditEvent;
    use faultline_core::DEFAULT_HASH_ALGORITHM;
    use faultline_core::InvestigationId;
    use faultline_core::Timestamp;

    use super::*;

    fn record(seq: u64) -> AuditRecord {
        AuditRecord::build(
            seq,
            InvestigationId::new("inv-1"),
            Timestamp::Logical(seq),
            AuditEvent::Degraded {
                reason: "probe timeout".to_string(),
            },
            DEFAULT_HASH_ALGORITHM,
        )
        .unwrap()
    }

    #[test]
    fn delivers_in_append_order() {
        let (sink, mut receiver) = ChannelSink::bounded(4);
        sink.append(&record(0)).unwrap();
        sink.append(&record(1)).unwrap();
        assert_eq!(receiver.blocking_recv().unwrap().seq, 0);
        assert_eq!(receiver.blocking_recv().unwrap().seq, 1);
    }

    #[test]
    fn closed_receiver_is_unavailable() {
        let (sink, receiver) = ChannelSink::bounded(1);
        drop(receiver);
        let err = sink.append(&record(0)).unwrap_err();
        assert!(matches!(err, AuditError::Unavailable(_)));
    }
}
