// crates/faultline-audit/src/replay.rs
// ============================================================================
// Module: Audit Replay
// Description: Reconstructs investigation state from an audit trail.
// Purpose: Verify trail integrity and rebuild the hypothesis tree offline.
// Dependencies: faultline-core, thiserror
// ============================================================================

//! ## Overview
//! Replay walks an ordered slice of audit records, verifies each event hash
//! and the sequence numbering, and folds the events back into the state the
//! investigation held when the trail was written. A trail whose replay
//! diverges from the live run indicates tampering or a serialization bug, so
//! every integrity failure is a hard error rather than a warning.

// ============================================================================
// SECTION: Imports
// ============================================================================

use faultline_core::AuditEvent;
use faultline_core::AuditRecord;
use faultline_core::HashError;
use faultline_core::HypothesisStatus;
use faultline_core::HypothesisTree;
use faultline_core::InvestigationId;
use faultline_core::InvestigationPhase;
use faultline_core::Operation;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Integrity failure detected while replaying an audit trail.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The trail contains no records.
    #[error("audit trail is empty")]
    Empty,
    /// A record's sequence number broke the contiguous ordering.
    #[error("out-of-order record: expected seq {expected}, found {found}")]
    OutOfOrder {
        /// Sequence number the contiguous trail required.
        expected: u64,
        /// Sequence number actually found.
        found: u64,
    },
    /// A record belongs to a different investigation than the first record.
    #[error("record {seq} belongs to investigation {found}, expected {expected}")]
    MixedInvestigations {
        /// Offending sequence number.
        seq: u64,
        /// Investigation id carried by the first record.
        expected: String,
        /// Investigation id carried by the offending record.
        found: String,
    },
    /// A record's stored hash does not match its recomputed event hash.
    #[error("event hash mismatch at seq {seq}")]
    HashMismatch {
        /// Offending sequence number.
        seq: u64,
    },
    /// The event payload could not be canonicalized for verification.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// An event referenced a hypothesis the trail never formed.
    #[error("record {seq} references unknown hypothesis {id}")]
    UnknownHypothesis {
        /// Offending sequence number.
        seq: u64,
        /// Referenced hypothesis id.
        id: String,
    },
}

// ============================================================================
// SECTION: Replayed State
// ============================================================================

/// Investigation state reconstructed from a verified audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayedInvestigation {
    /// Investigation the trail belongs to.
    pub investigation_id: InvestigationId,
    /// Last phase the trail recorded.
    pub phase: InvestigationPhase,
    /// Hypothesis tree rebuilt from formation and lifecycle events.
    pub tree: HypothesisTree,
    /// Degradation reasons in occurrence order.
    pub degradations: Vec<String>,
    /// Concluded root cause, when the trail reached a conclusion.
    pub root_cause: Option<String>,
    /// Confidence recorded at conclusion, zero otherwise.
    pub confidence: f64,
    /// Final snapshot of every operation the trail mentions, in first-seen
    /// order.
    pub operations: Vec<Operation>,
    /// Number of records folded into this state.
    pub records: usize,
}

// ============================================================================
// SECTION: Replay
// ============================================================================

/// Verifies and replays an ordered audit trail.
///
/// Records must be contiguous starting at the first record's `seq`, all
/// belong to one investigation, and carry valid event hashes.
///
/// # Errors
///
/// Returns [`ReplayError`] on any integrity failure. Replay never partially
/// succeeds: the first bad record aborts it.
pub fn replay(records: &[AuditRecord]) -> Result<ReplayedInvestigation, ReplayError> {
    let first = records.first().ok_or(ReplayError::Empty)?;
    let investigation_id = first.investigation_id.clone();
    let mut expected_seq = first.seq;

    let mut state = ReplayedInvestigation {
        investigation_id: investigation_id.clone(),
        phase: InvestigationPhase::Triage,
        tree: HypothesisTree::new(),
        degradations: Vec::new(),
        root_cause: None,
        confidence: 0.0,
        operations: Vec::new(),
        records: records.len(),
    };

    for record in records {
        if record.seq != expected_seq {
            return Err(ReplayError::OutOfOrder {
                expected: expected_seq,
                found: record.seq,
            });
        }
        expected_seq += 1;
        if record.investigation_id != investigation_id {
            return Err(ReplayError::MixedInvestigations {
                seq: record.seq,
                expected: investigation_id.as_str().to_string(),
                found: record.investigation_id.as_str().to_string(),
            });
        }
        if !record.verify_hash()? {
            return Err(ReplayError::HashMismatch {
                seq: record.seq,
            });
        }
        apply(&mut state, record)?;
    }

    Ok(state)
}

/// Folds one verified record into the replayed state.
fn apply(state: &mut ReplayedInvestigation, record: &AuditRecord) -> Result<(), ReplayError> {
    match &record.event {
        AuditEvent::PhaseChanged {
            to, ..
        } => {
            state.phase = *to;
        }
        AuditEvent::HypothesisFormed {
            hypothesis,
        } => {
            state.tree.insert(hypothesis.clone());
        }
        AuditEvent::EvidenceAttached {
            id,
            evidence,
            confidence,
        } => {
            let node = state.tree.get_mut(id).ok_or_else(|| ReplayError::UnknownHypothesis {
                seq: record.seq,
                id: id.to_string(),
            })?;
            node.evidence.push(evidence.clone());
            node.confidence = *confidence;
        }
        AuditEvent::HypothesisBranched {
            parent,
            children,
        } => {
            let node =
                state.tree.get_mut(parent).ok_or_else(|| ReplayError::UnknownHypothesis {
                    seq: record.seq,
                    id: parent.to_string(),
                })?;
            node.children = children.clone();
        }
        AuditEvent::HypothesisPruned {
            id,
            reason,
        } => {
            let node = state.tree.get_mut(id).ok_or_else(|| ReplayError::UnknownHypothesis {
                seq: record.seq,
                id: id.to_string(),
            })?;
            node.status = HypothesisStatus::Pruned;
            node.status_reason = Some(reason.clone());
        }
        AuditEvent::HypothesisMerged {
            source,
            into,
            reason,
            confidence,
        } => {
            let absorbed = state
                .tree
                .get(source)
                .ok_or_else(|| ReplayError::UnknownHypothesis {
                    seq: record.seq,
                    id: source.to_string(),
                })?
                .evidence
                .clone();
            {
                let survivor =
                    state.tree.get_mut(into).ok_or_else(|| ReplayError::UnknownHypothesis {
                        seq: record.seq,
                        id: into.to_string(),
                    })?;
                survivor.evidence.extend(absorbed);
                survivor.confidence = *confidence;
            }
            if let Some(node) = state.tree.get_mut(source) {
                node.status = HypothesisStatus::Merged;
                node.status_reason = Some(reason.clone());
            }
        }
        AuditEvent::HypothesisConfirmed {
            id,
            reason,
            confidence,
        } => {
            let node = state.tree.get_mut(id).ok_or_else(|| ReplayError::UnknownHypothesis {
                seq: record.seq,
                id: id.to_string(),
            })?;
            node.status = HypothesisStatus::Confirmed;
            node.status_reason = Some(reason.clone());
            node.confidence = *confidence;
        }
        AuditEvent::ApprovalRequested {
            operation,
        }
        | AuditEvent::ApprovalDecided {
            operation, ..
        }
        | AuditEvent::OperationRejected {
            operation, ..
        }
        | AuditEvent::OperationExecuted {
            operation, ..
        } => {
            upsert_operation(&mut state.operations, operation);
        }
        AuditEvent::Degraded {
            reason,
        } => {
            state.degradations.push(reason.clone());
        }
        AuditEvent::Concluded {
            root_cause,
            confidence,
        } => {
            state.root_cause = Some(root_cause.clone());
            state.confidence = *confidence;
        }
        AuditEvent::BranchRejected {
            ..
        }
        | AuditEvent::ContextCompacted {
            ..
        } => {}
    }
    Ok(())
}

/// Replaces an operation snapshot in place, or appends a first-seen one.
fn upsert_operation(operations: &mut Vec<Operation>, operation: &Operation) {
    if let Some(slot) =
        operations.iter_mut().find(|existing| existing.operation_id == operation.operation_id)
    {
        *slot = operation.clone();
    } else {
        operations.push(operation.clone());
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
