// crates/faultline-core/src/core/audit.rs
// ============================================================================
// Module: Faultline Audit Events
// Description: Append-only audit events for every investigation transition.
// Purpose: Capture an ordered, replayable record of all state transitions.
// Dependencies: crate::core::{evidence, hashing, hypothesis, identifiers, operation, state, time}, serde
// ============================================================================

//! ## Overview
//! Every state transition produces exactly one audit record, emitted in
//! transition order. Records are write-once: the external sink owns
//! durability, the core owns emission order and per-record canonical hashes.
//! Replaying the full ordered log for an investigation id reconstructs an
//! equivalent hypothesis tree and final state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::evidence::Evidence;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::hypothesis::Hypothesis;
use crate::core::identifiers::HypothesisId;
use crate::core::identifiers::InvestigationId;
use crate::core::operation::ApprovalState;
use crate::core::operation::Operation;
use crate::core::state::InvestigationPhase;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Audit event payloads covering every investigation transition.
///
/// # Invariants
/// - Variants are stable for serialization and replay.
/// - Events carry enough data to reconstruct the hypothesis tree offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEvent {
    /// The phase machine advanced.
    PhaseChanged {
        /// Previous phase.
        from: InvestigationPhase,
        /// New phase.
        to: InvestigationPhase,
    },
    /// A hypothesis was formed (triage root or branch child).
    HypothesisFormed {
        /// Full hypothesis snapshot at formation.
        hypothesis: Hypothesis,
    },
    /// Evidence was attached to a hypothesis.
    EvidenceAttached {
        /// Target hypothesis.
        id: HypothesisId,
        /// Attached evidence record.
        evidence: Evidence,
        /// Confidence after rescoring.
        confidence: f64,
    },
    /// A hypothesis branched into children.
    HypothesisBranched {
        /// Parent hypothesis.
        parent: HypothesisId,
        /// Child identifiers in formation order.
        children: Vec<HypothesisId>,
    },
    /// A branch attempt was rejected at the depth ceiling.
    BranchRejected {
        /// Hypothesis that could not branch.
        id: HypothesisId,
        /// Rejection reason (for example `"max depth reached"`).
        reason: String,
    },
    /// A hypothesis was pruned.
    HypothesisPruned {
        /// Pruned hypothesis.
        id: HypothesisId,
        /// Prune reason, recorded verbatim.
        reason: String,
    },
    /// A hypothesis was merged into another.
    HypothesisMerged {
        /// Absorbed hypothesis.
        source: HypothesisId,
        /// Surviving hypothesis.
        into: HypothesisId,
        /// Merge reason.
        reason: String,
        /// Survivor confidence after the evidence union was rescored.
        confidence: f64,
    },
    /// A hypothesis was confirmed.
    HypothesisConfirmed {
        /// Confirmed hypothesis.
        id: HypothesisId,
        /// Confirmation reason.
        reason: String,
        /// Confidence at confirmation.
        confidence: f64,
    },
    /// Working context was compacted under budget pressure.
    ContextCompacted {
        /// Total tokens before compaction.
        before_tokens: u64,
        /// Total tokens after compaction.
        after_tokens: u64,
        /// Hypotheses collapsed to one-line summaries.
        collapsed: Vec<HypothesisId>,
    },
    /// Approval was requested for an operation.
    ApprovalRequested {
        /// Operation snapshot at request time.
        operation: Operation,
    },
    /// An approval decision was recorded.
    ApprovalDecided {
        /// Operation snapshot after the decision.
        operation: Operation,
        /// Final approval state.
        state: ApprovalState,
    },
    /// An operation was rejected before approval could be requested.
    OperationRejected {
        /// Operation snapshot at rejection.
        operation: Operation,
        /// Rejection reason (denylist, mutation cap, cooldown).
        reason: String,
    },
    /// An approved operation was executed.
    OperationExecuted {
        /// Executed operation.
        operation: Operation,
        /// Attempts consumed, including retries.
        attempts: u32,
    },
    /// The investigation took a degraded path and continued.
    Degraded {
        /// Human-readable degradation reason.
        reason: String,
    },
    /// The investigation concluded with a root cause.
    Concluded {
        /// Concluded root cause text.
        root_cause: String,
        /// Confidence in the conclusion.
        confidence: f64,
    },
}

// ============================================================================
// SECTION: Audit Records
// ============================================================================

/// Append-only, timestamped audit record.
///
/// # Invariants
/// - `seq` is contiguous and strictly increasing per investigation.
/// - `event_hash` is the canonical-JSON hash of `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Sequence number within the investigation, starting at 1.
    pub seq: u64,
    /// Investigation this record belongs to.
    pub investigation_id: InvestigationId,
    /// Timestamp at which the transition occurred.
    pub occurred_at: Timestamp,
    /// Transition payload.
    pub event: AuditEvent,
    /// Canonical hash of the event payload for offline verification.
    pub event_hash: HashDigest,
}

impl AuditRecord {
    /// Builds a record for an event, computing the canonical event hash.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the event payload cannot be canonicalized.
    pub fn build(
        seq: u64,
        investigation_id: InvestigationId,
        occurred_at: Timestamp,
        event: AuditEvent,
        algorithm: HashAlgorithm,
    ) -> Result<Self, HashError> {
        let event_hash = hash_canonical_json(algorithm, &event)?;
        Ok(Self {
            seq,
            investigation_id,
            occurred_at,
            event,
            event_hash,
        })
    }

    /// Verifies that the stored hash matches the event payload.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the event payload cannot be canonicalized.
    pub fn verify_hash(&self) -> Result<bool, HashError> {
        let recomputed = hash_canonical_json(self.event_hash.algorithm, &self.event)?;
        Ok(recomputed == self.event_hash)
    }
}
