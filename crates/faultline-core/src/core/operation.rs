// crates/faultline-core/src/core/operation.rs
// ============================================================================
// Module: Faultline Operation Model
// Description: Proposed remediation operations and their approval lifecycle.
// Purpose: Capture the mutating actions gated by the safety risk classifier.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! An operation is a proposed mutating action produced at remediation time,
//! for example "scale service X". Operations are created by the orchestrator,
//! classified and finalized by the safety gate, and never mutated by any other
//! component. Risk level is derived by the classifier, never stored as free
//! text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::OperationId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Risk Level
// ============================================================================

/// Derived risk classification for a proposed mutating operation.
///
/// # Invariants
/// - Variants are stable for serialization and audit replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Read-only or otherwise harmless operation.
    Low,
    /// Mutating operation with limited blast radius.
    Medium,
    /// Mutating operation with service-level impact.
    High,
    /// Destructive or security-sensitive operation.
    Critical,
}

impl RiskLevel {
    /// Returns a stable label for the risk level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

// ============================================================================
// SECTION: Target Environment
// ============================================================================

/// Deployment environment an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Production environment.
    Production,
    /// Staging environment.
    Staging,
    /// Development or other non-production environment.
    Development,
}

// ============================================================================
// SECTION: Approval State
// ============================================================================

/// Approval lifecycle state for an operation.
///
/// # Invariants
/// - State only advances `Pending` to a terminal state, never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    /// Awaiting an approval decision.
    Pending,
    /// Approved for execution.
    Approved,
    /// Denied; the operation must not execute.
    Denied,
    /// Approval window expired; treated as denied.
    Expired,
}

// ============================================================================
// SECTION: Approval Decision
// ============================================================================

/// Decision supplied by an approval channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    /// True when the operation was approved.
    pub approved: bool,
    /// Approver identity, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver: Option<String>,
    /// Human-readable decision reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ============================================================================
// SECTION: Operation Records
// ============================================================================

/// Proposed mutating action gated by the safety classifier.
///
/// # Invariants
/// - `risk_level` is derived by the classifier before any approval request.
/// - Only the safety gate finalizes `approval_state`, `approver`, and
///   `decided_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation identifier.
    pub operation_id: OperationId,
    /// Command or verb text describing the action.
    pub command: String,
    /// Resources the operation would touch.
    pub affected_resources: Vec<String>,
    /// Environment the operation targets.
    pub environment: Environment,
    /// True when the operation mutates state.
    pub mutating: bool,
    /// Derived risk classification.
    pub risk_level: RiskLevel,
    /// Command that rolls the operation back, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_command: Option<String>,
    /// Approval lifecycle state.
    pub approval_state: ApprovalState,
    /// Approver identity once decided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver: Option<String>,
    /// Timestamp at which approval was requested.
    pub requested_at: Timestamp,
    /// Timestamp at which the decision was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<Timestamp>,
}

impl Operation {
    /// Creates a pending operation awaiting classification and approval.
    ///
    /// Risk defaults to [`RiskLevel::Medium`] until the classifier derives the
    /// real level; callers must not interpret the default.
    #[must_use]
    pub fn proposed(
        operation_id: OperationId,
        command: impl Into<String>,
        environment: Environment,
        mutating: bool,
        requested_at: Timestamp,
    ) -> Self {
        Self {
            operation_id,
            command: command.into(),
            affected_resources: Vec::new(),
            environment,
            mutating,
            risk_level: RiskLevel::Medium,
            rollback_command: None,
            approval_state: ApprovalState::Pending,
            approver: None,
            requested_at,
            decided_at: None,
        }
    }
}
