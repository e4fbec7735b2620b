// crates/faultline-core/src/runtime/safety.rs
// ============================================================================
// Module: Faultline Safety Gate
// Description: Risk classification and approval gating for mutating operations.
// Purpose: Mediate every remediation action behind policy, limits, and approval.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The safety gate classifies a proposed mutating operation into a risk level
//! (first matching rule wins, in a fixed order), enforces the per-session
//! mutation cap and the critical-operation cooldown before approval is even
//! requested, and blocks execution until an approval decision or timeout.
//! Denylisted operations are rejected before classification runs and are
//! never offered for approval. Critical operations can never skip approval,
//! regardless of configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::operation::ApprovalState;
use crate::core::operation::Environment;
use crate::core::operation::Operation;
use crate::core::operation::RiskLevel;
use crate::core::time::Timestamp;
use crate::interfaces::ApprovalChannel;
use crate::interfaces::ApprovalError;

// ============================================================================
// SECTION: Risk Patterns
// ============================================================================

/// Patterns classified as critical risk (checked first).
pub const CRITICAL_PATTERNS: &[&str] = &[
    "delete",
    "terminate",
    "drop",
    "purge",
    "destroy",
    "truncate",
    "reset-password",
    "revoke-access",
];

/// Patterns classified as high risk (checked second).
pub const HIGH_RISK_PATTERNS: &[&str] = &[
    "restart",
    "reboot",
    "stop-service",
    "scale-down",
    "deploy-production",
    "modify-security",
];

// ============================================================================
// SECTION: Safety Policy
// ============================================================================

/// Policy configuration consumed by the safety gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyPolicy {
    /// Risk levels that require an approval decision.
    ///
    /// Critical always requires approval regardless of this set.
    pub require_approval: BTreeSet<RiskLevel>,
    /// Read-only verbs allowed to bypass the approval channel.
    pub skip_approval: BTreeSet<String>,
    /// Denylisted operation patterns rejected before classification.
    pub blocked_operations: BTreeSet<String>,
    /// Maximum approved mutations per session.
    pub max_mutations_per_session: u32,
    /// Minimum milliseconds between consecutive critical operations.
    pub cooldown_between_critical_ms: u64,
    /// Milliseconds to wait for an approval decision.
    pub approval_timeout_ms: u64,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        let mut require_approval = BTreeSet::new();
        require_approval.insert(RiskLevel::High);
        require_approval.insert(RiskLevel::Critical);
        Self {
            require_approval,
            skip_approval: BTreeSet::new(),
            blocked_operations: BTreeSet::new(),
            max_mutations_per_session: 10,
            cooldown_between_critical_ms: 60_000,
            approval_timeout_ms: 300_000,
        }
    }
}

// ============================================================================
// SECTION: Violations and Outcomes
// ============================================================================

/// Policy violations that reject an operation before approval.
///
/// # Invariants
/// - Violations are rejections surfaced as denials, never crashes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SafetyViolation {
    /// Operation matches the explicit denylist.
    #[error("operation blocked by policy: {0}")]
    BlockedOperation(String),
    /// The per-session mutation cap is exhausted.
    #[error("mutation limit exceeded: {limit} mutations already approved this session")]
    MutationLimitExceeded {
        /// Configured session cap.
        limit: u32,
    },
    /// A critical operation was requested inside the cooldown window.
    #[error("critical cooldown active: {remaining_ms} ms remaining")]
    CooldownActive {
        /// Milliseconds until the cooldown elapses.
        remaining_ms: u64,
    },
}

/// Outcome of gating one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Operation approved for execution.
    Approved {
        /// Finalized operation.
        operation: Operation,
        /// True when the skip list bypassed the approval channel.
        skipped_approval: bool,
    },
    /// Operation denied (explicit denial, timeout, or abort).
    Denied {
        /// Finalized operation.
        operation: Operation,
        /// Human-readable denial reason.
        reason: String,
    },
    /// Operation rejected outright before approval was requested.
    Rejected {
        /// Finalized operation.
        operation: Operation,
        /// Violated guard.
        violation: SafetyViolation,
    },
}

impl GateOutcome {
    /// Returns true when the operation may execute.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }
}

// ============================================================================
// SECTION: Risk Classification
// ============================================================================

/// Classifies an operation into a risk level.
///
/// Rules apply in order, first match wins: (1) critical pattern match, (2)
/// high-risk pattern match, (3) production mutation is high, (4) non-mutation
/// is low, (5) default medium. Pattern matching is case-insensitive over the
/// command text with whitespace and underscores normalized to hyphens, so
/// `"reset password"` matches `reset-password`.
#[must_use]
pub fn classify(operation: &Operation) -> RiskLevel {
    let normalized = normalize_command(&operation.command);
    if matches_any(&normalized, CRITICAL_PATTERNS) {
        return RiskLevel::Critical;
    }
    if matches_any(&normalized, HIGH_RISK_PATTERNS) {
        return RiskLevel::High;
    }
    if operation.environment == Environment::Production && operation.mutating {
        return RiskLevel::High;
    }
    if !operation.mutating {
        return RiskLevel::Low;
    }
    RiskLevel::Medium
}

/// Normalizes command text for pattern matching.
fn normalize_command(command: &str) -> String {
    command
        .to_ascii_lowercase()
        .chars()
        .map(|ch| if ch.is_whitespace() || ch == '_' { '-' } else { ch })
        .collect()
}

/// Returns true when any pattern occurs in the normalized command.
fn matches_any(normalized: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|pattern| normalized.contains(pattern))
}

// ============================================================================
// SECTION: Safety Gate
// ============================================================================

/// Stateful approval gate enforcing session limits and cooldowns.
#[derive(Debug)]
pub struct SafetyGate {
    /// Gate policy configuration.
    policy: SafetyPolicy,
    /// Approved mutations this session (monotonic).
    approved_mutations: u32,
    /// Timestamp of the last critical operation allowed through the cooldown.
    last_critical: Option<Timestamp>,
}

impl SafetyGate {
    /// Creates a gate with the provided policy.
    #[must_use]
    pub const fn new(policy: SafetyPolicy) -> Self {
        Self {
            policy,
            approved_mutations: 0,
            last_critical: None,
        }
    }

    /// Returns the count of mutations approved this session.
    #[must_use]
    pub const fn session_mutations(&self) -> u32 {
        self.approved_mutations
    }

    /// Returns the gate policy.
    #[must_use]
    pub const fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    /// Gates one proposed operation end to end.
    ///
    /// Order of enforcement: denylist (before classification), risk
    /// classification, per-session mutation cap, critical cooldown, skip
    /// list (read-only verbs only, never critical), approval channel.
    /// Timeout and abort both resolve to denial; an approved mutation
    /// advances the monotonic session counter.
    pub fn request_approval<C: ApprovalChannel>(
        &mut self,
        mut operation: Operation,
        now: Timestamp,
        channel: &C,
    ) -> GateOutcome {
        if let Some(pattern) = self.blocked_pattern(&operation.command) {
            operation.approval_state = ApprovalState::Denied;
            operation.decided_at = Some(now);
            return GateOutcome::Rejected {
                operation,
                violation: SafetyViolation::BlockedOperation(pattern),
            };
        }

        operation.risk_level = classify(&operation);

        if operation.mutating && self.approved_mutations >= self.policy.max_mutations_per_session {
            operation.approval_state = ApprovalState::Denied;
            operation.decided_at = Some(now);
            return GateOutcome::Rejected {
                operation,
                violation: SafetyViolation::MutationLimitExceeded {
                    limit: self.policy.max_mutations_per_session,
                },
            };
        }

        if operation.risk_level == RiskLevel::Critical {
            if let Some(remaining_ms) = self.cooldown_remaining(now) {
                operation.approval_state = ApprovalState::Denied;
                operation.decided_at = Some(now);
                return GateOutcome::Rejected {
                    operation,
                    violation: SafetyViolation::CooldownActive {
                        remaining_ms,
                    },
                };
            }
            self.last_critical = Some(now);
        }

        if self.may_skip_approval(&operation) {
            operation.approval_state = ApprovalState::Approved;
            operation.approver = Some("policy:skip_approval".to_string());
            operation.decided_at = Some(now);
            self.record_approval(&operation);
            return GateOutcome::Approved {
                operation,
                skipped_approval: true,
            };
        }

        if !self.requires_approval(operation.risk_level) {
            operation.approval_state = ApprovalState::Approved;
            operation.approver = Some("policy:auto".to_string());
            operation.decided_at = Some(now);
            self.record_approval(&operation);
            return GateOutcome::Approved {
                operation,
                skipped_approval: true,
            };
        }

        match channel.request(&operation, self.policy.approval_timeout_ms) {
            Ok(decision) => {
                operation.decided_at = Some(now);
                operation.approver = decision.approver.clone();
                if decision.approved {
                    operation.approval_state = ApprovalState::Approved;
                    self.record_approval(&operation);
                    GateOutcome::Approved {
                        operation,
                        skipped_approval: false,
                    }
                } else {
                    operation.approval_state = ApprovalState::Denied;
                    let reason = decision
                        .reason
                        .unwrap_or_else(|| "approval denied".to_string());
                    GateOutcome::Denied {
                        operation,
                        reason,
                    }
                }
            }
            Err(ApprovalError::Timeout(waited_ms)) => {
                operation.approval_state = ApprovalState::Expired;
                operation.decided_at = Some(now);
                GateOutcome::Denied {
                    operation,
                    reason: format!("approval timed out after {waited_ms} ms"),
                }
            }
            Err(err) => {
                operation.approval_state = ApprovalState::Denied;
                operation.decided_at = Some(now);
                GateOutcome::Denied {
                    operation,
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Returns the denylist pattern matching the command, if any.
    fn blocked_pattern(&self, command: &str) -> Option<String> {
        let normalized = normalize_command(command);
        self.policy
            .blocked_operations
            .iter()
            .find(|pattern| normalized.contains(normalize_command(pattern).as_str()))
            .cloned()
    }

    /// Returns remaining cooldown milliseconds when inside the window.
    fn cooldown_remaining(&self, now: Timestamp) -> Option<u64> {
        let last = self.last_critical?;
        let elapsed = now.millis_since(&last)?;
        if elapsed < self.policy.cooldown_between_critical_ms {
            Some(self.policy.cooldown_between_critical_ms - elapsed)
        } else {
            None
        }
    }

    /// Returns true when the skip list bypasses the channel.
    ///
    /// Only non-mutating verbs may skip, and never a critical operation.
    fn may_skip_approval(&self, operation: &Operation) -> bool {
        if operation.risk_level == RiskLevel::Critical || operation.mutating {
            return false;
        }
        let normalized = normalize_command(&operation.command);
        self.policy
            .skip_approval
            .iter()
            .any(|verb| normalized.starts_with(normalize_command(verb).as_str()))
    }

    /// Returns true when the risk level requires a channel decision.
    fn requires_approval(&self, risk: RiskLevel) -> bool {
        risk == RiskLevel::Critical || self.policy.require_approval.contains(&risk)
    }

    /// Advances the monotonic mutation counter for approved mutations.
    const fn record_approval(&mut self, operation: &Operation) {
        if operation.mutating {
            self.approved_mutations = self.approved_mutations.saturating_add(1);
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
