// crates/faultline-core/src/core/mod.rs
// ============================================================================
// Module: Faultline Core Types
// Description: Canonical Faultline data model and audit structures.
// Purpose: Provide stable, serializable types for investigations and logs.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Faultline core types define the hypothesis tree, evidence records,
//! remediation operations, investigation state, and the audit event schema.
//! These types are the canonical source of truth for any derived surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod evidence;
pub mod hashing;
pub mod hypothesis;
pub mod identifiers;
pub mod operation;
pub mod state;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditEvent;
pub use audit::AuditRecord;
pub use evidence::Evidence;
pub use evidence::EvidenceSource;
pub use evidence::EvidenceStrength;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hypothesis::Hypothesis;
pub use hypothesis::HypothesisCategory;
pub use hypothesis::HypothesisStatus;
pub use hypothesis::HypothesisTree;
pub use identifiers::HypothesisId;
pub use identifiers::InvestigationId;
pub use identifiers::OperationId;
pub use identifiers::ToolName;
pub use operation::ApprovalDecision;
pub use operation::ApprovalState;
pub use operation::Environment;
pub use operation::Operation;
pub use operation::RiskLevel;
pub use state::ContextCategory;
pub use state::ContextUsage;
pub use state::HypothesisSummary;
pub use state::InvestigationPhase;
pub use state::InvestigationResult;
pub use state::InvestigationState;
pub use state::RemediationOutcome;
pub use state::RemediationPlan;
pub use state::RemediationStep;
pub use state::StepErrorPolicy;
pub use time::Timestamp;
