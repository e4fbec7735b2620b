// crates/faultline-core/src/runtime/mod.rs
// ============================================================================
// Module: Faultline Runtime
// Description: Orchestrator, hypothesis engine, evaluator, budget, and gate.
// Purpose: Execute investigations against injected provider implementations.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the investigation loop: the orchestrator drives
//! phases, the engine maintains the hypothesis tree, the evaluator scores
//! evidence under the fixed confidence contract, the budget manager compacts
//! working context, and the safety gate mediates every mutating operation.
//! All entry points route through the same engine logic so a replayed audit
//! trail reconstructs the identical tree.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod budget;
pub mod decode;
pub mod engine;
pub mod evaluator;
pub mod orchestrator;
pub mod safety;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use budget::BudgetThresholds;
pub use budget::CollapsedHypothesis;
pub use budget::CompactionReport;
pub use budget::ContextBudget;
pub use budget::estimate_tokens;
pub use decode::ConclusionResponse;
pub use decode::DecodeError;
pub use decode::HypothesisProposal;
pub use decode::HypothesisSetResponse;
pub use decode::ProbePlanResponse;
pub use decode::ProbeRequest;
pub use decode::RemediationPlanResponse;
pub use decode::RemediationStepProposal;
pub use decode::TriageResponse;
pub use decode::decode;
pub use engine::BranchOutcome;
pub use engine::EngineError;
pub use engine::HypothesisCandidate;
pub use engine::HypothesisEngine;
pub use engine::MergeCandidate;
pub use engine::PruneCandidate;
pub use evaluator::classify;
pub use evaluator::correlate;
pub use evaluator::score;
pub use evaluator::strength_from_correlation;
pub use orchestrator::Orchestrator;
pub use orchestrator::OrchestratorConfig;
pub use orchestrator::OrchestratorError;
pub use orchestrator::OrchestratorLimits;
pub use safety::GateOutcome;
pub use safety::SafetyGate;
pub use safety::SafetyPolicy;
pub use safety::SafetyViolation;
pub use safety::classify as classify_risk;
