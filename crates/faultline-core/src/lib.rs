// crates/faultline-core/src/lib.rs
// ============================================================================
// Module: Faultline Core Library
// Description: Public API surface for the Faultline investigation core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Faultline core provides hypothesis-driven incident investigation: a phase
//! orchestrator, a hypothesis tree with evidence-scored confidence, a context
//! budget manager, and a safety gate for mutating operations. It is
//! backend-agnostic and integrates through explicit interfaces (model
//! provider, tool executor, knowledge retriever, audit sink, approval
//! channel, clock) rather than embedding into agent frameworks. Time is
//! always injected, so a run driven by a logical clock replays
//! deterministically.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ApprovalChannel;
pub use interfaces::ApprovalError;
pub use interfaces::AuditError;
pub use interfaces::AuditSink;
pub use interfaces::Clock;
pub use interfaces::KnowledgeDoc;
pub use interfaces::KnowledgeError;
pub use interfaces::KnowledgeRetriever;
pub use interfaces::LlmError;
pub use interfaces::LlmProvider;
pub use interfaces::LogicalClock;
pub use interfaces::ToolCall;
pub use interfaces::ToolDescriptor;
pub use interfaces::ToolExecutionError;
pub use interfaces::ToolExecutor;
pub use runtime::BudgetThresholds;
pub use runtime::CompactionReport;
pub use runtime::ContextBudget;
pub use runtime::GateOutcome;
pub use runtime::HypothesisCandidate;
pub use runtime::HypothesisEngine;
pub use runtime::Orchestrator;
pub use runtime::OrchestratorConfig;
pub use runtime::OrchestratorError;
pub use runtime::OrchestratorLimits;
pub use runtime::SafetyGate;
pub use runtime::SafetyPolicy;
pub use runtime::SafetyViolation;
