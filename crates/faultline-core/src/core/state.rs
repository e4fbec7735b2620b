// crates/faultline-core/src/core/state.rs
// ============================================================================
// Module: Faultline Investigation State
// Description: Phase machine states, context usage, and the run aggregate.
// Purpose: Capture deterministic investigation evolution for replay and audit.
// Dependencies: crate::core::{hypothesis, identifiers, operation, time}, serde
// ============================================================================

//! ## Overview
//! Investigation state is the root aggregate owned by exactly one orchestrator
//! run. It records the current phase, the hypothesis forest, per-category
//! context usage, iteration accounting, and the terminal conclusion. All
//! changes are append-only where the audit trail is concerned: every
//! transition attempts exactly one audit emission, in transition order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hypothesis::HypothesisTree;
use crate::core::identifiers::InvestigationId;
use crate::core::operation::Operation;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Investigation Phase
// ============================================================================

/// Finite state machine phases for an investigation.
///
/// # Invariants
/// - Phases advance strictly in sequence; `Failed` and `Cancelled` are
///   reachable from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationPhase {
    /// Gathering incident context and seeding knowledge.
    Triage,
    /// Forming the initial hypothesis set.
    Hypothesize,
    /// Testing active hypotheses with targeted probes.
    Investigate,
    /// Deciding whether to keep investigating or conclude.
    Evaluate,
    /// Selecting the highest-confidence confirmed hypothesis.
    Conclude,
    /// Proposing and gating corrective actions.
    Remediate,
    /// Investigation finished normally.
    Complete,
    /// Investigation aborted on fatal error.
    Failed,
    /// Investigation cancelled by the caller.
    Cancelled,
}

impl InvestigationPhase {
    /// Returns a stable label for the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Triage => "triage",
            Self::Hypothesize => "hypothesize",
            Self::Investigate => "investigate",
            Self::Evaluate => "evaluate",
            Self::Conclude => "conclude",
            Self::Remediate => "remediate",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true for phases that end the run.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Cancelled)
    }
}

// ============================================================================
// SECTION: Context Usage
// ============================================================================

/// Token accounting categories tracked by the budget manager.
///
/// # Invariants
/// - Variants are stable for serialization and audit replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextCategory {
    /// Fixed system prompt tokens.
    SystemPrompt,
    /// Conversation history tokens.
    History,
    /// Retrieved knowledge context tokens.
    Knowledge,
    /// Raw tool result tokens.
    ToolResults,
    /// Serialized hypothesis state tokens.
    HypothesisState,
    /// Scratch working-memory tokens.
    WorkingMemory,
}

impl ContextCategory {
    /// All categories in canonical order.
    pub const ALL: [Self; 6] = [
        Self::SystemPrompt,
        Self::History,
        Self::Knowledge,
        Self::ToolResults,
        Self::HypothesisState,
        Self::WorkingMemory,
    ];
}

/// Per-category token counters against configured budgets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextUsage {
    /// System prompt tokens.
    pub system_prompt: u64,
    /// Conversation history tokens.
    pub history: u64,
    /// Knowledge context tokens.
    pub knowledge: u64,
    /// Tool result tokens.
    pub tool_results: u64,
    /// Hypothesis state tokens.
    pub hypothesis_state: u64,
    /// Working memory tokens.
    pub working_memory: u64,
}

impl ContextUsage {
    /// Returns the counter for a category.
    #[must_use]
    pub const fn get(&self, category: ContextCategory) -> u64 {
        match category {
            ContextCategory::SystemPrompt => self.system_prompt,
            ContextCategory::History => self.history,
            ContextCategory::Knowledge => self.knowledge,
            ContextCategory::ToolResults => self.tool_results,
            ContextCategory::HypothesisState => self.hypothesis_state,
            ContextCategory::WorkingMemory => self.working_memory,
        }
    }

    /// Adds tokens to a category counter.
    pub const fn add(&mut self, category: ContextCategory, tokens: u64) {
        match category {
            ContextCategory::SystemPrompt => {
                self.system_prompt = self.system_prompt.saturating_add(tokens);
            }
            ContextCategory::History => self.history = self.history.saturating_add(tokens),
            ContextCategory::Knowledge => self.knowledge = self.knowledge.saturating_add(tokens),
            ContextCategory::ToolResults => {
                self.tool_results = self.tool_results.saturating_add(tokens);
            }
            ContextCategory::HypothesisState => {
                self.hypothesis_state = self.hypothesis_state.saturating_add(tokens);
            }
            ContextCategory::WorkingMemory => {
                self.working_memory = self.working_memory.saturating_add(tokens);
            }
        }
    }

    /// Replaces a category counter.
    pub const fn set(&mut self, category: ContextCategory, tokens: u64) {
        match category {
            ContextCategory::SystemPrompt => self.system_prompt = tokens,
            ContextCategory::History => self.history = tokens,
            ContextCategory::Knowledge => self.knowledge = tokens,
            ContextCategory::ToolResults => self.tool_results = tokens,
            ContextCategory::HypothesisState => self.hypothesis_state = tokens,
            ContextCategory::WorkingMemory => self.working_memory = tokens,
        }
    }

    /// Returns total tokens across all categories.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.system_prompt
            .saturating_add(self.history)
            .saturating_add(self.knowledge)
            .saturating_add(self.tool_results)
            .saturating_add(self.hypothesis_state)
            .saturating_add(self.working_memory)
    }
}

// ============================================================================
// SECTION: Remediation Plan
// ============================================================================

/// Error policy for a remediation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepErrorPolicy {
    /// Abort the step on failure.
    #[default]
    Abort,
    /// Retry the step synchronously up to `max_retries` additional attempts.
    Retry,
}

/// One proposed corrective action within a remediation plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationStep {
    /// Command or verb text describing the action.
    pub command: String,
    /// Resources the step would touch.
    #[serde(default)]
    pub affected_resources: Vec<String>,
    /// Command that rolls the step back, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_command: Option<String>,
    /// True when the step mutates state.
    #[serde(default)]
    pub mutating: bool,
    /// Error policy for the step.
    #[serde(default)]
    pub on_error: StepErrorPolicy,
    /// Bounded retry count applied when `on_error` is `Retry`.
    #[serde(default)]
    pub max_retries: u32,
}

/// Remediation plan produced after root-cause conclusion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationPlan {
    /// Ordered corrective steps.
    pub steps: Vec<RemediationStep>,
}

/// Outcome of one remediation step after gating and execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemediationOutcome {
    /// Step executed after approval.
    Executed {
        /// Gated operation as finalized by the safety gate.
        operation: Operation,
        /// Number of attempts consumed (1 when no retries were needed).
        attempts: u32,
    },
    /// Step skipped with a recorded reason (denial, limit, cooldown, block).
    Skipped {
        /// Gated operation as finalized by the safety gate.
        operation: Operation,
        /// Human-readable reason the step did not execute.
        reason: String,
    },
    /// Step failed during execution after approval.
    Failed {
        /// Gated operation as finalized by the safety gate.
        operation: Operation,
        /// Execution error message.
        error: String,
        /// Number of attempts consumed.
        attempts: u32,
    },
}

// ============================================================================
// SECTION: Investigation State
// ============================================================================

/// Root aggregate for one investigation run.
///
/// # Invariants
/// - Owned exclusively by one orchestrator run; never shared across
///   concurrent investigations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationState {
    /// Investigation identifier.
    pub investigation_id: InvestigationId,
    /// Incident query under investigation.
    pub query: String,
    /// Current phase.
    pub phase: InvestigationPhase,
    /// Hypothesis forest.
    pub hypotheses: HypothesisTree,
    /// Per-category token counters.
    pub context_usage: ContextUsage,
    /// LLM round-trips consumed.
    pub iteration_count: u32,
    /// Run start timestamp.
    pub started_at: Timestamp,
    /// Concluded root cause text, once available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    /// Concluded confidence, once available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Ordered human-readable reasons for every degraded path taken.
    #[serde(default)]
    pub degradations: Vec<String>,
}

impl InvestigationState {
    /// Creates a fresh state in the triage phase.
    #[must_use]
    pub fn new(investigation_id: InvestigationId, query: impl Into<String>, started_at: Timestamp) -> Self {
        Self {
            investigation_id,
            query: query.into(),
            phase: InvestigationPhase::Triage,
            hypotheses: HypothesisTree::new(),
            context_usage: ContextUsage::default(),
            iteration_count: 0,
            started_at,
            root_cause: None,
            confidence: None,
            degradations: Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Investigation Result
// ============================================================================

/// Per-hypothesis summary included in the final result for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisSummary {
    /// Hypothesis identifier.
    pub id: crate::core::identifiers::HypothesisId,
    /// Hypothesis statement.
    pub statement: String,
    /// Final status.
    pub status: crate::core::hypothesis::HypothesisStatus,
    /// Final confidence.
    pub confidence: f64,
    /// Evidence count at conclusion.
    pub evidence_count: usize,
    /// Terminal status reason, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
}

/// Final result resolved by `investigate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationResult {
    /// Investigation identifier.
    pub investigation_id: InvestigationId,
    /// Terminal phase reached.
    pub phase: InvestigationPhase,
    /// Root cause text, when a hypothesis was concluded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    /// Confidence in the concluded root cause.
    pub confidence: f64,
    /// Services and resources the investigation implicated.
    pub affected_resources: Vec<String>,
    /// Remediation plan proposed at conclusion.
    pub remediation_plan: RemediationPlan,
    /// Per-step remediation outcomes after gating.
    pub remediation_outcomes: Vec<RemediationOutcome>,
    /// Per-hypothesis summaries for display.
    pub hypotheses: Vec<HypothesisSummary>,
    /// Iterations consumed.
    pub iterations: u32,
    /// Ordered human-readable degradation reasons.
    pub degradations: Vec<String>,
}
