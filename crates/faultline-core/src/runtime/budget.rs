// crates/faultline-core/src/runtime/budget.rs
// ============================================================================
// Module: Faultline Context Budget Manager
// Description: Token accounting per category and working-memory compaction.
// Purpose: Keep the working context under configured limits without losing audit detail.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! The budget manager tracks token usage across context categories against
//! configured thresholds and triggers compaction once the total crosses the
//! compaction threshold. Compaction replaces verbose tool results and the
//! full hypothesis tree with summaries: confirmed hypotheses keep their key
//! evidence, pruned branches collapse to a one-line reason. Compaction is
//! lossy for in-context reasoning but lossless for audit; the report carries
//! a reference to the audit log for full detail recall.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hypothesis::HypothesisStatus;
use crate::core::hypothesis::HypothesisTree;
use crate::core::identifiers::HypothesisId;
use crate::core::identifiers::InvestigationId;
use crate::core::state::ContextCategory;
use crate::core::state::ContextUsage;

// ============================================================================
// SECTION: Token Estimation
// ============================================================================

/// Characters per token assumed by the estimation heuristic.
const CHARS_PER_TOKEN: usize = 4;

/// Estimates token usage for a text fragment (explicit chars/4 heuristic).
#[must_use]
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count();
    u64::try_from(chars.div_ceil(CHARS_PER_TOKEN)).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Budget Configuration
// ============================================================================

/// Token thresholds governing compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetThresholds {
    /// Total usage at which compaction triggers.
    pub context_threshold_tokens: u64,
    /// Hard ceiling on total context tokens.
    pub max_context_tokens: u64,
    /// Tokens withheld for the final response.
    pub reserve_tokens: u64,
}

impl Default for BudgetThresholds {
    fn default() -> Self {
        Self {
            context_threshold_tokens: 40_000,
            max_context_tokens: 100_000,
            reserve_tokens: 4_000,
        }
    }
}

// ============================================================================
// SECTION: Compaction Report
// ============================================================================

/// One-line summary retained for a collapsed hypothesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapsedHypothesis {
    /// Collapsed hypothesis identifier.
    pub id: HypothesisId,
    /// One-line summary replacing the full detail in working memory.
    pub summary: String,
}

/// Result of a compaction pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactionReport {
    /// Total tokens before compaction.
    pub before_tokens: u64,
    /// Total tokens after compaction.
    pub after_tokens: u64,
    /// Hypotheses collapsed to one-line summaries.
    pub collapsed: Vec<CollapsedHypothesis>,
    /// Working-memory summary retained in context.
    pub working_summary: String,
    /// Investigation whose audit log holds the full detail.
    pub audit_reference: InvestigationId,
}

// ============================================================================
// SECTION: Context Budget Manager
// ============================================================================

/// Tracks token usage and performs compaction under budget pressure.
#[derive(Debug, Clone)]
pub struct ContextBudget {
    /// Configured thresholds.
    thresholds: BudgetThresholds,
    /// Current per-category counters.
    usage: ContextUsage,
}

impl ContextBudget {
    /// Creates a budget manager with the provided thresholds.
    #[must_use]
    pub fn new(thresholds: BudgetThresholds) -> Self {
        Self {
            thresholds,
            usage: ContextUsage::default(),
        }
    }

    /// Returns the current per-category counters.
    #[must_use]
    pub const fn usage(&self) -> &ContextUsage {
        &self.usage
    }

    /// Records tokens against a category.
    pub const fn record(&mut self, category: ContextCategory, tokens: u64) {
        self.usage.add(category, tokens);
    }

    /// Records estimated tokens for a text fragment against a category.
    pub fn record_text(&mut self, category: ContextCategory, text: &str) {
        self.usage.add(category, estimate_tokens(text));
    }

    /// Returns true once total usage crosses the compaction threshold.
    #[must_use]
    pub const fn should_compact(&self) -> bool {
        self.usage.total() >= self.thresholds.context_threshold_tokens
    }

    /// Returns tokens available before the hard ceiling, net of the reserve.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.thresholds
            .max_context_tokens
            .saturating_sub(self.thresholds.reserve_tokens)
            .saturating_sub(self.usage.total())
    }

    /// Compacts working memory against the hypothesis tree.
    ///
    /// Pruned and merged hypotheses collapse to one-line reasons; confirmed
    /// hypotheses keep full evidence. Tool-result and hypothesis-state
    /// counters are replaced by post-compaction estimates; nothing is deleted
    /// from the audit sink.
    pub fn compact(
        &mut self,
        tree: &HypothesisTree,
        audit_reference: InvestigationId,
    ) -> CompactionReport {
        let before_tokens = self.usage.total();
        let mut collapsed = Vec::new();
        let mut summary_lines = Vec::new();
        let mut retained_tokens: u64 = 0;

        for id in tree.ids() {
            let Some(node) = tree.get(id) else {
                continue;
            };
            match node.status {
                HypothesisStatus::Pruned | HypothesisStatus::Merged => {
                    let reason = node.status_reason.as_deref().unwrap_or("no reason recorded");
                    let summary =
                        format!("{} [{}]: {}", id, status_label(node.status), reason);
                    retained_tokens = retained_tokens.saturating_add(estimate_tokens(&summary));
                    summary_lines.push(summary.clone());
                    collapsed.push(CollapsedHypothesis {
                        id: id.clone(),
                        summary,
                    });
                }
                HypothesisStatus::Confirmed | HypothesisStatus::Active => {
                    let serialized =
                        serde_json::to_string(node).unwrap_or_else(|_| node.statement.clone());
                    retained_tokens = retained_tokens.saturating_add(estimate_tokens(&serialized));
                    summary_lines.push(format!(
                        "{} [{}]: {} (confidence {:.3}, {} evidence items)",
                        id,
                        status_label(node.status),
                        node.statement,
                        node.confidence,
                        node.evidence.len()
                    ));
                }
            }
        }

        self.usage.set(ContextCategory::ToolResults, 0);
        self.usage.set(ContextCategory::HypothesisState, retained_tokens);
        let working_summary = summary_lines.join("\n");
        self.usage.set(ContextCategory::WorkingMemory, estimate_tokens(&working_summary));

        CompactionReport {
            before_tokens,
            after_tokens: self.usage.total(),
            collapsed,
            working_summary,
            audit_reference,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns a stable label for a hypothesis status.
const fn status_label(status: HypothesisStatus) -> &'static str {
    match status {
        HypothesisStatus::Active => "active",
        HypothesisStatus::Confirmed => "confirmed",
        HypothesisStatus::Pruned => "pruned",
        HypothesisStatus::Merged => "merged",
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
