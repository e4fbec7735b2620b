// crates/faultline-core/src/runtime/engine.rs
// ============================================================================
// Module: Faultline Hypothesis Engine
// Description: Single-writer mutation operations over the hypothesis tree.
// Purpose: Form, branch, prune, merge, confirm, and prioritize hypotheses.
// Dependencies: crate::{core, runtime::evaluator}
// ============================================================================

//! ## Overview
//! The hypothesis engine is the single canonical mutation path for the
//! hypothesis tree. Evidence gathering may be parallel, but every tree
//! mutation flows through these methods sequentially so the orchestrator can
//! emit one audit event per transition, in transition order. The engine
//! decides branch, prune, and merge from the evaluator's output, not from
//! orchestration control flow.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::evidence::Evidence;
use crate::core::evidence::EvidenceStrength;
use crate::core::hypothesis::Hypothesis;
use crate::core::hypothesis::HypothesisCategory;
use crate::core::hypothesis::HypothesisStatus;
use crate::core::hypothesis::HypothesisTree;
use crate::core::identifiers::HypothesisId;
use crate::core::time::Timestamp;
use crate::runtime::evaluator;

// ============================================================================
// SECTION: Prioritization Weights
// ============================================================================

/// Weight applied to the initial probability.
pub const WEIGHT_BASE_PROBABILITY: f64 = 0.4;
/// Weight applied to the knowledge-base match score.
pub const WEIGHT_KNOWLEDGE_MATCH: f64 = 0.3;
/// Weight applied to recency of the latest related signal.
pub const WEIGHT_RECENCY: f64 = 0.2;
/// Weight applied to the potential severity of the category.
pub const WEIGHT_SEVERITY: f64 = 0.1;

// ============================================================================
// SECTION: Candidates and Outcomes
// ============================================================================

/// Candidate hypothesis proposed by triage or a branch step.
#[derive(Debug, Clone, PartialEq)]
pub struct HypothesisCandidate {
    /// Candidate explanation text.
    pub statement: String,
    /// Explanation category.
    pub category: HypothesisCategory,
    /// Initial probability in `[0, 1]`.
    pub base_probability: f64,
    /// True when the candidate matches a known historical pattern.
    pub knowledge_match: bool,
}

/// Outcome of a branch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    /// Children were created and linked under the parent.
    Branched {
        /// Child identifiers in formation order.
        children: Vec<HypothesisId>,
    },
    /// The branch was rejected as a no-op with an explicit reason.
    Rejected {
        /// Rejection reason (for example `"max depth reached"`).
        reason: String,
    },
}

/// Prune candidate surfaced by the maintenance pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneCandidate {
    /// Hypothesis that should be pruned.
    pub id: HypothesisId,
    /// Reason the prune rule fired.
    pub reason: String,
}

/// Merge candidate surfaced by the maintenance pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCandidate {
    /// Hypothesis to absorb.
    pub source: HypothesisId,
    /// Surviving hypothesis.
    pub into: HypothesisId,
    /// Shared source-normalized signal that justified the merge.
    pub signal: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Hypothesis engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Hypothesis id is not present in the tree.
    #[error("hypothesis not found: {0}")]
    NotFound(String),
    /// Hypothesis is no longer active.
    #[error("hypothesis is not active: {0}")]
    NotActive(String),
    /// Merge source and target are the same hypothesis.
    #[error("cannot merge a hypothesis into itself: {0}")]
    SelfMerge(String),
}

// ============================================================================
// SECTION: Hypothesis Engine
// ============================================================================

/// Single-writer mutation engine over the hypothesis tree.
#[derive(Debug, Clone, Copy)]
pub struct HypothesisEngine {
    /// Maximum tree depth; branching at the boundary is rejected.
    max_depth: u32,
}

impl HypothesisEngine {
    /// Creates an engine with the provided depth ceiling.
    #[must_use]
    pub const fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
        }
    }

    /// Returns the configured depth ceiling.
    #[must_use]
    pub const fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Forms root hypotheses from triage candidates.
    ///
    /// Roots are numbered in candidate order (`h1`, `h2`, ...) continuing
    /// after any existing roots, so repeated formation never collides.
    pub fn form(
        &self,
        tree: &mut HypothesisTree,
        candidates: Vec<HypothesisCandidate>,
    ) -> Vec<HypothesisId> {
        let mut formed = Vec::with_capacity(candidates.len());
        let offset = tree.roots().len();
        for (index, candidate) in candidates.into_iter().enumerate() {
            let id = HypothesisId::root(offset + index + 1);
            let mut hypothesis = Hypothesis::new(
                id.clone(),
                candidate.statement,
                candidate.category,
                candidate.base_probability,
            );
            hypothesis.knowledge_match = candidate.knowledge_match;
            tree.insert(hypothesis);
            formed.push(id);
        }
        formed
    }

    /// Attaches evidence to a hypothesis and rescores its confidence.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the id is unknown and
    /// [`EngineError::NotActive`] when the hypothesis lifecycle has ended.
    pub fn attach_evidence(
        &self,
        tree: &mut HypothesisTree,
        id: &HypothesisId,
        evidence: Evidence,
    ) -> Result<f64, EngineError> {
        let node = tree
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        if node.status != HypothesisStatus::Active {
            return Err(EngineError::NotActive(id.to_string()));
        }
        node.evidence.push(evidence);
        let confidence = evaluator::score(node);
        node.confidence = confidence;
        Ok(confidence)
    }

    /// Branches a hypothesis into sub-hypotheses explaining why it holds.
    ///
    /// Permitted only when the most recent evidence is strong and the parent
    /// sits below the depth ceiling. At the ceiling, or with non-strong
    /// latest evidence, the branch is rejected as an explicit no-op and the
    /// parent stays active.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the parent is unknown and
    /// [`EngineError::NotActive`] when the parent lifecycle has ended.
    pub fn branch(
        &self,
        tree: &mut HypothesisTree,
        parent: &HypothesisId,
        candidates: Vec<HypothesisCandidate>,
    ) -> Result<BranchOutcome, EngineError> {
        let node = tree
            .get(parent)
            .ok_or_else(|| EngineError::NotFound(parent.to_string()))?;
        if node.status != HypothesisStatus::Active {
            return Err(EngineError::NotActive(parent.to_string()));
        }
        if node.depth >= self.max_depth {
            return Ok(BranchOutcome::Rejected {
                reason: "max depth reached".to_string(),
            });
        }
        let latest_strong = node
            .latest_evidence()
            .is_some_and(|evidence| evidence.strength == EvidenceStrength::Strong);
        if !latest_strong {
            return Ok(BranchOutcome::Rejected {
                reason: "latest evidence is not strong".to_string(),
            });
        }

        let existing_children = node.children.len();
        let mut children = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.into_iter().enumerate() {
            let child_id = parent.child(existing_children + index + 1);
            let mut child = Hypothesis::new(
                child_id.clone(),
                candidate.statement,
                candidate.category,
                candidate.base_probability,
            );
            child.knowledge_match = candidate.knowledge_match;
            tree.insert(child);
            children.push(child_id);
        }
        if let Some(node) = tree.get_mut(parent) {
            node.children.extend(children.iter().cloned());
        }
        Ok(BranchOutcome::Branched {
            children,
        })
    }

    /// Prunes a hypothesis, recording the reason verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the id is unknown and
    /// [`EngineError::NotActive`] when the hypothesis lifecycle has ended.
    pub fn prune(
        &self,
        tree: &mut HypothesisTree,
        id: &HypothesisId,
        reason: impl Into<String>,
    ) -> Result<(), EngineError> {
        let node = tree
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        if node.status != HypothesisStatus::Active {
            return Err(EngineError::NotActive(id.to_string()));
        }
        node.status = HypothesisStatus::Pruned;
        node.status_reason = Some(reason.into());
        Ok(())
    }

    /// Merges `source` into `into`, unioning evidence and rescoring.
    ///
    /// The absorbed hypothesis is marked merged and kept for audit, not
    /// deleted. Returns the survivor's rescored confidence.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SelfMerge`] when both ids are equal,
    /// [`EngineError::NotFound`] when either id is unknown, and
    /// [`EngineError::NotActive`] when either lifecycle has ended.
    pub fn merge(
        &self,
        tree: &mut HypothesisTree,
        source: &HypothesisId,
        into: &HypothesisId,
        reason: impl Into<String>,
    ) -> Result<f64, EngineError> {
        if source == into {
            return Err(EngineError::SelfMerge(source.to_string()));
        }
        let source_node = tree
            .get(source)
            .ok_or_else(|| EngineError::NotFound(source.to_string()))?;
        if source_node.status != HypothesisStatus::Active {
            return Err(EngineError::NotActive(source.to_string()));
        }
        let absorbed = source_node.evidence.clone();
        let target = tree
            .get(into)
            .ok_or_else(|| EngineError::NotFound(into.to_string()))?;
        if target.status != HypothesisStatus::Active {
            return Err(EngineError::NotActive(into.to_string()));
        }

        let reason = reason.into();
        if let Some(node) = tree.get_mut(source) {
            node.status = HypothesisStatus::Merged;
            node.status_reason = Some(reason);
        }
        let confidence = if let Some(node) = tree.get_mut(into) {
            node.evidence.extend(absorbed);
            let rescored = evaluator::score(node);
            node.confidence = rescored;
            rescored
        } else {
            0.0
        };
        Ok(confidence)
    }

    /// Confirms a hypothesis and returns its confidence.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the id is unknown and
    /// [`EngineError::NotActive`] when the hypothesis lifecycle has ended.
    pub fn confirm(
        &self,
        tree: &mut HypothesisTree,
        id: &HypothesisId,
        reason: impl Into<String>,
    ) -> Result<f64, EngineError> {
        let node = tree
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        if node.status != HypothesisStatus::Active {
            return Err(EngineError::NotActive(id.to_string()));
        }
        node.status = HypothesisStatus::Confirmed;
        node.status_reason = Some(reason.into());
        Ok(node.confidence)
    }

    /// Orders active hypotheses by testing priority.
    ///
    /// Weighted sum: initial probability 0.4, knowledge-base match 0.3,
    /// recency of the latest related signal 0.2, potential severity 0.1.
    /// Ties break by insertion order (earlier-formed hypothesis wins).
    #[must_use]
    pub fn prioritize(&self, tree: &HypothesisTree) -> Vec<HypothesisId> {
        let actives = tree.active_ids();
        let (oldest, newest) = signal_bounds(tree, &actives);
        let mut ranked: Vec<(usize, f64, HypothesisId)> = actives
            .into_iter()
            .filter_map(|id| {
                let node = tree.get(&id)?;
                let index = tree.insertion_index(&id).unwrap_or(usize::MAX);
                Some((index, priority_score(node, oldest, newest), id))
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0))
        });
        ranked.into_iter().map(|(_, _, id)| id).collect()
    }

    /// Surfaces hypotheses the prune rule applies to.
    ///
    /// Fires when the latest evidence has strength none, when evidence
    /// directly contradicts the hypothesis, or when all children are pruned.
    #[must_use]
    pub fn prune_candidates(&self, tree: &HypothesisTree) -> Vec<PruneCandidate> {
        let mut candidates = Vec::new();
        for id in tree.active_ids() {
            let Some(node) = tree.get(&id) else {
                continue;
            };
            if let Some(latest) = node.latest_evidence() {
                if latest.contradicts() {
                    candidates.push(PruneCandidate {
                        id: id.clone(),
                        reason: "evidence directly contradicts the hypothesis".to_string(),
                    });
                    continue;
                }
                if latest.strength == EvidenceStrength::None {
                    let reason = latest
                        .reason
                        .clone()
                        .map_or_else(
                            || "no supporting evidence".to_string(),
                            |reason| format!("no supporting evidence: {reason}"),
                        );
                    candidates.push(PruneCandidate {
                        id: id.clone(),
                        reason,
                    });
                    continue;
                }
            }
            if tree.all_children_pruned(&id) {
                candidates.push(PruneCandidate {
                    id,
                    reason: "all children pruned".to_string(),
                });
            }
        }
        candidates
    }

    /// Surfaces hypothesis pairs whose latest strong evidence shares a signal.
    ///
    /// The earlier-formed hypothesis survives; the later one is absorbed.
    /// Ancestor/descendant pairs never merge.
    #[must_use]
    pub fn merge_candidates(&self, tree: &HypothesisTree) -> Vec<MergeCandidate> {
        let actives = tree.active_ids();
        let mut candidates = Vec::new();
        for (index, into) in actives.iter().enumerate() {
            let Some(signal) = latest_strong_signal(tree, into) else {
                continue;
            };
            for source in actives.iter().skip(index + 1) {
                if into.related_to(source) {
                    continue;
                }
                if latest_strong_signal(tree, source).as_deref() == Some(signal.as_str()) {
                    candidates.push(MergeCandidate {
                        source: source.clone(),
                        into: into.clone(),
                        signal: signal.clone(),
                    });
                }
            }
        }
        candidates
    }
}

// ============================================================================
// SECTION: Priority Helpers
// ============================================================================

/// Computes the weighted priority score for a hypothesis.
fn priority_score(node: &Hypothesis, oldest: i128, newest: i128) -> f64 {
    let knowledge = if node.knowledge_match { 1.0 } else { 0.0 };
    let recency = recency_score(node, oldest, newest);
    WEIGHT_BASE_PROBABILITY * node.base_probability
        + WEIGHT_KNOWLEDGE_MATCH * knowledge
        + WEIGHT_RECENCY * recency
        + WEIGHT_SEVERITY * node.category.severity()
}

/// Returns the normalized recency of the latest evidence signal in `[0, 1]`.
fn recency_score(node: &Hypothesis, oldest: i128, newest: i128) -> f64 {
    let Some(observed) = node.latest_evidence().map(|evidence| timestamp_rank(evidence.observed_at))
    else {
        return 0.0;
    };
    if newest <= oldest {
        return 1.0;
    }
    let span = newest - oldest;
    let offset = observed - oldest;
    ratio_i128(offset, span).clamp(0.0, 1.0)
}

/// Returns an `i128/i128` ratio as a float without precision panics.
#[allow(clippy::cast_precision_loss, reason = "Recency ranking tolerates float rounding.")]
fn ratio_i128(numerator: i128, denominator: i128) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// Returns the oldest and newest evidence timestamps across active nodes.
fn signal_bounds(tree: &HypothesisTree, actives: &[HypothesisId]) -> (i128, i128) {
    let mut oldest = i128::MAX;
    let mut newest = i128::MIN;
    for id in actives {
        if let Some(observed) =
            tree.get(id).and_then(Hypothesis::latest_evidence).map(|evidence| {
                timestamp_rank(evidence.observed_at)
            })
        {
            oldest = oldest.min(observed);
            newest = newest.max(observed);
        }
    }
    if oldest == i128::MAX {
        (0, 0)
    } else {
        (oldest, newest)
    }
}

/// Projects a timestamp onto a single comparable axis.
const fn timestamp_rank(timestamp: Timestamp) -> i128 {
    match timestamp {
        Timestamp::UnixMillis(value) => value as i128,
        Timestamp::Logical(value) => value as i128,
    }
}

/// Returns the latest strong evidence signal for a hypothesis, if any.
fn latest_strong_signal(tree: &HypothesisTree, id: &HypothesisId) -> Option<String> {
    let node = tree.get(id)?;
    let latest = node.latest_evidence()?;
    if latest.strength == EvidenceStrength::Strong {
        Some(latest.source.normalized_signal())
    } else {
        None
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

    use serde_json::json;

    use crate::core::evidence::EvidenceSource;
    use crate::core::identifiers::ToolName;

    use super::*;

    fn candidate(statement: &str, base: f64, knowledge_match: bool) -> HypothesisCandidate {
        HypothesisCandidate {
            statement: statement.to_string(),
            category: HypothesisCategory::Infrastructure,
            base_probability: base,
            knowledge_match,
        }
    }

    fn evidence(tool: &str, strength: EvidenceStrength, at: u64) -> Evidence {
        Evidence {
            source: EvidenceSource {
                tool: ToolName::new(tool),
                args: json!({}),
            },
            strength,
            data: json!({"detail": "fixture"}),
            correlation: match strength {
                EvidenceStrength::Strong => 0.9,
                EvidenceStrength::Weak => 0.5,
                EvidenceStrength::None => 0.1,
            },
            observed_at: Timestamp::Logical(at),
            reason: None,
        }
    }

    fn seeded_tree(engine: &HypothesisEngine) -> HypothesisTree {
        let mut tree = HypothesisTree::new();
        engine.form(&mut tree, vec![
            candidate("connection pool exhausted", 0.6, false),
            candidate("bad deploy rolled out", 0.3, false),
        ]);
        tree
    }

    #[test]
    fn roots_number_past_existing_ones() {
        let engine = HypothesisEngine::new(3);
        let mut tree = seeded_tree(&engine);
        let formed = engine.form(&mut tree, vec![candidate("dns flapping", 0.2, false)]);
        assert_eq!(formed, vec![HypothesisId::new("h3")]);
        assert_eq!(tree.roots().len(), 3);
    }

    #[test]
    fn attach_evidence_rescores_confidence() {
        let engine = HypothesisEngine::new(3);
        let mut tree = seeded_tree(&engine);
        let id = HypothesisId::new("h1");
        let confidence = engine
            .attach_evidence(&mut tree, &id, evidence("metrics", EvidenceStrength::Strong, 1))
            .unwrap();
        assert!((confidence - 0.78).abs() < 1e-9);
        assert_eq!(tree.get(&id).unwrap().evidence.len(), 1);
    }

    #[test]
    fn attach_to_terminal_hypothesis_is_rejected() {
        let engine = HypothesisEngine::new(3);
        let mut tree = seeded_tree(&engine);
        let id = HypothesisId::new("h2");
        engine.prune(&mut tree, &id, "ruled out").unwrap();
        let err = engine
            .attach_evidence(&mut tree, &id, evidence("logs", EvidenceStrength::Weak, 2))
            .unwrap_err();
        assert!(matches!(err, EngineError::NotActive(_)));
    }

    #[test]
    fn branch_requires_strong_latest_evidence() {
        let engine = HypothesisEngine::new(3);
        let mut tree = seeded_tree(&engine);
        let id = HypothesisId::new("h1");
        let outcome = engine
            .branch(&mut tree, &id, vec![candidate("pool leak in worker", 0.5, false)])
            .unwrap();
        assert_eq!(outcome, BranchOutcome::Rejected {
            reason: "latest evidence is not strong".to_string(),
        });
    }

    #[test]
    fn branch_links_children_under_parent() {
        let engine = HypothesisEngine::new(3);
        let mut tree = seeded_tree(&engine);
        let id = HypothesisId::new("h1");
        engine
            .attach_evidence(&mut tree, &id, evidence("metrics", EvidenceStrength::Strong, 1))
            .unwrap();
        let outcome = engine
            .branch(&mut tree, &id, vec![
                candidate("pool leak in worker", 0.5, false),
                candidate("pool sized too small", 0.4, false),
            ])
            .unwrap();
        let BranchOutcome::Branched {
            children,
        } = outcome
        else {
            panic!("expected branch");
        };
        assert_eq!(children, vec![HypothesisId::new("h1.1"), HypothesisId::new("h1.2")]);
        assert_eq!(tree.get(&id).unwrap().children, children);
        assert_eq!(tree.get(&children[0]).unwrap().depth, 1);
    }

    #[test]
    fn branch_at_depth_ceiling_is_rejected_not_an_error() {
        let engine = HypothesisEngine::new(0);
        let mut tree = seeded_tree(&engine);
        let id = HypothesisId::new("h1");
        engine
            .attach_evidence(&mut tree, &id, evidence("metrics", EvidenceStrength::Strong, 1))
            .unwrap();
        let outcome = engine
            .branch(&mut tree, &id, vec![candidate("pool leak in worker", 0.5, false)])
            .unwrap();
        assert_eq!(outcome, BranchOutcome::Rejected {
            reason: "max depth reached".to_string(),
        });
        assert_eq!(tree.get(&id).unwrap().status, HypothesisStatus::Active);
    }

    #[test]
    fn merge_unions_evidence_and_marks_source() {
        let engine = HypothesisEngine::new(3);
        let mut tree = seeded_tree(&engine);
        let left = HypothesisId::new("h1");
        let right = HypothesisId::new("h2");
        engine
            .attach_evidence(&mut tree, &left, evidence("metrics", EvidenceStrength::Strong, 1))
            .unwrap();
        engine
            .attach_evidence(&mut tree, &right, evidence("metrics", EvidenceStrength::Strong, 2))
            .unwrap();
        engine.merge(&mut tree, &right, &left, "duplicate signal: metrics").unwrap();
        assert_eq!(tree.get(&left).unwrap().evidence.len(), 2);
        assert_eq!(tree.get(&right).unwrap().status, HypothesisStatus::Merged);
    }

    #[test]
    fn self_merge_is_rejected() {
        let engine = HypothesisEngine::new(3);
        let mut tree = seeded_tree(&engine);
        let id = HypothesisId::new("h1");
        let err = engine.merge(&mut tree, &id, &id, "noop").unwrap_err();
        assert!(matches!(err, EngineError::SelfMerge(_)));
    }

    #[test]
    fn prioritize_weighs_knowledge_match_over_base_probability_gap() {
        let engine = HypothesisEngine::new(3);
        let mut tree = HypothesisTree::new();
        engine.form(&mut tree, vec![
            candidate("slightly likelier", 0.5, false),
            candidate("matches a known incident", 0.4, true),
        ]);
        let ranked = engine.prioritize(&tree);
        assert_eq!(ranked[0], HypothesisId::new("h2"));
    }

    #[test]
    fn prioritize_breaks_ties_by_insertion_order() {
        let engine = HypothesisEngine::new(3);
        let mut tree = HypothesisTree::new();
        engine.form(&mut tree, vec![
            candidate("first formed", 0.5, false),
            candidate("second formed", 0.5, false),
        ]);
        let ranked = engine.prioritize(&tree);
        assert_eq!(ranked, vec![HypothesisId::new("h1"), HypothesisId::new("h2")]);
    }

    #[test]
    fn prune_candidates_fire_on_no_support_and_contradiction() {
        let engine = HypothesisEngine::new(3);
        let mut tree = seeded_tree(&engine);
        let first = HypothesisId::new("h1");
        let second = HypothesisId::new("h2");

        let mut annotated = evidence("metrics", EvidenceStrength::None, 1);
        annotated.correlation = 0.0;
        annotated.reason = Some("timeout".to_string());
        engine.attach_evidence(&mut tree, &first, annotated).unwrap();

        let mut contradicting = evidence("logs", EvidenceStrength::None, 2);
        contradicting.correlation = 0.0;
        engine.attach_evidence(&mut tree, &second, contradicting).unwrap();

        let candidates = engine.prune_candidates(&tree);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].reason, "no supporting evidence: timeout");
        assert_eq!(candidates[1].reason, "evidence directly contradicts the hypothesis");
    }

    #[test]
    fn merge_candidates_pair_duplicate_strong_signals() {
        let engine = HypothesisEngine::new(3);
        let mut tree = seeded_tree(&engine);
        let first = HypothesisId::new("h1");
        let second = HypothesisId::new("h2");
        engine
            .attach_evidence(&mut tree, &first, evidence("metrics", EvidenceStrength::Strong, 1))
            .unwrap();
        engine
            .attach_evidence(&mut tree, &second, evidence("metrics", EvidenceStrength::Strong, 2))
            .unwrap();
        let candidates = engine.merge_candidates(&tree);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].source, second);
        assert_eq!(candidates[0].into, first);
        assert_eq!(candidates[0].signal, "metrics");
    }
}
