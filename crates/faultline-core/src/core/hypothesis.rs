// crates/faultline-core/src/core/hypothesis.rs
// ============================================================================
// Module: Faultline Hypothesis Model
// Description: Hypothesis records and the arena-backed hypothesis tree.
// Purpose: Capture candidate explanations and their evidence-backed lifecycle.
// Dependencies: crate::core::{evidence, identifiers}, serde
// ============================================================================

//! ## Overview
//! Hypotheses form a forest: triage produces several sibling roots, and
//! branching creates children that explain *why* a strongly-supported parent
//! is true. The tree is an arena of records keyed by hierarchical id, with
//! `children` storing ids rather than owned nodes, so mutation operations are
//! simple index updates. All mutation flows through the hypothesis engine;
//! the tree itself only enforces structural invariants.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::evidence::Evidence;
use crate::core::identifiers::HypothesisId;

// ============================================================================
// SECTION: Hypothesis Category
// ============================================================================

/// Fixed enumeration of incident explanation categories.
///
/// # Invariants
/// - Variants are stable for serialization and audit replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisCategory {
    /// Compute, storage, or platform infrastructure failure.
    Infrastructure,
    /// Recent deployment or release defect.
    Deployment,
    /// Upstream or third-party dependency failure.
    Dependency,
    /// Traffic volume or pattern anomaly.
    Traffic,
    /// Data corruption or data-shape drift.
    Data,
    /// Security incident or abuse.
    Security,
    /// Configuration drift or misconfiguration.
    Configuration,
    /// Network partition, DNS, or routing failure.
    Network,
    /// External provider or environmental cause.
    External,
}

impl HypothesisCategory {
    /// Returns the potential-severity weight used by prioritization.
    ///
    /// Fixed mapping: security/data 1.0, infrastructure/deployment 0.8,
    /// network/dependency 0.6, traffic/configuration 0.4, external 0.2.
    #[must_use]
    pub const fn severity(self) -> f64 {
        match self {
            Self::Security | Self::Data => 1.0,
            Self::Infrastructure | Self::Deployment => 0.8,
            Self::Network | Self::Dependency => 0.6,
            Self::Traffic | Self::Configuration => 0.4,
            Self::External => 0.2,
        }
    }
}

// ============================================================================
// SECTION: Hypothesis Status
// ============================================================================

/// Hypothesis lifecycle status.
///
/// # Invariants
/// - A hypothesis only transitions `Active` to a terminal status, never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisStatus {
    /// Under active investigation.
    Active,
    /// Confirmed as a root-cause explanation.
    Confirmed,
    /// Removed from consideration for lack of evidence.
    Pruned,
    /// Absorbed into another hypothesis sharing the same signal.
    Merged,
}

impl HypothesisStatus {
    /// Returns true for statuses that end the hypothesis lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

// ============================================================================
// SECTION: Hypothesis Records
// ============================================================================

/// Candidate explanation for an incident with an evidence-backed confidence.
///
/// # Invariants
/// - `depth` equals the depth encoded by `id`.
/// - `children` is non-empty only after a branch operation.
/// - `evidence` is append-only in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Hierarchical identifier encoding tree position.
    pub id: HypothesisId,
    /// Human-readable candidate explanation.
    pub statement: String,
    /// Explanation category.
    pub category: HypothesisCategory,
    /// Initial probability assigned at triage, in `[0, 1]`.
    pub base_probability: f64,
    /// Current confidence, recomputed as evidence arrives, in `[0, 0.99]`.
    pub confidence: f64,
    /// Ordered evidence records.
    pub evidence: Vec<Evidence>,
    /// Child hypothesis identifiers.
    pub children: Vec<HypothesisId>,
    /// Lifecycle status.
    pub status: HypothesisStatus,
    /// Tree depth (0 at a root).
    pub depth: u32,
    /// Reason recorded verbatim when the status became terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    /// True when the hypothesis matches a known historical pattern.
    pub knowledge_match: bool,
}

impl Hypothesis {
    /// Creates a new active hypothesis.
    #[must_use]
    pub fn new(
        id: HypothesisId,
        statement: impl Into<String>,
        category: HypothesisCategory,
        base_probability: f64,
    ) -> Self {
        let depth = id.depth();
        let base = base_probability.clamp(0.0, 1.0);
        Self {
            id,
            statement: statement.into(),
            category,
            base_probability: base,
            confidence: base.min(0.99),
            evidence: Vec::new(),
            children: Vec::new(),
            status: HypothesisStatus::Active,
            depth,
            status_reason: None,
            knowledge_match: false,
        }
    }

    /// Returns the most recently attached evidence, if any.
    #[must_use]
    pub fn latest_evidence(&self) -> Option<&Evidence> {
        self.evidence.last()
    }
}

// ============================================================================
// SECTION: Hypothesis Tree
// ============================================================================

/// Arena-backed hypothesis forest keyed by hierarchical id.
///
/// # Invariants
/// - Every non-root node's parent exists in the arena.
/// - Root order and arena insertion order are stable for deterministic replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HypothesisTree {
    /// Arena of hypothesis records keyed by id string.
    nodes: BTreeMap<String, Hypothesis>,
    /// Insertion-ordered node ids (arena order, used for tie-breaking).
    order: Vec<HypothesisId>,
    /// Root hypothesis identifiers in formation order.
    roots: Vec<HypothesisId>,
}

impl HypothesisTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a hypothesis into the arena.
    ///
    /// Roots are appended to the root list; children must be linked by the
    /// engine through the parent's `children` list.
    pub fn insert(&mut self, hypothesis: Hypothesis) {
        let id = hypothesis.id.clone();
        if hypothesis.depth == 0 && !self.roots.contains(&id) {
            self.roots.push(id.clone());
        }
        if !self.order.contains(&id) {
            self.order.push(id.clone());
        }
        self.nodes.insert(id.as_str().to_string(), hypothesis);
    }

    /// Returns the hypothesis with the provided id, if present.
    #[must_use]
    pub fn get(&self, id: &HypothesisId) -> Option<&Hypothesis> {
        self.nodes.get(id.as_str())
    }

    /// Returns a mutable reference to the hypothesis with the provided id.
    #[must_use]
    pub fn get_mut(&mut self, id: &HypothesisId) -> Option<&mut Hypothesis> {
        self.nodes.get_mut(id.as_str())
    }

    /// Returns root identifiers in formation order.
    #[must_use]
    pub fn roots(&self) -> &[HypothesisId] {
        &self.roots
    }

    /// Returns all node identifiers in arena insertion order.
    #[must_use]
    pub fn ids(&self) -> &[HypothesisId] {
        &self.order
    }

    /// Returns the arena insertion index of an id, used for tie-breaking.
    #[must_use]
    pub fn insertion_index(&self, id: &HypothesisId) -> Option<usize> {
        self.order.iter().position(|candidate| candidate == id)
    }

    /// Returns identifiers of all active hypotheses in insertion order.
    #[must_use]
    pub fn active_ids(&self) -> Vec<HypothesisId> {
        self.order
            .iter()
            .filter(|id| {
                self.get(id).is_some_and(|node| node.status == HypothesisStatus::Active)
            })
            .cloned()
            .collect()
    }

    /// Returns true when no hypothesis remains active.
    #[must_use]
    pub fn all_resolved(&self) -> bool {
        self.order.iter().all(|id| {
            self.get(id).is_none_or(|node| node.status.is_terminal())
        })
    }

    /// Returns true when every child of `id` is pruned.
    ///
    /// Returns false when the node has no children.
    #[must_use]
    pub fn all_children_pruned(&self, id: &HypothesisId) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        if node.children.is_empty() {
            return false;
        }
        node.children.iter().all(|child| {
            self.get(child).is_some_and(|node| node.status == HypothesisStatus::Pruned)
        })
    }

    /// Returns the number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true when the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
